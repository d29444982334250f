use serde::{Deserialize, Serialize};

use crate::resource::{InstanceHealth, LoadBalancerInfo};
use crate::waiter::OperationStatus;

pub const TARGET_PREFIX: &str = "Lightsail_20161128";
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancesRequest<'a> {
    pub load_balancer_name: &'a str,
    pub instance_names: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerRequest<'a> {
    pub load_balancer_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest<'a> {
    pub operation_id: &'a str,
}

/// Shared shape of the attach/detach responses.
#[derive(Debug, Deserialize)]
pub struct OperationsResponse {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Deserialize)]
pub struct GetOperationResponse {
    pub operation: Option<Operation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLoadBalancerResponse {
    pub load_balancer: Option<LoadBalancer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub status: Option<OperationStatus>,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub instance_health_summary: Vec<InstanceHealthSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceHealthSummary {
    pub instance_name: Option<String>,
    #[serde(default)]
    pub instance_health: Option<String>,
}

impl LoadBalancer {
    pub fn into_info(self) -> LoadBalancerInfo {
        let instances = self
            .instance_health_summary
            .into_iter()
            .filter_map(|summary| {
                summary.instance_name.map(|name| InstanceHealth {
                    instance_name: name,
                    health: summary
                        .instance_health
                        .unwrap_or_else(|| "unknown".to_string()),
                })
            })
            .collect();

        LoadBalancerInfo {
            name: self.name,
            state: self.state,
            instances,
        }
    }
}

/// Body of a non-2xx JSON protocol response.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    pub type_: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

/// `com.amazonaws.lightsail#NotFoundException` -> `NotFoundException`
pub fn error_code(type_: &str) -> &str {
    type_.rsplit('#').next().unwrap_or(type_)
}
