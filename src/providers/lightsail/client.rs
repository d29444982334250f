use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::LightsailError;
use super::types::{
    AMZ_JSON_CONTENT_TYPE, GetLoadBalancerResponse, GetOperationResponse, InstancesRequest,
    LoadBalancer, LoadBalancerRequest, Operation, OperationRequest, OperationsResponse,
    TARGET_PREFIX,
};
use crate::waiter::OperationStatus;

const TARGET_HEADER: &str = "x-amz-target";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct LightsailClient {
    client: reqwest::Client,
    region: String,
    base_url: String,
}

impl LightsailClient {
    pub fn new(region: String) -> Result<Self, LightsailError> {
        let base_url = format!("https://lightsail.{}.amazonaws.com", region);
        Self::with_base_url(region, base_url)
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(region: String, base_url: String) -> Result<Self, LightsailError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(AMZ_JSON_CONTENT_TYPE),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(LightsailError::Network)?;

        Ok(Self {
            client,
            region,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub async fn attach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<Operation>, LightsailError> {
        let request = InstancesRequest {
            load_balancer_name,
            instance_names,
        };
        let response: OperationsResponse = self
            .call("AttachInstancesToLoadBalancer", &request)
            .await?;
        Ok(response.operations)
    }

    pub async fn detach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<Operation>, LightsailError> {
        let request = InstancesRequest {
            load_balancer_name,
            instance_names,
        };
        let response: OperationsResponse = self
            .call("DetachInstancesFromLoadBalancer", &request)
            .await?;
        Ok(response.operations)
    }

    pub async fn get_load_balancer(
        &self,
        load_balancer_name: &str,
    ) -> Result<LoadBalancer, LightsailError> {
        let response: GetLoadBalancerResponse = self
            .call("GetLoadBalancer", &LoadBalancerRequest { load_balancer_name })
            .await?;

        response
            .load_balancer
            .ok_or_else(|| LightsailError::MalformedResponse {
                action: "GetLoadBalancer".to_string(),
                message: format!("no load balancer returned for '{}'", load_balancer_name),
            })
    }

    // NOTE: A response without an operation payload is an error, never "still pending"
    pub async fn fetch_operation(&self, operation_id: &str) -> Result<Operation, LightsailError> {
        let response: GetOperationResponse = self
            .call("GetOperation", &OperationRequest { operation_id })
            .await?;

        response
            .operation
            .ok_or_else(|| LightsailError::MalformedResponse {
                action: "GetOperation".to_string(),
                message: format!("no operation info returned for '{}'", operation_id),
            })
    }

    pub async fn operation_status(
        &self,
        operation_id: &str,
    ) -> Result<OperationStatus, LightsailError> {
        self.fetch_operation(operation_id)
            .await?
            .status
            .ok_or_else(|| LightsailError::MalformedResponse {
                action: "GetOperation".to_string(),
                message: format!("operation '{}' has no status", operation_id),
            })
    }

    async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, LightsailError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(|source| LightsailError::Encode {
            action: action.to_string(),
            source,
        })?;

        let response = self
            .client
            .post(format!("{}/", self.base_url))
            .header(TARGET_HEADER, format!("{}.{}", TARGET_PREFIX, action))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = LightsailError::from_response(status.as_u16(), &text);
            tracing::debug!(action, status = status.as_u16(), error = %err, "Lightsail request failed");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| LightsailError::MalformedResponse {
            action: action.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

impl std::fmt::Debug for LightsailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightsailClient")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .finish()
    }
}
