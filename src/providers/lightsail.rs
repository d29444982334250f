mod client;
mod error;
mod types;

pub use client::LightsailClient;
pub use error::LightsailError;
pub use types::{InstanceHealthSummary, LoadBalancer, Operation};

use async_trait::async_trait;

use super::{LoadBalancerApi, ProviderError};
use crate::resource::LoadBalancerInfo;
use crate::waiter::{FetchError, OperationFetcher, OperationHandle, OperationStatus};

#[async_trait]
impl OperationFetcher for LightsailClient {
    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, FetchError> {
        tracing::debug!(operation = %handle, "checking Lightsail operation status");

        Ok(self.operation_status(handle.as_str()).await?)
    }
}

#[async_trait]
impl LoadBalancerApi for LightsailClient {
    fn name(&self) -> &str {
        "lightsail"
    }

    async fn attach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<OperationHandle>, ProviderError> {
        let operations = LightsailClient::attach_instances(self, load_balancer_name, instance_names)
            .await?;
        Ok(into_handles(operations))
    }

    async fn detach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<OperationHandle>, ProviderError> {
        let operations = LightsailClient::detach_instances(self, load_balancer_name, instance_names)
            .await?;
        Ok(into_handles(operations))
    }

    async fn get_load_balancer(
        &self,
        load_balancer_name: &str,
    ) -> Result<LoadBalancerInfo, ProviderError> {
        let load_balancer = LightsailClient::get_load_balancer(self, load_balancer_name).await?;
        Ok(load_balancer.into_info())
    }
}

fn into_handles(operations: Vec<Operation>) -> Vec<OperationHandle> {
    operations
        .into_iter()
        .map(|op| OperationHandle::new(op.id))
        .collect()
}
