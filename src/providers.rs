pub mod lightsail;

use async_trait::async_trait;
use thiserror::Error;

use crate::resource::LoadBalancerInfo;
use crate::waiter::{OperationFetcher, OperationHandle};

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error(transparent)]
    Lightsail(lightsail::LightsailError),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Lightsail(err) if err.is_not_found())
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub region: String,
    /// Overrides the regional endpoint (local emulators, signing proxies).
    pub endpoint: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }
}

/// Load balancer calls the attachment resource needs, plus operation polling.
#[async_trait]
pub trait LoadBalancerApi: OperationFetcher {
    fn name(&self) -> &str;
    async fn attach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<OperationHandle>, ProviderError>;
    async fn detach_instances(
        &self,
        load_balancer_name: &str,
        instance_names: &[String],
    ) -> Result<Vec<OperationHandle>, ProviderError>;
    async fn get_load_balancer(
        &self,
        load_balancer_name: &str,
    ) -> Result<LoadBalancerInfo, ProviderError>;
}

pub fn get_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Box<dyn LoadBalancerApi>, ProviderError> {
    match name {
        "lightsail" => {
            let client = match &config.endpoint {
                Some(endpoint) => {
                    lightsail::LightsailClient::with_base_url(config.region.clone(), endpoint.clone())?
                }
                None => lightsail::LightsailClient::new(config.region.clone())?,
            };
            Ok(Box::new(client))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
