//! lbattach - Lightsail load balancer attachments
//!
//! A library for attaching instances to Lightsail load balancers and waiting
//! on the asynchronous operations those calls start.

pub mod error;
pub mod providers;
pub mod resource;
pub mod terraform;
pub mod waiter;

pub use error::AttachmentError;
pub use providers::lightsail::{LightsailClient, LightsailError};
pub use providers::{LoadBalancerApi, ProviderConfig, ProviderError, get_provider};
pub use resource::{AttachmentConfig, AttachmentState, InstanceHealth, LoadBalancerInfo};
pub use terraform::AttachmentResource;
pub use waiter::{
    FetchError, OperationFetcher, OperationHandle, OperationStatus, WaitError, WaitSpec, wait,
};
