use thiserror::Error;

use crate::providers::ProviderError;
use crate::waiter::WaitError;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("no operations found for {action} request")]
    NoOperations { action: &'static str },

    #[error("changing {field} requires replacing the attachment")]
    RequiresReplacement { field: &'static str },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("error waiting for load balancer attachment ({id}) to {goal}: {source}")]
    Wait {
        id: String,
        goal: &'static str,
        source: WaitError,
    },
}
