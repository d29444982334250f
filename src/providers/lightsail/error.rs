use thiserror::Error;

use super::types::{ApiErrorBody, error_code};
use crate::waiter::FetchError;

/// Lightsail-specific errors that can occur during API operations.
///
/// SECURITY: Error messages must NEVER contain credentials or signed headers.
#[derive(Debug, Error)]
pub enum LightsailError {
    /// Caller is not allowed to perform the action
    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// Load balancer, instance or operation does not exist
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("throttled: {message}")]
    Throttled { message: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Any other error response
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to encode {action} request: {source}")]
    Encode {
        action: String,
        source: serde_json::Error,
    },

    /// Response body could not be parsed or lacked a required field
    #[error("malformed {action} response: {message}")]
    MalformedResponse { action: String, message: String },
}

impl LightsailError {
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed
            .type_
            .as_deref()
            .map(error_code)
            .unwrap_or("UnknownError")
            .to_string();
        let message = parsed
            .message
            .unwrap_or_else(|| format!("HTTP {}", status));

        match code.as_str() {
            "NotFoundException" => Self::NotFound { message },
            "AccessDeniedException" | "UnauthenticatedException" => Self::AccessDenied { message },
            "InvalidInputException" => Self::InvalidInput { message },
            "ThrottlingException" | "TooManyRequestsException" => Self::Throttled { message },
            _ if status == 429 => Self::Throttled { message },
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a status poll that failed with this error is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::Throttled { .. }
            | Self::Network(_)
            | Self::MalformedResponse { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::AccessDenied { .. } | Self::InvalidInput { .. } | Self::Encode { .. } => false,
        }
    }
}

impl From<LightsailError> for FetchError {
    fn from(err: LightsailError) -> Self {
        FetchError {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

impl From<LightsailError> for crate::providers::ProviderError {
    fn from(err: LightsailError) -> Self {
        crate::providers::ProviderError::Lightsail(err)
    }
}
