//! Error taxonomy for backend gateway calls.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by any [`BackendGateway`](crate::BackendGateway) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// A required field was missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No valid session for the call.
    #[error("Access denied: {0}")]
    Access(String),

    /// The referenced component does not exist or is owned by someone else.
    #[error("Component not found: {0}")]
    NotFound(String),

    /// Image upload transport or storage failure.
    #[error("Image storage failed: {0}")]
    Storage(String),

    /// Any other failed call.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

impl GatewayError {
    /// Short label for the `kind` field of gateway log events.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::Access(_) => "access",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Storage(_) => "storage",
            GatewayError::Network(_) => "network",
            GatewayError::Timeout(_) => "timeout",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}
