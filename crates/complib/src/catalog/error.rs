//! Client-side catalog errors.

use complib_gateway::GatewayError;
use complib_ids::ComponentId;
use thiserror::Error;

/// Failures raised by catalog actions.
///
/// Everything except [`CatalogError::Gateway`] is detected locally,
/// before any backend call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Please select an image")]
    MissingImage,

    #[error("Image size should be less than 5MB ({size} bytes selected, limit {limit})")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Cannot read image {path}: {reason}")]
    ImageUnreadable { path: String, reason: String },

    #[error("Component name is required")]
    EmptyName,

    #[error("Component code is required")]
    EmptyCode,

    #[error("Email address is required")]
    EmptyEmail,

    #[error("Enter the code from your email")]
    EmptyOtp,

    #[error("Typed name does not match \"{expected}\"")]
    ConfirmationMismatch { expected: String },

    #[error("Sign in to continue")]
    NotAuthenticated,

    #[error("Component not found: {0}")]
    UnknownComponent(ComponentId),

    #[error("No form is open")]
    FormClosed,

    #[error("Another request is already in progress")]
    Busy,

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

