//! Application-level errors.
//!
//! Only configuration and input problems surface here. Delivery failures
//! stay inside the dispatch engine and show up as item status.

use inbox_core::CoreError;
use inbox_delivery::DeliveryError;
use thiserror::Error;

use crate::form::ValidationError;

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors returned by the application facade.
#[derive(Debug, Error)]
pub enum AppError {
    /// User input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage could not be opened.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// HTTP client could not be built.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
