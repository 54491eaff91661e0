//! Error types for registry and persistence operations.
//!
//! Registry lookups never fail: a missing id is a silent no-op reported
//! through an `Option` return. The errors here cover the persistence layer
//! and input parsing, and are logged rather than surfaced wherever the
//! registry contract is best-effort.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage and model operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key-value storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input, such as an unknown category name.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl CoreError {
    /// Creates a storage error from a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an invalid input error from a message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_a_storage_error() {
        // Missing keys surface as `Ok(None)` from the store, so a stray
        // RowNotFound means the query itself misbehaved.
        let error = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, CoreError::Storage(_)));
    }

    #[test]
    fn pool_errors_map_to_storage() {
        let error = CoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(error, CoreError::Storage(_)));
    }

    #[test]
    fn error_display_format() {
        assert_eq!(CoreError::storage("disk full").to_string(), "storage error: disk full");
        assert_eq!(
            CoreError::invalid_input("unknown category: video").to_string(),
            "invalid input: unknown category: video"
        );
    }
}
