//! Error types for webhook delivery.
//!
//! Every variant describes why one item could not be delivered to one
//! webhook. These errors never leave the dispatch engine: they are logged,
//! attached to delivery events, and collapsed into the item's `failed`
//! status.

use std::fmt;

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Reasons a single delivery attempt can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Connection could not be established or was dropped.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// Request did not complete within the configured timeout.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Configured timeout in seconds
        timeout_seconds: u64,
    },

    /// Webhook answered with a status outside 200-399.
    #[error("webhook returned HTTP {status_code}")]
    HttpStatus {
        /// HTTP status code
        status_code: u16,
        /// Response body, truncated
        body: String,
    },

    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name:?}: {message}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// Why it was rejected
        message: String,
    },

    /// Image compression hook failed.
    #[error("payload compression failed: {message}")]
    Compression {
        /// Compressor error message
        message: String,
    },

    /// Payload could not be encoded as JSON.
    #[error("payload serialization failed: {message}")]
    Serialization {
        /// Encoder error message
        message: String,
    },

    /// HTTP client could not be built from the configuration.
    #[error("invalid client configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl DeliveryError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates an HTTP status error from a response.
    pub fn http_status(status_code: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus { status_code, body: body.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into(), message: message.into() }
    }

    /// Creates a compression error.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// HTTP status code, if the webhook answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization { message: err.to_string() }
    }
}

/// Coarse grouping of delivery errors for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connectivity problems and timeouts.
    Network,
    /// 4xx responses.
    Client,
    /// 5xx and any other non-success responses.
    Server,
    /// Malformed request: bad headers, unencodable payload.
    Request,
    /// Compression hook failure.
    Payload,
    /// Client could not be configured.
    Configuration,
}

impl From<&DeliveryError> for ErrorCategory {
    fn from(error: &DeliveryError) -> Self {
        match error {
            DeliveryError::Network { .. } | DeliveryError::Timeout { .. } => Self::Network,
            DeliveryError::HttpStatus { status_code: 400..=499, .. } => Self::Client,
            DeliveryError::HttpStatus { .. } => Self::Server,
            DeliveryError::InvalidHeader { .. } | DeliveryError::Serialization { .. } => {
                Self::Request
            },
            DeliveryError::Compression { .. } => Self::Payload,
            DeliveryError::Configuration { .. } => Self::Configuration,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Request => write!(f, "request"),
            Self::Payload => write!(f, "payload"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_split_status_codes() {
        assert_eq!(
            ErrorCategory::from(&DeliveryError::http_status(404, "")),
            ErrorCategory::Client
        );
        assert_eq!(
            ErrorCategory::from(&DeliveryError::http_status(503, "")),
            ErrorCategory::Server
        );
        assert_eq!(ErrorCategory::from(&DeliveryError::timeout(30)), ErrorCategory::Network);
        assert_eq!(
            ErrorCategory::from(&DeliveryError::invalid_header("x", "bad")),
            ErrorCategory::Request
        );
    }

    #[test]
    fn status_code_only_for_http_errors() {
        assert_eq!(DeliveryError::http_status(500, "boom").status_code(), Some(500));
        assert_eq!(DeliveryError::network("refused").status_code(), None);
    }

    #[test]
    fn error_display_format() {
        assert_eq!(DeliveryError::timeout(30).to_string(), "request timeout after 30s");
        assert_eq!(DeliveryError::http_status(500, "").to_string(), "webhook returned HTTP 500");
    }
}
