//! OCM client errors

use thiserror::Error;

/// Errors that can occur when interacting with the OCM API
#[derive(Debug, Error)]
pub enum OcmError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OCM API returned an error response
    #[error("OCM API error ({status}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Response body or error description
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid token, expired, insufficient scope)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g. missing required fields, semantic rejection)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OcmError {
    /// Whether retrying the same request later can reasonably succeed.
    ///
    /// Network failures, timeouts, rate limits and 5xx-class responses are
    /// transient; authentication failures and semantic rejections require
    /// external correction.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Serialization(_)
            | Self::Authentication(_)
            | Self::NotFound(_)
            | Self::InvalidRequest(_) => false,
        }
    }
}
