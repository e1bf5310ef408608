//! Error types for the object-storage API client.
//!
//! # Design
//! Any status outside `[200, 400)` becomes `Http`, carrying the status code,
//! the endpoint path that was requested and the server's `message` (or the
//! raw body when the server sent none). Network failures never reach the
//! status check and land in `Transport`.

use thiserror::Error;

/// Errors returned by `StorageClient` and the resource operations built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status outside `[200, 400)`.
    #[error("API Error: {status} {endpoint} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// A required identifier was blank; no request was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status carried by an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
