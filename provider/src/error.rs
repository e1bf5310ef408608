//! Errors surfaced to the host runtime.

use objectstorage_core::ApiError;
use serde_json::Value;
use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// A resource operation was invoked before `configure`.
    #[error("provider is not configured")]
    NotConfigured,

    #[error("unknown resource type \"{0}\"")]
    UnknownResource(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid resource configuration: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid resource state: {0}")]
    State(#[from] serde_json::Error),

    /// The read failed. `state` is what the host must persist; `None` when
    /// the identity was cleared and the resource is to be recreated.
    #[error("read failed: {source}")]
    Read {
        state: Option<Box<Value>>,
        #[source]
        source: ApiError,
    },

    /// Some fields were patched before `source` failed; `state` is what the
    /// host must persist.
    #[error("update partially applied: {source}")]
    PartialUpdate {
        state: Box<Value>,
        #[source]
        source: ApiError,
    },
}
