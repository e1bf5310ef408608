//! Wire DTOs for the object-storage account API.
//!
//! # Design
//! Field names follow the server's camelCase convention. Empty strings are
//! omitted on the way out and missing fields decode to their defaults on the
//! way in, so a sparse server reply still yields a complete record. An
//! explicit `null` decodes the same way as a missing field.

use serde::{Deserialize, Deserializer, Serialize};

/// Source tag applied to accounts when none is configured.
pub const DEFAULT_SOURCE: &str = "terraform";

/// Decode `null` as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The mutable part of an account, as sent to `POST accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub group: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub ask_id: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub description: String,
}

/// An account as returned by the server, including computed counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(flatten)]
    pub account: Account,
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_of_buckets: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_of_objects: i64,
}

/// Single-field patch sent to `PUT accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateElement {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
}

/// Optional error body attached to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}
