//! Declarative-resource provider for object-storage accounts.
//!
//! # Overview
//! Maps the `objectstorage_account` resource onto the accounts API:
//! create, read, update and delete, plus import by identifier. The host
//! runtime owns planning and state persistence; this crate only reconciles
//! one resource's attributes against the server.
//!
//! # Design
//! - One `StorageClient` per configured provider, shared by every operation
//!   through an `Arc`. It authenticates lazily and caches its token.
//! - Resource attributes are typed (`AccountAttributes`); the host boundary
//!   in `Provider` converts to and from JSON objects.
//! - Read and Delete treat an unreachable or missing account as absent, so
//!   the host recreates it on the next plan instead of failing.

pub mod account;
pub mod config;
pub mod error;
pub mod provider;
pub mod schema;
pub mod state;

pub use config::{ProviderConfig, ResolvedConfig, DEFAULT_ENDPOINT};
pub use error::ProviderError;
pub use provider::Provider;
pub use schema::{Attribute, AttributeType, ProviderSchema, Schema, SchemaError, ACCOUNT_RESOURCE};
pub use state::{AccountAttributes, AccountField, ResourceData};
