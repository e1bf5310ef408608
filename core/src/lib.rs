//! Blocking, lazily authenticated client for the object-storage account API.
//!
//! # Overview
//! `StorageClient` exchanges a username and password for a session token on
//! first use, attaches it to every request, and turns statuses outside
//! `[200, 400)` into structured `ApiError`s.
//!
//! # Design
//! - The HTTP round-trip sits behind the `Transport` trait. `UreqTransport`
//!   is the production implementation; tests script responses in memory.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`).
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{Credentials, StorageClient};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{Account, AccountResponse, UpdateElement, DEFAULT_SOURCE};
