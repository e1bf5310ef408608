//! Provider block configuration.

use objectstorage_core::Credentials;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8084/";

pub const USERNAME_ENV: &str = "OBJECTSTORAGE_USERNAME";
pub const PASSWORD_ENV: &str = "OBJECTSTORAGE_PASSWORD";
pub const ENDPOINT_ENV: &str = "OBJECTSTORAGE_ENDPOINT";

/// Provider settings as written in configuration. Unset values fall back to
/// the environment when resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub endpoint: Option<String>,
}

/// Fully resolved settings used to build a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub credentials: Credentials,
}

impl ProviderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ProviderError> {
        toml::from_str(s).map_err(|e| ProviderError::Config(format!("invalid provider block: {e}")))
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedConfig, ProviderError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit lookup for fallback values.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedConfig, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |configured: &Option<String>, var: &str| {
            configured
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| {
                    let value = lookup(var).filter(|v| !v.is_empty());
                    if value.is_some() {
                        debug!("using {var} from environment");
                    }
                    value
                })
        };

        let username = pick(&self.username, USERNAME_ENV).ok_or_else(|| {
            ProviderError::Config(format!("username is required (or set {USERNAME_ENV})"))
        })?;
        let password = pick(&self.password, PASSWORD_ENV).ok_or_else(|| {
            ProviderError::Config(format!("password is required (or set {PASSWORD_ENV})"))
        })?;
        let endpoint =
            pick(&self.endpoint, ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(ResolvedConfig {
            endpoint,
            credentials: Credentials::new(username, password),
        })
    }
}
