//! Host-facing provider surface.
//!
//! # Design
//! The host hands over resource state as JSON objects keyed by attribute
//! name, with the resource identity under `id`. `Provider` validates the
//! configurable part against the resource schema, converts it to
//! `ResourceData`, runs the account operation, and renders the persisted
//! state back to JSON. `None` from `read` means the resource is gone.

use std::sync::Arc;

use objectstorage_core::{StorageClient, Transport};
use serde_json::{Map, Value};
use tracing::info;

use crate::account;
use crate::config::{ProviderConfig, PASSWORD_ENV, USERNAME_ENV};
use crate::error::ProviderError;
use crate::schema::{Attribute, ProviderSchema, Schema, ACCOUNT_RESOURCE};
use crate::state::ResourceData;

#[derive(Debug, Default)]
pub struct Provider {
    client: Option<Arc<StorageClient>>,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema() -> ProviderSchema {
        let provider = Schema::new()
            .with_attribute(
                "username",
                Attribute::required_string().with_env_default(USERNAME_ENV),
            )
            .with_attribute(
                "password",
                Attribute::required_string()
                    .sensitive()
                    .with_env_default(PASSWORD_ENV),
            )
            .with_attribute("endpoint", Attribute::optional_string());
        ProviderSchema::new(provider).with_resource(ACCOUNT_RESOURCE, account::schema())
    }

    /// Build the shared client. Authentication happens lazily on first use.
    pub fn configure(&mut self, config: &ProviderConfig) -> Result<(), ProviderError> {
        let resolved = config.resolve()?;
        info!(endpoint = %resolved.endpoint, "provider configured");
        self.client = Some(Arc::new(StorageClient::new(
            &resolved.endpoint,
            resolved.credentials,
        )));
        Ok(())
    }

    pub fn configure_with_transport(
        &mut self,
        config: &ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<(), ProviderError> {
        let resolved = config.resolve()?;
        self.client = Some(Arc::new(StorageClient::with_transport(
            &resolved.endpoint,
            resolved.credentials,
            transport,
        )));
        Ok(())
    }

    /// The shared client, once configured.
    pub fn client(&self) -> Result<&StorageClient, ProviderError> {
        self.client.as_deref().ok_or(ProviderError::NotConfigured)
    }

    pub fn create(&self, resource_type: &str, planned: &Value) -> Result<Value, ProviderError> {
        let schema = resource_schema(resource_type)?;
        let client = self.client()?;

        let mut data = ResourceData::new(configured(&schema, planned)?.attributes);
        account::create(client, &mut data)?;
        Ok(data.to_value()?.unwrap_or(Value::Null))
    }

    pub fn read(&self, resource_type: &str, current: &Value) -> Result<Option<Value>, ProviderError> {
        resource_schema(resource_type)?;
        let client = self.client()?;

        let mut data = ResourceData::from_value(current)?;
        match account::read(client, &mut data) {
            Ok(()) => Ok(data.to_value()?),
            Err(source) => Err(ProviderError::Read {
                state: data.to_value()?.map(Box::new),
                source,
            }),
        }
    }

    pub fn update(
        &self,
        resource_type: &str,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let schema = resource_schema(resource_type)?;
        let client = self.client()?;

        let prior = ResourceData::from_value(prior)?;
        let mut planned_attrs = configured(&schema, planned)?.attributes;
        planned_attrs.account_id = prior.attributes.account_id.clone();
        planned_attrs.no_of_buckets = prior.attributes.no_of_buckets;
        planned_attrs.no_of_objects = prior.attributes.no_of_objects;

        let mut data =
            ResourceData::planned_change(prior.id(), prior.attributes.clone(), planned_attrs);
        match account::update(client, &mut data) {
            Ok(()) => Ok(data.to_value()?.unwrap_or(Value::Null)),
            Err(source) => {
                let state = data.to_value()?.unwrap_or(Value::Null);
                Err(ProviderError::PartialUpdate {
                    state: Box::new(state),
                    source,
                })
            }
        }
    }

    pub fn delete(&self, resource_type: &str, current: &Value) -> Result<(), ProviderError> {
        resource_schema(resource_type)?;
        let client = self.client()?;

        let mut data = ResourceData::from_value(current)?;
        account::delete(client, &mut data)?;
        Ok(())
    }

    /// Import by identifier, followed by a read. `None` if nothing exists
    /// under `id`.
    pub fn import(&self, resource_type: &str, id: &str) -> Result<Option<Value>, ProviderError> {
        resource_schema(resource_type)?;
        let client = self.client()?;

        let mut data = account::import(id);
        account::read(client, &mut data)?;
        Ok(data.to_value()?)
    }
}

fn resource_schema(resource_type: &str) -> Result<Schema, ProviderError> {
    Provider::schema()
        .resource(resource_type)
        .cloned()
        .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
}

/// Validate the user-settable attributes of `state` and apply defaults.
fn configured(schema: &Schema, state: &Value) -> Result<ResourceData, ProviderError> {
    let mut config: Map<String, Value> = state
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|(name, _)| {
            name != "id"
                && !schema
                    .attribute(name)
                    .is_some_and(|attribute| attribute.is_computed_only())
        })
        .collect();
    schema.validate(&config)?;
    schema.apply_defaults(&mut config);
    Ok(ResourceData::from_value(&Value::Object(config))?)
}
