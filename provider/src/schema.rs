//! Declarative attribute schemas for the provider block and its resources.
//!
//! A `Schema` validates a configuration map before any request is built and
//! fills in declared defaults. Attributes are kept sorted by name so
//! diagnostics come out in a stable order.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// Resource type name of the account resource.
pub const ACCOUNT_RESOURCE: &str = "objectstorage_account";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int,
}

impl AttributeType {
    fn matches(self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int => value.is_i64() || value.is_u64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    /// Environment variable consulted when the attribute is not configured.
    pub env_default: Option<&'static str>,
}

impl Attribute {
    fn new(ty: AttributeType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            default: None,
            env_default: None,
        }
    }

    pub fn required_string() -> Self {
        Self {
            required: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn optional_string() -> Self {
        Self {
            optional: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeType::String)
        }
    }

    pub fn computed_int() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeType::Int)
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_env_default(mut self, var: &'static str) -> Self {
        self.env_default = Some(var);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Set by the server only; rejected in configuration.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing required attribute \"{0}\"")]
    MissingRequired(String),

    #[error("unknown attribute \"{0}\"")]
    UnknownAttribute(String),

    #[error("attribute \"{name}\" must be of type {expected:?}")]
    TypeMismatch {
        name: String,
        expected: AttributeType,
    },

    #[error("attribute \"{0}\" is computed and cannot be configured")]
    ComputedOnly(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<String, Attribute>,
    importable: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Accept import by identifier.
    pub fn importable(mut self) -> Self {
        self.importable = true;
        self
    }

    pub fn is_importable(&self) -> bool {
        self.importable
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check a configuration map. Null values count as unset.
    pub fn validate(&self, config: &Map<String, Value>) -> Result<(), SchemaError> {
        for (name, value) in config {
            let attribute = self
                .attributes
                .get(name)
                .ok_or_else(|| SchemaError::UnknownAttribute(name.clone()))?;
            if value.is_null() {
                continue;
            }
            if attribute.is_computed_only() {
                return Err(SchemaError::ComputedOnly(name.clone()));
            }
            if !attribute.ty.matches(value) {
                return Err(SchemaError::TypeMismatch {
                    name: name.clone(),
                    expected: attribute.ty,
                });
            }
        }

        for (name, attribute) in &self.attributes {
            let present = config.get(name).is_some_and(|v| !v.is_null());
            if attribute.required && !present && attribute.env_default.is_none() {
                return Err(SchemaError::MissingRequired(name.clone()));
            }
        }
        Ok(())
    }

    /// Insert declared defaults for attributes that are unset or null.
    pub fn apply_defaults(&self, config: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            let Some(default) = &attribute.default else {
                continue;
            };
            let unset = config.get(name).map_or(true, Value::is_null);
            if unset {
                config.insert(name.clone(), default.clone());
            }
        }
    }
}

/// Provider block schema plus resource schemas by type name.
#[derive(Debug, Clone, Default)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    pub fn new(provider: Schema) -> Self {
        Self {
            provider,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    pub fn resource(&self, name: &str) -> Option<&Schema> {
        self.resources.get(name)
    }
}
