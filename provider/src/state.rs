//! Typed resource state for `objectstorage_account`.
//!
//! # Design
//! `AccountAttributes` replaces an untyped attribute bag. The four fields a
//! user may change are enumerated by `AccountField`, whose mapping table ties
//! each schema attribute name to the server's camelCase field name used in
//! update patches.
//!
//! `ResourceData` carries the resource identity, the attributes, and (during
//! an update) the prior attributes used for diffing. In partial mode only
//! fields marked reconciled are taken from the new attributes when the state
//! is persisted; the rest keep their prior values.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user-configurable account field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountField {
    Source,
    Group,
    AskId,
    Description,
}

/// Schema attribute name ↔ server field name.
const FIELD_NAMES: [(AccountField, &str, &str); 4] = [
    (AccountField::Source, "source", "source"),
    (AccountField::Group, "group", "group"),
    (AccountField::AskId, "ask_id", "askId"),
    (AccountField::Description, "description", "description"),
];

impl AccountField {
    /// Every mutable field, in update order.
    pub const ALL: [AccountField; 4] = [
        AccountField::Source,
        AccountField::Group,
        AccountField::AskId,
        AccountField::Description,
    ];

    pub fn attribute_name(self) -> &'static str {
        match self {
            AccountField::Source => "source",
            AccountField::Group => "group",
            AccountField::AskId => "ask_id",
            AccountField::Description => "description",
        }
    }

    /// Name the server expects in `{name, value}` patches.
    pub fn wire_name(self) -> &'static str {
        match self {
            AccountField::Source => "source",
            AccountField::Group => "group",
            AccountField::AskId => "askId",
            AccountField::Description => "description",
        }
    }

    pub fn from_attribute(name: &str) -> Option<Self> {
        FIELD_NAMES
            .iter()
            .find(|(_, attr, _)| *attr == name)
            .map(|(field, _, _)| *field)
    }
}

/// Attribute values of one account resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountAttributes {
    pub account_id: String,
    pub source: String,
    pub group: String,
    pub ask_id: String,
    pub description: String,
    pub no_of_buckets: i64,
    pub no_of_objects: i64,
}

impl AccountAttributes {
    pub fn field(&self, field: AccountField) -> &str {
        match field {
            AccountField::Source => &self.source,
            AccountField::Group => &self.group,
            AccountField::AskId => &self.ask_id,
            AccountField::Description => &self.description,
        }
    }

    pub fn set_field(&mut self, field: AccountField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AccountField::Source => self.source = value,
            AccountField::Group => self.group = value,
            AccountField::AskId => self.ask_id = value,
            AccountField::Description => self.description = value,
        }
    }
}

/// Host-managed state of one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceData {
    id: Option<String>,
    pub attributes: AccountAttributes,
    prior: Option<AccountAttributes>,
    partial: bool,
    reconciled: BTreeSet<AccountField>,
}

impl ResourceData {
    /// A resource that does not exist yet.
    pub fn new(attributes: AccountAttributes) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    /// An existing resource with known identity.
    pub fn existing(id: impl Into<String>, attributes: AccountAttributes) -> Self {
        let mut data = Self::new(attributes);
        data.set_id(id);
        data
    }

    /// An existing resource moving from `prior` to `planned` attributes.
    pub fn planned_change(
        id: impl Into<String>,
        prior: AccountAttributes,
        planned: AccountAttributes,
    ) -> Self {
        let mut data = Self::existing(id, planned);
        data.prior = Some(prior);
        data
    }

    /// Resource identity; empty when the resource does not exist.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Set the identity. An empty string clears it.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn has_change(&self, field: AccountField) -> bool {
        self.prior
            .as_ref()
            .is_some_and(|prior| prior.field(field) != self.attributes.field(field))
    }

    pub fn changed_fields(&self) -> Vec<AccountField> {
        AccountField::ALL
            .into_iter()
            .filter(|f| self.has_change(*f))
            .collect()
    }

    pub fn set_partial(&mut self, partial: bool) {
        self.partial = partial;
        if !partial {
            self.reconciled.clear();
        }
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Record that `field` now matches the server.
    pub fn set_reconciled(&mut self, field: AccountField) {
        self.reconciled.insert(field);
    }

    /// Attributes to persist, or `None` when the resource is gone.
    pub fn persisted(&self) -> Option<AccountAttributes> {
        self.id.as_ref()?;
        match (&self.prior, self.partial) {
            (Some(prior), true) => {
                let mut state = prior.clone();
                for field in &self.reconciled {
                    state.set_field(*field, self.attributes.field(*field));
                }
                Some(state)
            }
            _ => Some(self.attributes.clone()),
        }
    }

    /// Build from a host state object; the identity lives under `id`.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let mut map = value.as_object().cloned().unwrap_or_default();
        let id = map
            .remove("id")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        map.retain(|_, v| !v.is_null());
        let attributes: AccountAttributes = serde_json::from_value(Value::Object(map))?;
        let mut data = Self::new(attributes);
        data.set_id(id);
        Ok(data)
    }

    /// Render the persisted state for the host, `None` when the resource is gone.
    pub fn to_value(&self) -> Result<Option<Value>, serde_json::Error> {
        let Some(attributes) = self.persisted() else {
            return Ok(None);
        };
        let mut map = match serde_json::to_value(attributes)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("id".to_string(), Value::String(self.id().to_string()));
        Ok(Some(Value::Object(map)))
    }
}
