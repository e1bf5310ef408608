//! CRUD mapping between `objectstorage_account` state and the accounts API.
//!
//! # Design
//! Each operation takes the shared client and the resource's `ResourceData`
//! and reconciles one against the other:
//!
//! - `create` posts the account, records the server-assigned id, then reads
//!   the account back so every attribute (counters included) mirrors the
//!   server.
//! - `read` treats a failed `GET` as "resource gone": the identity is
//!   cleared and the call succeeds, so the host plans a recreation.
//! - `update` sends one `{name, value}` patch per changed field. Fields are
//!   patched independently; a failure leaves the resource in partial mode
//!   with only the already-patched fields reconciled.
//! - `delete` treats a failed `DELETE` as already deleted and clears the
//!   identity either way.

use objectstorage_core::{
    Account, AccountResponse, ApiError, StorageClient, UpdateElement, DEFAULT_SOURCE,
};
use tracing::{debug, info, warn};

use crate::schema::{Attribute, Schema};
use crate::state::{AccountAttributes, AccountField, ResourceData};

/// Collection path on the server.
pub const ACCOUNTS_PATH: &str = "accounts";

pub fn account_path(id: &str) -> String {
    format!("{ACCOUNTS_PATH}/{id}")
}

/// Declarative schema of the account resource.
pub fn schema() -> Schema {
    Schema::new()
        .with_attribute("account_id", Attribute::computed_string())
        .with_attribute(
            "source",
            Attribute::optional_string().with_default(DEFAULT_SOURCE),
        )
        .with_attribute("group", Attribute::required_string())
        .with_attribute("ask_id", Attribute::required_string())
        .with_attribute("description", Attribute::required_string())
        .with_attribute("no_of_buckets", Attribute::computed_int())
        .with_attribute("no_of_objects", Attribute::computed_int())
        .importable()
}

fn account_from_attributes(attributes: &AccountAttributes) -> Account {
    Account {
        source: attributes.source.clone(),
        group: attributes.group.clone(),
        ask_id: attributes.ask_id.clone(),
        description: attributes.description.clone(),
    }
}

fn mirror_response(attributes: &mut AccountAttributes, response: AccountResponse) {
    attributes.account_id = response.id;
    attributes.source = response.account.source;
    attributes.group = response.account.group;
    attributes.ask_id = response.account.ask_id;
    attributes.description = response.account.description;
    attributes.no_of_buckets = response.no_of_buckets;
    attributes.no_of_objects = response.no_of_objects;
}

fn require_id(data: &ResourceData) -> Result<String, ApiError> {
    if data.id().is_empty() {
        return Err(ApiError::Validation(
            "account id should not be blank".to_string(),
        ));
    }
    Ok(data.id().to_string())
}

pub fn create(client: &StorageClient, data: &mut ResourceData) -> Result<(), ApiError> {
    let account = account_from_attributes(&data.attributes);

    info!(group = %account.group, "creating account");
    let response = client.post(ACCOUNTS_PATH, &account)?;

    if response.status == 201 {
        let created: AccountResponse = response.json()?;
        debug!(id = %created.id, "account created");
        data.set_id(created.id.clone());
        mirror_response(&mut data.attributes, created);
    } else {
        warn!(status = response.status, "unexpected status creating account");
    }

    read(client, data)
}

pub fn read(client: &StorageClient, data: &mut ResourceData) -> Result<(), ApiError> {
    let id = require_id(data)?;

    let response = match client.get(&account_path(&id)) {
        Ok(response) => response,
        Err(err) => {
            warn!(%id, error = %err, "account not readable; removing from state");
            data.clear_id();
            return Ok(());
        }
    };

    let account: AccountResponse = match response.json() {
        Ok(account) => account,
        Err(err) => {
            data.clear_id();
            return Err(err);
        }
    };

    debug!(
        %id,
        buckets = account.no_of_buckets,
        objects = account.no_of_objects,
        "account read"
    );
    mirror_response(&mut data.attributes, account);
    Ok(())
}

pub fn update(client: &StorageClient, data: &mut ResourceData) -> Result<(), ApiError> {
    let id = require_id(data)?;
    let path = account_path(&id);

    data.set_partial(true);
    for field in AccountField::ALL {
        if !data.has_change(field) {
            continue;
        }

        let patch = UpdateElement {
            name: field.wire_name().to_string(),
            value: data.attributes.field(field).to_string(),
        };
        debug!(%id, field = field.attribute_name(), value = %patch.value, "updating field");
        let response = client.put(&path, &patch)?;
        if response.status == 200 {
            info!(%id, field = field.attribute_name(), "account field updated");
        }
        data.set_reconciled(field);
    }
    data.set_partial(false);

    Ok(())
}

pub fn delete(client: &StorageClient, data: &mut ResourceData) -> Result<(), ApiError> {
    let id = require_id(data)?;

    match client.delete(&account_path(&id)) {
        Ok(response) if response.status == 200 => info!(%id, "account deleted"),
        Ok(response) => debug!(%id, status = response.status, "account delete accepted"),
        Err(err) => warn!(%id, error = %err, "delete failed; treating account as already gone"),
    }

    data.clear_id();
    Ok(())
}

/// Import passthrough: the identity is all that is known until the next read.
pub fn import(id: &str) -> ResourceData {
    ResourceData::existing(id, AccountAttributes::default())
}
