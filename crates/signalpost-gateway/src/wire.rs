// SPDX-License-Identifier: Apache-2.0

//! Wire shaping: kind-keyed response documents with embedded ownership
//! links, and the JSON-patch-style operation envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use signalpost_model::{Contact, ContactId, Medium, MediumId};

/// One patch operation. `replace` is the only op the gateway implements;
/// the path's positional index (`/media/0/address`) is a protocol artifact
/// and only its terminal field segment matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOpDto {
    pub op: String,
    pub path: String,
    pub value: Value,
}

impl PatchOpDto {
    /// Terminal segment of the path, i.e. the field the replace targets.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self.path.rsplit('/').next() {
            Some("") | None => None,
            Some(field) => Some(field),
        }
    }
}

/// Serialized medium plus its `links.contacts` association, computed via
/// reverse lookup. An unlinked medium carries an empty contacts list.
#[must_use]
pub fn medium_wire(medium: &Medium, owners: &BTreeMap<MediumId, ContactId>) -> Value {
    let mut doc = serde_json::to_value(medium).unwrap_or_else(|_| json!({}));
    let contacts: Vec<&str> = owners
        .get(&medium.id)
        .map(|owner| vec![owner.as_str()])
        .unwrap_or_default();
    if let Some(map) = doc.as_object_mut() {
        map.insert("links".to_string(), json!({ "contacts": contacts }));
    }
    doc
}

/// Serialized contact plus its ordered `links.media` collection.
#[must_use]
pub fn contact_wire(contact: &Contact, media: &[MediumId]) -> Value {
    let mut doc = serde_json::to_value(contact).unwrap_or_else(|_| json!({}));
    let media: Vec<&str> = media.iter().map(MediumId::as_str).collect();
    if let Some(map) = doc.as_object_mut() {
        map.insert("links".to_string(), json!({ "media": media }));
    }
    doc
}
