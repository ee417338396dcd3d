// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Bulk import: materializes the contact/medium graph from an external
//! JSON dump of per-contact maps with embedded per-channel media maps.
//!
//! One malformed row never aborts the batch; it is logged and skipped.
//! Contact creation, medium creation, and the ownership-edge append are
//! three independent store writes with no rollback across them — a crash
//! mid-import can leave a contact without some declared media, or a
//! medium created but never linked. That window is inherited from the
//! source system and is documented rather than patched over.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};
use signalpost_model::{ChannelType, Contact, ContactId, Medium, MediumId};
use signalpost_store::{EntityStore, StoreError};
use tracing::{info, warn};

pub const CRATE_NAME: &str = "signalpost-ingest";

#[derive(Debug)]
pub struct ImportError(pub String);

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ImportError {}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        ImportError(format!("store write failed: {err}"))
    }
}

/// What an import run did. Skipped rows are diagnostics, not failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub contacts: usize,
    pub media: usize,
    pub skipped: usize,
}

/// Reads a contacts dump from `path` and imports it into `store`.
pub fn import_contacts_from_path(
    path: impl AsRef<Path>,
    store: &dyn EntityStore,
) -> Result<ImportSummary, ImportError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ImportError(format!("cannot open {}: {e}", path.display())))?;
    let document: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ImportError(format!("cannot decode {}: {e}", path.display())))?;
    import_contacts(&document, store)
}

/// Imports a decoded contacts document.
///
/// The document must be a JSON array of per-contact objects; anything else
/// yields zero writes and a diagnostic. Rows without an `id` are logged
/// and skipped. Store-level failures (conflicts, I/O) abort the run: they
/// are outside the malformed-row tolerance.
pub fn import_contacts(
    document: &Value,
    store: &dyn EntityStore,
) -> Result<ImportSummary, ImportError> {
    let Some(rows) = document.as_array() else {
        warn!("import document is not an array, nothing imported");
        return Ok(ImportSummary::default());
    };

    let mut summary = ImportSummary::default();
    for row in rows {
        match import_row(row, store)? {
            Some(media) => {
                summary.contacts += 1;
                summary.media += media;
            }
            None => summary.skipped += 1,
        }
    }
    info!(
        contacts = summary.contacts,
        media = summary.media,
        skipped = summary.skipped,
        "import finished"
    );
    Ok(summary)
}

/// Imports one row, returning how many media it materialized. `Ok(None)`
/// means the row was skipped as malformed.
fn import_row(row: &Value, store: &dyn EntityStore) -> Result<Option<usize>, ImportError> {
    let Some(fields) = row.as_object() else {
        warn!(row = %row, "contact not imported as it is not an object");
        return Ok(None);
    };
    let Some(id) = fields.get("id").and_then(Value::as_str) else {
        warn!(row = %row, "contact not imported as it has no id");
        return Ok(None);
    };
    let contact_id = match ContactId::parse(id) {
        Ok(contact_id) => contact_id,
        Err(err) => {
            warn!(row = %row, %err, "contact not imported as its id is invalid");
            return Ok(None);
        }
    };

    let mut attributes: BTreeMap<String, Value> = BTreeMap::new();
    let mut media_data: Option<Map<String, Value>> = None;
    for (key, value) in fields {
        match key.as_str() {
            "id" => {}
            // The media sub-map is removed and captured; it is not a
            // contact attribute.
            "media" => media_data = value.as_object().cloned(),
            _ => {
                attributes.insert(key.clone(), value.clone());
            }
        }
    }

    let contact = store.create_contact(Contact::with_attributes(contact_id, attributes))?;

    let mut media_count = 0;
    if let Some(media_data) = media_data {
        for (channel_name, medium_data) in &media_data {
            let channel = ChannelType::from_name(channel_name);
            let medium = build_medium(&contact.id, channel, medium_data);
            store.create_medium(medium.clone())?;
            store.link_medium(&contact.id, &medium.id)?;
            media_count += 1;
        }
    }
    Ok(Some(media_count))
}

/// Builds a medium from one channel entry. Attributes the dump omitted
/// stay absent; nothing is defaulted.
fn build_medium(owner: &ContactId, channel: ChannelType, data: &Value) -> Medium {
    let mut medium = Medium::new(MediumId::derived(owner, &channel), channel);
    medium.address = data
        .get("address")
        .and_then(Value::as_str)
        .map(str::to_string);
    medium.interval = data.get("interval").and_then(Value::as_i64);
    medium.rollup_threshold = data.get("rollup_threshold").and_then(Value::as_i64);
    medium
}
