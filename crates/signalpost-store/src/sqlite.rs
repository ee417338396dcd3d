// SPDX-License-Identifier: Apache-2.0

//! SQLite-backed entity store, used by the import CLI and by the gateway
//! binary when a database path is configured.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use signalpost_model::{ChannelType, Contact, ContactId, Medium, MediumId};

use crate::{EntityStore, ResourceKind, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id         TEXT PRIMARY KEY,
    attributes TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS media (
    id               TEXT PRIMARY KEY,
    channel          TEXT NOT NULL,
    address          TEXT,
    interval         INTEGER,
    rollup_threshold INTEGER,
    extra            TEXT NOT NULL,
    owner_id         TEXT,
    position         INTEGER
);
CREATE INDEX IF NOT EXISTS idx_media_owner ON media(owner_id, position);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl SqliteStore {
    /// Opens or creates a store at `path`, enabling WAL mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("sqlite store mutex poisoned".to_string()))
    }
}

fn encode_json(value: &BTreeMap<String, serde_json::Value>) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Backend(e.to_string()))
}

fn decode_attributes(raw: &str) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Backend(e.to_string()))
}

fn contact_from_row(id: &str, attributes: &str) -> Result<Contact, StoreError> {
    let id = ContactId::parse(id).map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(Contact::with_attributes(id, decode_attributes(attributes)?))
}

struct MediumRow {
    id: String,
    channel: String,
    address: Option<String>,
    interval: Option<i64>,
    rollup_threshold: Option<i64>,
    extra: String,
}

fn medium_from_row(row: MediumRow) -> Result<Medium, StoreError> {
    let id = MediumId::parse(&row.id).map_err(|e| StoreError::Backend(e.to_string()))?;
    let mut medium = Medium::new(id, ChannelType::from_name(&row.channel));
    medium.address = row.address;
    medium.interval = row.interval;
    medium.rollup_threshold = row.rollup_threshold;
    medium.extra = decode_attributes(&row.extra)?;
    Ok(medium)
}

const SELECT_MEDIUM_FIELDS: &str = "id, channel, address, interval, rollup_threshold, extra";

fn read_medium_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediumRow> {
    Ok(MediumRow {
        id: row.get(0)?,
        channel: row.get(1)?,
        address: row.get(2)?,
        interval: row.get(3)?,
        rollup_threshold: row.get(4)?,
        extra: row.get(5)?,
    })
}

impl EntityStore for SqliteStore {
    fn create_contact(&self, contact: Contact) -> Result<Contact, StoreError> {
        let conn = self.lock()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM contacts WHERE id = ?1",
                params![contact.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Conflict {
                kind: ResourceKind::Contact,
                id: contact.id.as_str().to_string(),
            });
        }
        conn.execute(
            "INSERT INTO contacts(id, attributes) VALUES (?1, ?2)",
            params![contact.id.as_str(), encode_json(&contact.attributes)?],
        )?;
        Ok(contact)
    }

    fn create_medium(&self, medium: Medium) -> Result<Medium, StoreError> {
        let conn = self.lock()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM media WHERE id = ?1",
                params![medium.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Conflict {
                kind: ResourceKind::Medium,
                id: medium.id.as_str().to_string(),
            });
        }
        conn.execute(
            "INSERT INTO media(id, channel, address, interval, rollup_threshold, extra)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                medium.id.as_str(),
                medium.channel.as_str(),
                medium.address,
                medium.interval,
                medium.rollup_threshold,
                encode_json(&medium.extra)?,
            ],
        )?;
        Ok(medium)
    }

    fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError> {
        let conn = self.lock()?;
        let mut found: BTreeMap<String, Contact> = BTreeMap::new();
        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if found.contains_key(id.as_str()) || missing.iter().any(|m| m == id.as_str()) {
                continue;
            }
            let attributes: Option<String> = conn
                .query_row(
                    "SELECT attributes FROM contacts WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            match attributes {
                Some(attributes) => {
                    found.insert(
                        id.as_str().to_string(),
                        contact_from_row(id.as_str(), &attributes)?,
                    );
                }
                None => missing.push(id.as_str().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing,
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| found.get(id.as_str()).cloned())
            .collect())
    }

    fn media_by_ids(&self, ids: &[MediumId]) -> Result<Vec<Medium>, StoreError> {
        let conn = self.lock()?;
        let mut found: BTreeMap<String, Medium> = BTreeMap::new();
        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if found.contains_key(id.as_str()) || missing.iter().any(|m| m == id.as_str()) {
                continue;
            }
            let row = conn
                .query_row(
                    &format!("SELECT {SELECT_MEDIUM_FIELDS} FROM media WHERE id = ?1"),
                    params![id.as_str()],
                    read_medium_row,
                )
                .optional()?;
            match row {
                Some(row) => {
                    found.insert(id.as_str().to_string(), medium_from_row(row)?);
                }
                None => missing.push(id.as_str().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing,
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| found.get(id.as_str()).cloned())
            .collect())
    }

    fn all_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, attributes FROM contacts ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut contacts = Vec::new();
        for row in rows {
            let (id, attributes) = row?;
            contacts.push(contact_from_row(&id, &attributes)?);
        }
        Ok(contacts)
    }

    fn all_media(&self) -> Result<Vec<Medium>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_MEDIUM_FIELDS} FROM media ORDER BY rowid"
            ))?;
        let rows = stmt.query_map([], read_medium_row)?;
        let mut media = Vec::new();
        for row in rows {
            media.push(medium_from_row(row?)?);
        }
        Ok(media)
    }

    fn save_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contacts(id, attributes) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET attributes = excluded.attributes",
            params![contact.id.as_str(), encode_json(&contact.attributes)?],
        )?;
        Ok(())
    }

    fn save_medium(&self, medium: &Medium) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO media(id, channel, address, interval, rollup_threshold, extra)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 channel = excluded.channel,
                 address = excluded.address,
                 interval = excluded.interval,
                 rollup_threshold = excluded.rollup_threshold,
                 extra = excluded.extra",
            params![
                medium.id.as_str(),
                medium.channel.as_str(),
                medium.address,
                medium.interval,
                medium.rollup_threshold,
                encode_json(&medium.extra)?,
            ],
        )?;
        Ok(())
    }

    fn destroy_contact(&self, id: &ContactId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM contacts WHERE id = ?1", params![id.as_str()])?;
        if deleted == 0 {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing: vec![id.as_str().to_string()],
            });
        }
        // Owned media survive unowned; only the edges go.
        conn.execute(
            "UPDATE media SET owner_id = NULL, position = NULL WHERE owner_id = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }

    fn destroy_medium(&self, id: &MediumId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM media WHERE id = ?1", params![id.as_str()])?;
        if deleted == 0 {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing: vec![id.as_str().to_string()],
            });
        }
        Ok(())
    }

    fn link_medium(&self, owner: &ContactId, medium: &MediumId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let owner_exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM contacts WHERE id = ?1",
                params![owner.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if owner_exists.is_none() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing: vec![owner.as_str().to_string()],
            });
        }
        let next_position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM media WHERE owner_id = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?;
        let updated = conn.execute(
            "UPDATE media SET owner_id = ?1, position = ?2 WHERE id = ?3",
            params![owner.as_str(), next_position, medium.as_str()],
        )?;
        if updated == 0 {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing: vec![medium.as_str().to_string()],
            });
        }
        Ok(())
    }

    fn contact_media(&self, owner: &ContactId) -> Result<Vec<MediumId>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id FROM media WHERE owner_id = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![owner.as_str()], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            let raw = row?;
            ids.push(MediumId::parse(&raw).map_err(|e| StoreError::Backend(e.to_string()))?);
        }
        Ok(ids)
    }

    fn media_owners(
        &self,
        ids: &[MediumId],
    ) -> Result<BTreeMap<MediumId, ContactId>, StoreError> {
        let conn = self.lock()?;
        let mut owners = BTreeMap::new();
        for id in ids {
            let owner: Option<Option<String>> = conn
                .query_row(
                    "SELECT owner_id FROM media WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(Some(owner)) = owner {
                let owner =
                    ContactId::parse(&owner).map_err(|e| StoreError::Backend(e.to_string()))?;
                owners.insert(id.clone(), owner);
            }
        }
        Ok(owners)
    }
}
