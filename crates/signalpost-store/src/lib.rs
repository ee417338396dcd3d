// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Entity store contract and its two implementations.
//!
//! The store offers keyed CRUD over contacts and media plus the ownership
//! edge between them. `*_by_ids` is the all-or-none existence check the
//! batch resolver builds on: it returns either every requested entity or a
//! [`StoreError::RecordsNotFound`] naming all missing ids, never a partial
//! list. Per-call atomicity is the store's job; multi-record transactions
//! are nobody's.

mod memory;
mod sqlite;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use signalpost_model::{Contact, ContactId, Medium, MediumId};

pub const CRATE_NAME: &str = "signalpost-store";

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A named entity type exposed through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Contact,
    Medium,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Medium => "medium",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// At least one id in a batch lookup has no backing record. Carries
    /// every missing id so callers can report the whole failure at once.
    RecordsNotFound {
        kind: ResourceKind,
        missing: Vec<String>,
    },
    /// Create collided with an existing record.
    Conflict { kind: ResourceKind, id: String },
    /// Backend-level failure (I/O, serialization, poisoned lock).
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordsNotFound { kind, missing } => {
                write!(f, "{kind} records not found: {}", missing.join(","))
            }
            Self::Conflict { kind, id } => write!(f, "{kind} {id} already exists"),
            Self::Backend(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordsNotFound { .. })
    }
}

/// Keyed persistent storage for contacts and media.
///
/// Implementations guard each call with their own synchronization; callers
/// share a store handle via `Arc<dyn EntityStore>` instead of process-wide
/// singleton state.
pub trait EntityStore: Send + Sync {
    fn create_contact(&self, contact: Contact) -> Result<Contact, StoreError>;
    fn create_medium(&self, medium: Medium) -> Result<Medium, StoreError>;

    /// All-or-none lookup, request order, duplicates preserved.
    fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError>;
    /// All-or-none lookup, request order, duplicates preserved.
    fn media_by_ids(&self, ids: &[MediumId]) -> Result<Vec<Medium>, StoreError>;

    /// Every contact, in store (insertion) order.
    fn all_contacts(&self) -> Result<Vec<Contact>, StoreError>;
    /// Every medium, in store (insertion) order.
    fn all_media(&self) -> Result<Vec<Medium>, StoreError>;

    /// Upsert by id.
    fn save_contact(&self, contact: &Contact) -> Result<(), StoreError>;
    /// Upsert by id.
    fn save_medium(&self, medium: &Medium) -> Result<(), StoreError>;

    /// Destroying a contact drops its ownership edges; owned media survive
    /// unowned. Cascade deletion is deliberately not provided.
    fn destroy_contact(&self, id: &ContactId) -> Result<(), StoreError>;
    fn destroy_medium(&self, id: &MediumId) -> Result<(), StoreError>;

    /// Append a medium to a contact's ordered media collection. A medium
    /// already owned elsewhere moves to the new owner.
    fn link_medium(&self, owner: &ContactId, medium: &MediumId) -> Result<(), StoreError>;

    /// Ordered ids of the media a contact owns.
    fn contact_media(&self, owner: &ContactId) -> Result<Vec<MediumId>, StoreError>;

    /// Reverse lookup: owning contact id per medium id. Unlinked media are
    /// simply absent from the result; this call never fails on missing ids
    /// because it only shapes response links.
    fn media_owners(
        &self,
        ids: &[MediumId],
    ) -> Result<BTreeMap<MediumId, ContactId>, StoreError>;
}
