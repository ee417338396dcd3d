// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use signalpost_model::{Contact, ContactId, Medium, MediumId};

use crate::{EntityStore, ResourceKind, StoreError};

#[derive(Debug, Default)]
struct MemoryInner {
    contacts: BTreeMap<String, Contact>,
    contact_order: Vec<ContactId>,
    media: BTreeMap<String, Medium>,
    media_order: Vec<MediumId>,
    owned: BTreeMap<String, Vec<MediumId>>,
    owner_of: BTreeMap<String, ContactId>,
}

/// In-memory store. The default backend for the gateway binary when no
/// database path is configured, and the instrumented double for tests:
/// the call counters let tests assert that a failed batch left every
/// record untouched and that a patch saved each entity exactly once.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    pub save_calls: AtomicU64,
    pub destroy_calls: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_call_count(&self) -> u64 {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn destroy_call_count(&self) -> u64 {
        self.destroy_calls.load(Ordering::Relaxed)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store mutex poisoned".to_string()))
    }
}

fn missing_ids<'a, V, I>(present: &BTreeMap<String, V>, ids: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut missing = Vec::new();
    for id in ids {
        if !present.contains_key(id) && !missing.iter().any(|m| m == id) {
            missing.push(id.to_string());
        }
    }
    missing
}

impl EntityStore for MemoryStore {
    fn create_contact(&self, contact: Contact) -> Result<Contact, StoreError> {
        let mut inner = self.lock()?;
        if inner.contacts.contains_key(contact.id.as_str()) {
            return Err(StoreError::Conflict {
                kind: ResourceKind::Contact,
                id: contact.id.as_str().to_string(),
            });
        }
        inner.contact_order.push(contact.id.clone());
        inner
            .contacts
            .insert(contact.id.as_str().to_string(), contact.clone());
        Ok(contact)
    }

    fn create_medium(&self, medium: Medium) -> Result<Medium, StoreError> {
        let mut inner = self.lock()?;
        if inner.media.contains_key(medium.id.as_str()) {
            return Err(StoreError::Conflict {
                kind: ResourceKind::Medium,
                id: medium.id.as_str().to_string(),
            });
        }
        inner.media_order.push(medium.id.clone());
        inner
            .media
            .insert(medium.id.as_str().to_string(), medium.clone());
        Ok(medium)
    }

    fn contacts_by_ids(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError> {
        let inner = self.lock()?;
        let missing = missing_ids(&inner.contacts, ids.iter().map(ContactId::as_str));
        if !missing.is_empty() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing,
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| inner.contacts.get(id.as_str()).cloned())
            .collect())
    }

    fn media_by_ids(&self, ids: &[MediumId]) -> Result<Vec<Medium>, StoreError> {
        let inner = self.lock()?;
        let missing = missing_ids(&inner.media, ids.iter().map(MediumId::as_str));
        if !missing.is_empty() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing,
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| inner.media.get(id.as_str()).cloned())
            .collect())
    }

    fn all_contacts(&self) -> Result<Vec<Contact>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .contact_order
            .iter()
            .filter_map(|id| inner.contacts.get(id.as_str()).cloned())
            .collect())
    }

    fn all_media(&self) -> Result<Vec<Medium>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .media_order
            .iter()
            .filter_map(|id| inner.media.get(id.as_str()).cloned())
            .collect())
    }

    fn save_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        if !inner.contacts.contains_key(contact.id.as_str()) {
            inner.contact_order.push(contact.id.clone());
        }
        inner
            .contacts
            .insert(contact.id.as_str().to_string(), contact.clone());
        Ok(())
    }

    fn save_medium(&self, medium: &Medium) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        if !inner.media.contains_key(medium.id.as_str()) {
            inner.media_order.push(medium.id.clone());
        }
        inner
            .media
            .insert(medium.id.as_str().to_string(), medium.clone());
        Ok(())
    }

    fn destroy_contact(&self, id: &ContactId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.contacts.remove(id.as_str()).is_none() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing: vec![id.as_str().to_string()],
            });
        }
        self.destroy_calls.fetch_add(1, Ordering::Relaxed);
        inner.contact_order.retain(|c| c != id);
        if let Some(owned) = inner.owned.remove(id.as_str()) {
            for medium in owned {
                inner.owner_of.remove(medium.as_str());
            }
        }
        Ok(())
    }

    fn destroy_medium(&self, id: &MediumId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.media.remove(id.as_str()).is_none() {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing: vec![id.as_str().to_string()],
            });
        }
        self.destroy_calls.fetch_add(1, Ordering::Relaxed);
        inner.media_order.retain(|m| m != id);
        if let Some(owner) = inner.owner_of.remove(id.as_str()) {
            if let Some(owned) = inner.owned.get_mut(owner.as_str()) {
                owned.retain(|m| m != id);
            }
        }
        Ok(())
    }

    fn link_medium(&self, owner: &ContactId, medium: &MediumId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if !inner.contacts.contains_key(owner.as_str()) {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Contact,
                missing: vec![owner.as_str().to_string()],
            });
        }
        if !inner.media.contains_key(medium.as_str()) {
            return Err(StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing: vec![medium.as_str().to_string()],
            });
        }
        if let Some(previous) = inner.owner_of.remove(medium.as_str()) {
            if let Some(owned) = inner.owned.get_mut(previous.as_str()) {
                owned.retain(|m| m != medium);
            }
        }
        inner
            .owner_of
            .insert(medium.as_str().to_string(), owner.clone());
        inner
            .owned
            .entry(owner.as_str().to_string())
            .or_default()
            .push(medium.clone());
        Ok(())
    }

    fn contact_media(&self, owner: &ContactId) -> Result<Vec<MediumId>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.owned.get(owner.as_str()).cloned().unwrap_or_default())
    }

    fn media_owners(
        &self,
        ids: &[MediumId],
    ) -> Result<BTreeMap<MediumId, ContactId>, StoreError> {
        let inner = self.lock()?;
        let mut owners = BTreeMap::new();
        for id in ids {
            if let Some(owner) = inner.owner_of.get(id.as_str()) {
                owners.insert(id.clone(), owner.clone());
            }
        }
        Ok(owners)
    }
}
