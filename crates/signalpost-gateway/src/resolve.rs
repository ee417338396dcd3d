// SPDX-License-Identifier: Apache-2.0

//! Batch resolver: a comma-delimited id list resolves to the full entity
//! set or fails as a whole. The existence check is a single store call, so
//! callers never observe a mix of found and missing entities and a failed
//! batch leaves the store untouched.

use signalpost_model::{Contact, ContactId, Medium, MediumId};
use signalpost_store::{EntityStore, ResourceKind, StoreError};

/// Splits a delimited id list. Order-preserving; duplicates are kept, not
/// deduplicated — the caller asked for that many entities.
#[must_use]
pub fn parse_id_list(raw: &str) -> Vec<&str> {
    raw.split(',').collect()
}

fn not_found(kind: ResourceKind, id: &str) -> StoreError {
    StoreError::RecordsNotFound {
        kind,
        missing: vec![id.to_string()],
    }
}

/// Resolves a delimited medium id list, request order, all-or-none.
pub fn resolve_media(store: &dyn EntityStore, raw: &str) -> Result<Vec<Medium>, StoreError> {
    let mut ids = Vec::new();
    for segment in parse_id_list(raw) {
        // A syntactically invalid id cannot have a backing record, so it
        // fails the batch the same way an absent one does.
        let id = MediumId::parse(segment)
            .map_err(|_| not_found(ResourceKind::Medium, segment))?;
        ids.push(id);
    }
    store.media_by_ids(&ids)
}

/// Resolves a delimited contact id list, request order, all-or-none.
pub fn resolve_contacts(store: &dyn EntityStore, raw: &str) -> Result<Vec<Contact>, StoreError> {
    let mut ids = Vec::new();
    for segment in parse_id_list(raw) {
        let id = ContactId::parse(segment)
            .map_err(|_| not_found(ResourceKind::Contact, segment))?;
        ids.push(id);
    }
    store.contacts_by_ids(&ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use signalpost_model::ChannelType;
    use signalpost_store::MemoryStore;

    #[test]
    fn id_list_preserves_order_and_duplicates() {
        assert_eq!(parse_id_list("a,b,a"), vec!["a", "b", "a"]);
        assert_eq!(parse_id_list("solo"), vec!["solo"]);
    }

    #[test]
    fn resolution_failure_has_no_partial_result() {
        let store = MemoryStore::new();
        store
            .create_medium(Medium::new(
                MediumId::parse("m1").expect("id"),
                ChannelType::Email,
            ))
            .expect("create");
        let err = resolve_media(&store, "m1,absent").expect_err("absent id fails the batch");
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_segment_resolves_like_a_missing_id() {
        let store = MemoryStore::new();
        let err = resolve_media(&store, "").expect_err("empty segment");
        assert_eq!(
            err,
            StoreError::RecordsNotFound {
                kind: ResourceKind::Medium,
                missing: vec![String::new()],
            }
        );
    }

    proptest! {
        #[test]
        fn parse_round_trips_any_comma_free_ids(ids in prop::collection::vec("[a-z0-9_]{1,12}", 1..8)) {
            let joined = ids.join(",");
            let parsed: Vec<String> = parse_id_list(&joined)
                .into_iter()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(parsed, ids);
        }

        #[test]
        fn resolving_only_known_ids_never_fails(present in prop::collection::vec("[a-z0-9]{1,8}", 1..6)) {
            let store = MemoryStore::new();
            let mut unique = present.clone();
            unique.sort();
            unique.dedup();
            for id in &unique {
                store
                    .create_medium(Medium::new(
                        MediumId::parse(id).expect("id"),
                        ChannelType::Sms,
                    ))
                    .expect("create");
            }
            let raw = present.join(",");
            let resolved = resolve_media(&store, &raw).expect("all ids exist");
            let ids: Vec<&str> = resolved.iter().map(|m| m.id.as_str()).collect();
            prop_assert_eq!(ids, present.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
