// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use signalpost_model::MediumId;
use signalpost_store::StoreError;
use tracing::{error, warn};

use crate::resolve::{resolve_contacts, resolve_media};
use crate::wire::{contact_wire, medium_wire, PatchOpDto};
use crate::AppState;

fn empty(status: StatusCode) -> Response {
    status.into_response()
}

fn store_failure(context: &'static str, err: &StoreError) -> Response {
    error!(context, %err, "store failure");
    empty(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Maps a batch resolution outcome to either the resolved set or the
/// response to send: 404 empty for any missing id, 500 for backend
/// failures. Nothing is mutated once this returns an error response.
fn resolved<T>(context: &'static str, outcome: Result<Vec<T>, StoreError>) -> Result<Vec<T>, Response> {
    match outcome {
        Ok(entities) => Ok(entities),
        Err(err) if err.is_not_found() => {
            warn!(context, %err, "batch resolution failed");
            Err(empty(StatusCode::NOT_FOUND))
        }
        Err(err) => Err(store_failure(context, &err)),
    }
}

pub(crate) async fn healthz_handler() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

pub(crate) async fn list_media_handler(State(state): State<AppState>) -> Response {
    let media = match state.store.all_media() {
        Ok(media) => media,
        Err(err) => return store_failure("media", &err),
    };
    let ids: Vec<MediumId> = media.iter().map(|m| m.id.clone()).collect();
    let owners = match state.store.media_owners(&ids) {
        Ok(owners) => owners,
        Err(err) => return store_failure("media", &err),
    };
    let docs: Vec<Value> = media.iter().map(|m| medium_wire(m, &owners)).collect();
    (StatusCode::OK, Json(json!({ "media": docs }))).into_response()
}

pub(crate) async fn get_media_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Response {
    let media = match resolved("media", resolve_media(state.store.as_ref(), &ids)) {
        Ok(media) => media,
        Err(response) => return response,
    };
    let ids: Vec<MediumId> = media.iter().map(|m| m.id.clone()).collect();
    let owners = match state.store.media_owners(&ids) {
        Ok(owners) => owners,
        Err(err) => return store_failure("media", &err),
    };
    let docs: Vec<Value> = media.iter().map(|m| medium_wire(m, &owners)).collect();
    (StatusCode::OK, Json(json!({ "media": docs }))).into_response()
}

pub(crate) async fn patch_media_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Json(ops): Json<Vec<PatchOpDto>>,
) -> Response {
    let mut media = match resolved("media", resolve_media(state.store.as_ref(), &ids)) {
        Ok(media) => media,
        Err(response) => return response,
    };
    for op in &ops {
        if op.op != "replace" {
            warn!(op = op.op.as_str(), "unsupported patch op skipped");
            continue;
        }
        let Some(field) = op.field_name() else {
            warn!(path = op.path.as_str(), "patch path names no field, op skipped");
            continue;
        };
        // Uniform apply: the same field assignment lands on every entity
        // in the resolved set, then each is saved individually.
        let mut applicable = true;
        for medium in media.iter_mut() {
            if let Err(err) = medium.apply_replace(field, &op.value) {
                warn!(field, %err, "replace op skipped");
                applicable = false;
                break;
            }
        }
        if !applicable {
            continue;
        }
        for medium in media.iter() {
            if let Err(err) = state.store.save_medium(medium) {
                return store_failure("media", &err);
            }
        }
    }
    empty(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_media_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Response {
    let media = match resolved("media", resolve_media(state.store.as_ref(), &ids)) {
        Ok(media) => media,
        Err(response) => return response,
    };
    for medium in &media {
        match state.store.destroy_medium(&medium.id) {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                // Lost a race with a concurrent delete after resolution.
                warn!(id = medium.id.as_str(), "medium vanished before destroy");
            }
            Err(err) => return store_failure("media", &err),
        }
    }
    empty(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_contacts_handler(State(state): State<AppState>) -> Response {
    let contacts = match state.store.all_contacts() {
        Ok(contacts) => contacts,
        Err(err) => return store_failure("contacts", &err),
    };
    let mut docs = Vec::with_capacity(contacts.len());
    for contact in &contacts {
        let media = match state.store.contact_media(&contact.id) {
            Ok(media) => media,
            Err(err) => return store_failure("contacts", &err),
        };
        docs.push(contact_wire(contact, &media));
    }
    (StatusCode::OK, Json(json!({ "contacts": docs }))).into_response()
}

pub(crate) async fn get_contacts_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Response {
    let contacts = match resolved("contacts", resolve_contacts(state.store.as_ref(), &ids)) {
        Ok(contacts) => contacts,
        Err(response) => return response,
    };
    let mut docs = Vec::with_capacity(contacts.len());
    for contact in &contacts {
        let media = match state.store.contact_media(&contact.id) {
            Ok(media) => media,
            Err(err) => return store_failure("contacts", &err),
        };
        docs.push(contact_wire(contact, &media));
    }
    (StatusCode::OK, Json(json!({ "contacts": docs }))).into_response()
}

pub(crate) async fn patch_contacts_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Json(ops): Json<Vec<PatchOpDto>>,
) -> Response {
    let mut contacts = match resolved("contacts", resolve_contacts(state.store.as_ref(), &ids)) {
        Ok(contacts) => contacts,
        Err(response) => return response,
    };
    for op in &ops {
        if op.op != "replace" {
            warn!(op = op.op.as_str(), "unsupported patch op skipped");
            continue;
        }
        let Some(field) = op.field_name() else {
            warn!(path = op.path.as_str(), "patch path names no field, op skipped");
            continue;
        };
        let mut applicable = true;
        for contact in contacts.iter_mut() {
            if let Err(err) = contact.apply_replace(field, &op.value) {
                warn!(field, %err, "replace op skipped");
                applicable = false;
                break;
            }
        }
        if !applicable {
            continue;
        }
        for contact in contacts.iter() {
            if let Err(err) = state.store.save_contact(contact) {
                return store_failure("contacts", &err);
            }
        }
    }
    empty(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_contacts_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Response {
    let contacts = match resolved("contacts", resolve_contacts(state.store.as_ref(), &ids)) {
        Ok(contacts) => contacts,
        Err(response) => return response,
    };
    for contact in &contacts {
        match state.store.destroy_contact(&contact.id) {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                warn!(id = contact.id.as_str(), "contact vanished before destroy");
            }
            Err(err) => return store_failure("contacts", &err),
        }
    }
    empty(StatusCode::NO_CONTENT)
}
