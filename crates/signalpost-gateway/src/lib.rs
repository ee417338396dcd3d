// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Batch resource gateway: list/get/patch/delete over delimited id sets
//! for contacts and media, with all-or-none resolution and exact status
//! code contracts (200 with a kind-keyed body, 204 empty on mutation,
//! 404 empty on any resolution failure).

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use signalpost_store::EntityStore;

mod handlers;
mod resolve;
mod wire;

pub const CRATE_NAME: &str = "signalpost-gateway";

pub use resolve::{parse_id_list, resolve_contacts, resolve_media};
pub use wire::PatchOpDto;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub api: ApiConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_config(store, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn EntityStore>, api: ApiConfig) -> Self {
        Self { store, api }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/media", get(handlers::list_media_handler))
        .route(
            "/media/:ids",
            get(handlers::get_media_handler)
                .patch(handlers::patch_media_handler)
                .delete(handlers::delete_media_handler),
        )
        .route("/contacts", get(handlers::list_contacts_handler))
        .route(
            "/contacts/:ids",
            get(handlers::get_contacts_handler)
                .patch(handlers::patch_contacts_handler)
                .delete(handlers::delete_contacts_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
