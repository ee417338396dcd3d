// SPDX-License-Identifier: Apache-2.0

//! End-to-end status-code and body contracts for the batch resource
//! protocol, exercised over real HTTP against a served router.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use signalpost_gateway::{build_router, AppState};
use signalpost_model::{ChannelType, Contact, ContactId, Medium, MediumId};
use signalpost_store::{EntityStore, MemoryStore};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn cid(id: &str) -> ContactId {
    ContactId::parse(id).expect("contact id")
}

fn mid(id: &str) -> MediumId {
    MediumId::parse(id).expect("medium id")
}

fn seed_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), json!("Ada"));
    store
        .create_contact(Contact::with_attributes(cid("c1"), attributes))
        .expect("create c1");

    let mut email = Medium::new(mid("ab12"), ChannelType::Email);
    email.address = Some("abc@example.com".to_string());
    email.interval = Some(120);
    email.rollup_threshold = Some(3);
    store.create_medium(email).expect("create ab12");

    let mut sms = Medium::new(mid("uiop"), ChannelType::Sms);
    sms.address = Some("+15551234".to_string());
    sms.interval = Some(60);
    store.create_medium(sms).expect("create uiop");

    store.link_medium(&cid("c1"), &mid("ab12")).expect("link");
    store.link_medium(&cid("c1"), &mid("uiop")).expect("link");
    store
}

async fn serve(store: Arc<MemoryStore>) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(AppState::new(store));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(body) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, body.to_string())
}

#[tokio::test]
async fn healthz_reports_ok() {
    let addr = serve(seed_store()).await;
    let (status, body) = send_raw(addr, "GET", "/healthz", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json, json!({"status": "ok"}));
}

#[tokio::test]
async fn list_returns_all_media_in_store_order_with_owner_links() {
    let addr = serve(seed_store()).await;
    let (status, body) = send_raw(addr, "GET", "/media", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("json body");
    let media = json["media"].as_array().expect("media array");
    assert_eq!(media.len(), 2);
    assert_eq!(media[0]["id"], "ab12");
    assert_eq!(media[1]["id"], "uiop");
    assert_eq!(media[0]["links"], json!({"contacts": ["c1"]}));
    assert_eq!(media[1]["links"], json!({"contacts": ["c1"]}));
}

#[tokio::test]
async fn get_returns_requested_media_in_request_order() {
    let addr = serve(seed_store()).await;
    let (status, body) = send_raw(addr, "GET", "/media/uiop,ab12", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(
        json,
        json!({"media": [
            {
                "id": "uiop",
                "type": "sms",
                "address": "+15551234",
                "interval": 60,
                "links": {"contacts": ["c1"]},
            },
            {
                "id": "ab12",
                "type": "email",
                "address": "abc@example.com",
                "interval": 120,
                "rollup_threshold": 3,
                "links": {"contacts": ["c1"]},
            },
        ]})
    );
}

#[tokio::test]
async fn get_with_any_missing_id_is_an_empty_404() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let (status, body) = send_raw(addr, "GET", "/media/ab12,ghost", None).await;
    assert_eq!(status, 404);
    assert!(body.is_empty(), "404 body must be empty, got {body:?}");
    assert_eq!(store.save_call_count(), 0);
    assert_eq!(store.destroy_call_count(), 0);
}

#[tokio::test]
async fn patch_applies_one_replace_uniformly_and_saves_each_once() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let ops = json!([{"op": "replace", "path": "/media/0/interval", "value": 80}]).to_string();
    let (status, body) = send_raw(addr, "PATCH", "/media/ab12,uiop", Some(&ops)).await;
    assert_eq!(status, 204);
    assert!(body.is_empty(), "204 body must be empty, got {body:?}");

    let media = store
        .media_by_ids(&[mid("ab12"), mid("uiop")])
        .expect("refetch");
    assert_eq!(media[0].interval, Some(80));
    assert_eq!(media[1].interval, Some(80));
    assert_eq!(store.save_call_count(), 2, "each entity saved exactly once");
}

#[tokio::test]
async fn patch_with_missing_id_mutates_nothing() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let ops = json!([{"op": "replace", "path": "/media/0/address", "value": "x"}]).to_string();
    let (status, body) = send_raw(addr, "PATCH", "/media/ab12,ghost", Some(&ops)).await;
    assert_eq!(status, 404);
    assert!(body.is_empty());
    assert_eq!(store.save_call_count(), 0);

    let media = store.media_by_ids(&[mid("ab12")]).expect("refetch");
    assert_eq!(media[0].address.as_deref(), Some("abc@example.com"));
}

#[tokio::test]
async fn patch_skips_unsupported_ops_but_applies_replaces() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let ops = json!([
        {"op": "add", "path": "/media/0/interval", "value": 999},
        {"op": "replace", "path": "/media/0/rollup_threshold", "value": 7},
    ])
    .to_string();
    let (status, _) = send_raw(addr, "PATCH", "/media/uiop", Some(&ops)).await;
    assert_eq!(status, 204);

    let media = store.media_by_ids(&[mid("uiop")]).expect("refetch");
    assert_eq!(media[0].interval, Some(60), "add op must not apply");
    assert_eq!(media[0].rollup_threshold, Some(7));
    assert_eq!(store.save_call_count(), 1);
}

#[tokio::test]
async fn delete_destroys_every_resolved_medium() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let (status, body) = send_raw(addr, "DELETE", "/media/ab12,uiop", None).await;
    assert_eq!(status, 204);
    assert!(body.is_empty());
    assert_eq!(store.destroy_call_count(), 2);
    assert!(store.all_media().expect("all media").is_empty());
}

#[tokio::test]
async fn delete_with_missing_id_destroys_nothing() {
    let store = seed_store();
    let addr = serve(store.clone()).await;
    let (status, body) = send_raw(addr, "DELETE", "/media/ghost,ab12", None).await;
    assert_eq!(status, 404);
    assert!(body.is_empty());
    assert_eq!(store.destroy_call_count(), 0);
    assert_eq!(store.all_media().expect("all media").len(), 2);
}

#[tokio::test]
async fn contacts_follow_the_same_four_shapes() {
    let store = seed_store();
    let addr = serve(store.clone()).await;

    let (status, body) = send_raw(addr, "GET", "/contacts/c1", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(
        json,
        json!({"contacts": [{
            "id": "c1",
            "name": "Ada",
            "links": {"media": ["ab12", "uiop"]},
        }]})
    );

    let ops = json!([{"op": "replace", "path": "/contacts/0/timezone", "value": "UTC"}])
        .to_string();
    let (status, _) = send_raw(addr, "PATCH", "/contacts/c1", Some(&ops)).await;
    assert_eq!(status, 204);
    let contacts = store.contacts_by_ids(&[cid("c1")]).expect("refetch");
    assert_eq!(contacts[0].attributes.get("timezone"), Some(&json!("UTC")));

    let (status, _) = send_raw(addr, "GET", "/contacts/absent", None).await;
    assert_eq!(status, 404);

    let (status, _) = send_raw(addr, "DELETE", "/contacts/c1", None).await;
    assert_eq!(status, 204);
    // Owned media survive the contact, unowned.
    let media = store.all_media().expect("all media");
    assert_eq!(media.len(), 2);
    let owners = store
        .media_owners(&[mid("ab12"), mid("uiop")])
        .expect("owners");
    assert!(owners.is_empty());
}

#[tokio::test]
async fn list_contacts_returns_kind_keyed_document() {
    let addr = serve(seed_store()).await;
    let (status, body) = send_raw(addr, "GET", "/contacts", None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("json body");
    let contacts = json["contacts"].as_array().expect("contacts array");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["id"], "c1");
}
