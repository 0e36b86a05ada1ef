//! Behaviour tests for the profile sync HTTP flow.
//!
//! Each step drives the actix service on a single-threaded runtime with a
//! `LocalSet`; the store lives in the shared HTTP state so writes persist
//! across steps.

mod support;

use std::cell::RefCell;

use actix_web::http::Method;
use actix_web::test as actix_test;
use actix_web::web;
use profile_sync::inbound::http::state::HttpState;
use profile_sync::outbound::persistence::MemoryProfileStore;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use support::{ACCOUNT_HEADER, PLATFORM, memory_state, profile_app};

struct ProfileSyncWorld {
    runtime: Runtime,
    local: LocalSet,
    state: RefCell<web::Data<HttpState>>,
    last_status: RefCell<Option<u16>>,
}

impl ProfileSyncWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        Self {
            runtime,
            local: LocalSet::new(),
            state: RefCell::new(memory_state(MemoryProfileStore::new())),
            last_status: RefCell::new(None),
        }
    }

    fn reset(&self) {
        *self.state.borrow_mut() = memory_state(MemoryProfileStore::new());
        *self.last_status.borrow_mut() = None;
    }

    fn request(&self, method: Method, uri: &str, payload: Option<Value>) -> (u16, Value) {
        let state = self.state.borrow().clone();
        self.local.block_on(&self.runtime, async move {
            let app = actix_test::init_service(profile_app(state)).await;
            let mut req = actix_test::TestRequest::default()
                .method(method)
                .uri(uri)
                .insert_header((ACCOUNT_HEADER, "77"));
            if let Some(body) = payload {
                req = req.set_json(body);
            }
            let res = actix_test::call_service(&app, req.to_request()).await;
            let status = res.status().as_u16();
            let bytes = actix_test::read_body(res).await;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("json body")
            };
            (status, body)
        })
    }

    fn send(&self, method: Method, uri: &str, payload: Option<Value>) -> Value {
        let (status, body) = self.request(method, uri, payload);
        *self.last_status.borrow_mut() = Some(status);
        body
    }

    fn audit_log(&self) -> Vec<Value> {
        let (status, body) = self.request(Method::GET, "/audit", None);
        assert_eq!(status, 200);
        body.get("log")
            .and_then(Value::as_array)
            .cloned()
            .expect("audit log array")
    }
}

fn legacy_snapshot() -> Value {
    json!({
        "settings-v1.0": {"itemSize": 44},
        "loadouts-v3.0": [],
        format!("dimItemInfo-m{PLATFORM}-d2"): {
            "6917": {"tag": "favorite", "notes": "pvp roll"},
            "7001": {"tag": "junk"}
        }
    })
}

fn scoped_profile_uri() -> String {
    format!("/profile?platformMembershipId={PLATFORM}&destinyVersion=2&components=settings,tags")
}

#[fixture]
fn world() -> ProfileSyncWorld {
    ProfileSyncWorld::new()
}

#[given("an empty profile store")]
fn an_empty_profile_store(world: &ProfileSyncWorld) {
    world.reset();
}

#[given("the client has imported the legacy snapshot")]
fn the_client_has_imported_the_legacy_snapshot(world: &ProfileSyncWorld) {
    let (status, _) = world.request(Method::POST, "/import", Some(legacy_snapshot()));
    assert_eq!(status, 200);
}

#[when("the client imports the legacy snapshot")]
fn the_client_imports_the_legacy_snapshot(world: &ProfileSyncWorld) {
    world.send(Method::POST, "/import", Some(legacy_snapshot()));
}

#[when("the client deletes all data")]
fn the_client_deletes_all_data(world: &ProfileSyncWorld) {
    let body = world.send(Method::POST, "/delete_all_data", None);
    assert_eq!(body.get("tags"), Some(&json!(2)));
}

#[when("the client sends a tag update without a platform profile")]
fn the_client_sends_a_tag_update_without_a_platform_profile(world: &ProfileSyncWorld) {
    world.send(
        Method::POST,
        "/profile",
        Some(json!({
            "updates": [
                {"action": "setting", "payload": {"itemSize": 38}},
                {"action": "tag", "payload": {"id": "1", "tag": "keep"}}
            ]
        })),
    );
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &ProfileSyncWorld, status: u16) {
    assert_eq!(*world.last_status.borrow(), Some(status));
}

#[then("the profile shows item size {size} with {tags} tags")]
fn the_profile_shows_item_size_with_tags(world: &ProfileSyncWorld, size: u64, tags: usize) {
    let (status, profile) = world.request(Method::GET, &scoped_profile_uri(), None);
    assert_eq!(status, 200);
    assert_eq!(profile.pointer("/settings/itemSize"), Some(&json!(size)));
    assert_eq!(
        profile.get("tags").and_then(Value::as_array).map(Vec::len),
        Some(tags)
    );
}

#[then("the newest audit entry is import")]
fn the_newest_audit_entry_is_import(world: &ProfileSyncWorld) {
    let log = world.audit_log();
    assert_eq!(
        log.first().and_then(|entry| entry.get("action")),
        Some(&json!("import"))
    );
}

#[then("the export has no tags")]
fn the_export_has_no_tags(world: &ProfileSyncWorld) {
    let (status, export) = world.request(Method::GET, "/export", None);
    assert_eq!(status, 200);
    assert_eq!(export.get("tags"), Some(&json!([])));
}

#[then("the audit log holds only a delete_all entry")]
fn the_audit_log_holds_only_a_delete_all_entry(world: &ProfileSyncWorld) {
    let log = world.audit_log();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log.first().and_then(|entry| entry.get("action")),
        Some(&json!("delete_all"))
    );
}

#[then("the audit log is empty")]
fn the_audit_log_is_empty(world: &ProfileSyncWorld) {
    assert!(world.audit_log().is_empty());
}

#[scenario(path = "tests/features/profile_sync.feature")]
fn profile_sync(world: ProfileSyncWorld) {
    let _ = world;
}
