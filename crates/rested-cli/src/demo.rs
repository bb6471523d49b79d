//! The demonstration tree served by `rested serve`.
//!
//! ```text
//! /users          static user records keyed by integer id
//! /users/{id}
//! /notes          in-memory note store, injected as a dependency
//! /admin          always refuses access
//! /version        raw leaf, readable but not a resource
//! ```

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use rested_core::{
    async_trait, BasicResource, Call, DomainError, HandlerResult, Key, Reply, Resource, TimestampEncoder,
    UuidEncoder, Value,
};
use rested_server::{RestedServer, ServerBuilder, ServerConfig};

/// Dependency name of the [`NoteStore`].
pub const NOTE_STORE: &str = "notes";

#[derive(Clone, Debug)]
struct Note {
    uid: Uuid,
    text: String,
    created: DateTime<Utc>,
}

impl Note {
    fn to_value(&self) -> Value {
        Value::map([
            ("uid", Value::opaque(self.uid)),
            ("text", Value::from(self.text.as_str())),
            ("created", Value::opaque(self.created)),
        ])
    }
}

#[derive(Debug, Default)]
struct NoteState {
    next_id: i64,
    notes: BTreeMap<i64, Note>,
}

/// Notes held in memory, shared by every request.
#[derive(Debug, Default)]
pub struct NoteStore {
    state: RwLock<NoteState>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with a welcome note, as created at server start.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.insert("Welcome to Rested");
        store
    }

    /// Add a note and return its id.
    pub fn insert(&self, text: impl Into<String>) -> i64 {
        let mut state = self.state.write().expect("note store lock poisoned");
        state.next_id += 1;
        let id = state.next_id;
        let note = Note { uid: Uuid::now_v7(), text: text.into(), created: Utc::now() };
        state.notes.insert(id, note);
        id
    }

    /// Remove every note, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.state.write().expect("note store lock poisoned");
        let removed = state.notes.len();
        state.notes.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.state.read().expect("note store lock poisoned").notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Value {
        let state = self.state.read().expect("note store lock poisoned");
        Value::map(state.notes.iter().map(|(id, note)| (Key::Int(*id), note.to_value())))
    }
}

/// Collection resource backed by the injected [`NoteStore`].
#[derive(Debug)]
struct Notes;

#[derive(Deserialize)]
struct NewNote {
    text: String,
}

#[async_trait]
impl Resource for Notes {
    fn payload(&self) -> &Value {
        Value::null_ref()
    }

    /// Answers from a spawned task, the way a callback-driven store would.
    async fn get(&self, call: Call) -> HandlerResult {
        let store = call.require::<NoteStore>(NOTE_STORE)?;
        let (responder, deferred) = call.defer();
        tokio::spawn(async move {
            if !responder.finish(200, store.snapshot()) {
                tracing::warn!("note listing finished after the request was gone");
            }
        });
        Ok(Reply::Deferred(deferred))
    }

    async fn post(&self, call: Call) -> HandlerResult {
        let store = call.require::<NoteStore>(NOTE_STORE)?;
        let new: NewNote = call
            .json()
            .map_err(|e| DomainError::server(format!("invalid note: {e}")))?;
        let id = store.insert(new.text);
        tracing::info!(id, "note created");
        Ok(Reply::created(Value::map([("id", id)])))
    }

    async fn delete(&self, call: Call) -> HandlerResult {
        let store = call.require::<NoteStore>(NOTE_STORE)?;
        if store.is_empty() {
            tracing::debug!("note store already empty");
        }
        let removed = store.clear();
        Ok(Reply::ok(Value::map([("removed", removed as u64)])))
    }
}

/// Stands in for anything behind an access check.
#[derive(Debug)]
struct Admin;

#[async_trait]
impl Resource for Admin {
    fn payload(&self) -> &Value {
        Value::null_ref()
    }

    async fn get(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotAuthorized)
    }
}

fn users() -> Value {
    let user = |id: i64| {
        Value::node(BasicResource::new(Value::map([
            ("name", Value::from(format!("User {id}"))),
            ("email", Value::from(format!("user{id}@example.com"))),
        ])))
    };
    Value::node(BasicResource::new(Value::map([(1, user(1)), (2, user(2))])))
}

/// Root of the demonstration tree.
pub fn tree() -> Value {
    Value::map([
        ("users", users()),
        ("notes", Value::node(Notes)),
        ("admin", Value::node(Admin)),
        ("version", Value::from(env!("CARGO_PKG_VERSION"))),
    ])
}

/// Server builder wired with the demo tree, its store, and encoders for the
/// store's id and timestamp types.
pub fn server_builder(config: ServerConfig) -> ServerBuilder {
    RestedServer::builder(tree())
        .config(config)
        .lazy_dependency(NOTE_STORE, NoteStore::seeded)
        .fallback_encoder(UuidEncoder)
        .fallback_encoder(TimestampEncoder)
}

#[cfg(test)]
mod tests {
    use rested_core::{Dispatcher, Request, Response};
    use serde_json::json;

    use super::*;

    fn dispatcher() -> std::sync::Arc<Dispatcher> {
        let config = ServerConfig { pretty: false, ..ServerConfig::default() };
        server_builder(config).build().dispatcher().clone()
    }

    fn json(response: &Response) -> serde_json::Value {
        serde_json::from_slice(response.body.as_deref().expect("body")).unwrap()
    }

    #[tokio::test]
    async fn users_are_readable() {
        let d = dispatcher();
        let response = d.dispatch(Request::new("GET", "users/2")).await;
        assert_eq!(response.status, 200);
        assert_eq!(json(&response), json!({"name": "User 2", "email": "user2@example.com"}));

        assert_eq!(d.dispatch(Request::new("GET", "users/3")).await.status, 404);
        assert_eq!(d.dispatch(Request::new("PUT", "users/1")).await.status, 501);
    }

    #[tokio::test]
    async fn notes_lifecycle() {
        let d = dispatcher();

        let listing = d.dispatch(Request::new("GET", "notes")).await;
        assert_eq!(listing.status, 200);
        let notes = json(&listing);
        assert_eq!(notes["1"]["text"], "Welcome to Rested");
        assert!(notes["1"]["uid"].is_string());
        assert!(notes["1"]["created"].as_str().unwrap().ends_with('Z'));

        let created = d
            .dispatch(Request::new("POST", "notes").with_body(r#"{"text":"second"}"#))
            .await;
        assert_eq!(created.status, 201);
        assert_eq!(json(&created), json!({"id": 2}));

        let cleared = d.dispatch(Request::new("DELETE", "notes")).await;
        assert_eq!(json(&cleared), json!({"removed": 2}));

        let listing = d.dispatch(Request::new("GET", "notes")).await;
        assert_eq!(json(&listing), json!({}));

        let cleared = d.dispatch(Request::new("DELETE", "notes")).await;
        assert_eq!(cleared.status, 200);
        assert_eq!(json(&cleared), json!({"removed": 0}));
    }

    #[tokio::test]
    async fn invalid_note_is_rejected() {
        let d = dispatcher();
        let response = d.dispatch(Request::new("POST", "notes").with_body("nope")).await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn admin_is_forbidden() {
        let d = dispatcher();
        assert_eq!(d.dispatch(Request::new("GET", "admin")).await.status, 403);
    }

    #[tokio::test]
    async fn version_is_a_raw_leaf() {
        let d = dispatcher();
        let response = d.dispatch(Request::new("GET", "version")).await;
        assert_eq!(json(&response), json!(env!("CARGO_PKG_VERSION")));
        assert_eq!(d.dispatch(Request::new("DELETE", "version")).await.status, 404);
    }

    #[test]
    fn store_counts() {
        let store = NoteStore::seeded();
        assert_eq!(store.len(), 1);
        assert_eq!(store.insert("x"), 2);
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }
}
