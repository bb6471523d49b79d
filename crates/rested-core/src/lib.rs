//! Resource-tree routing core for Rested.
//!
//! An application is a tree of resources rooted at a single [`Value`]. A
//! request path is walked segment by segment to find the addressed node, the
//! handler for the request's method runs on it, and the result is encoded as
//! JSON. Domain errors become HTTP statuses at the dispatch boundary.
//!
//! # Key Types
//!
//! - [`Value`] -- the opaque payload: scalars, lists, key-ordered maps, and
//!   embedded child resources
//! - [`Resource`] -- a node with per-verb handlers and a subscript relation
//! - [`resolve`] -- path-to-target resolution
//! - [`Dispatcher`] -- resolution, handler invocation, and serialization
//! - [`Encoder`] -- JSON encoding with pluggable fallbacks for domain types
//!
//! # Status Mapping
//!
//! | Condition | Status |
//! |---|---|
//! | Path resolves to nothing | 404 |
//! | Resource lacks a handler for the method | 501 |
//! | Handler signals not-authorized | 403 |
//! | Handler signals not-found | 404 |
//! | Handler signals a server error | 500 |
//!
//! # Example
//!
//! ```
//! use rested_core::{BasicResource, Dispatcher, Key, Request, Value};
//!
//! let user = |name: &str| Value::node(BasicResource::new(Value::map([("name", name)])));
//! let users = Value::node(BasicResource::new(Value::map([
//!     (Key::from(1), user("User 1")),
//!     (Key::from(2), user("User 2")),
//! ])));
//! let dispatcher = Dispatcher::new(Value::node(BasicResource::new(Value::map([("users", users)]))));
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let response = dispatcher.dispatch(Request::new("GET", "users/1")).await;
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body.as_deref(), Some(&br#"{"name":"User 1"}"#[..]));
//! # });
//! ```

pub mod context;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod key;
pub mod resolve;
pub mod resource;
pub mod value;

pub use context::{Call, Completion, Deferred, Dependencies, DependenciesBuilder, Responder};
pub use dispatch::{Dispatcher, Invocation, Outcome, PendingCompletion, Request, Response};
pub use encode::{Encoder, FallbackEncoder, TimestampEncoder, UuidEncoder};
pub use error::{DomainError, DomainResult, SerializationError};
pub use key::Key;
pub use resolve::{resolve, Target};
pub use resource::{BasicResource, HandlerResult, Reply, Resource, UnknownVerb, Verb};
pub use value::{OpaqueValue, Value};

/// Re-exported so implementors can annotate `impl Resource` blocks.
pub use async_trait::async_trait;
