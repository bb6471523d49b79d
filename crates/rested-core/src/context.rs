//! Per-call context handed to verb handlers.
//!
//! A [`Call`] bundles what a handler may need beyond the resource itself:
//! the request body, the injected dependencies configured at start-up, and
//! the one-shot [`Responder`] used for deferred completion.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::DomainError;
use crate::resource::Verb;
use crate::value::Value;

type Shared = Arc<dyn Any + Send + Sync>;

/// Named dependencies injected into every call.
///
/// Built once when the server starts and shared read-only between requests.
#[derive(Default)]
pub struct Dependencies {
    entries: HashMap<String, Shared>,
}

impl Dependencies {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> DependenciesBuilder {
        DependenciesBuilder::default()
    }

    /// Fetch a dependency by name, if it exists and has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name)?.clone().downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted dependency names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("names", &self.names())
            .finish()
    }
}

enum Pending {
    Ready(Shared),
    Lazy(Box<dyn FnOnce() -> Shared + Send>),
}

/// Collects dependency values and factories before start-up.
#[derive(Default)]
pub struct DependenciesBuilder {
    entries: Vec<(String, Pending)>,
}

impl DependenciesBuilder {
    /// Register a ready-made value.
    pub fn value<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.entries.push((name.into(), Pending::Ready(Arc::new(value))));
        self
    }

    /// Register a factory. It runs exactly once, inside [`build`](Self::build).
    pub fn factory<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T + Send + 'static,
    {
        let lazy = move || Arc::new(factory()) as Shared;
        self.entries.push((name.into(), Pending::Lazy(Box::new(lazy))));
        self
    }

    /// Evaluate all factories. A later registration replaces an earlier one
    /// with the same name.
    pub fn build(self) -> Dependencies {
        let mut entries = HashMap::with_capacity(self.entries.len());
        for (name, pending) in self.entries {
            let value = match pending {
                Pending::Ready(value) => value,
                Pending::Lazy(factory) => {
                    debug!(dependency = %name, "evaluating dependency factory");
                    factory()
                }
            };
            if entries.insert(name.clone(), value).is_some() {
                warn!(dependency = %name, "dependency registered twice; keeping the later value");
            }
        }
        Dependencies { entries }
    }
}

impl fmt::Debug for DependenciesBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("DependenciesBuilder").field("names", &names).finish()
    }
}

/// Result delivered through a [`Responder`].
pub type Completion = Result<(u16, Value), DomainError>;

/// One-shot capability to complete a response out of band.
///
/// Completing consumes the responder, so a handler can answer at most once.
/// Dropping it unfinished is reported to the dispatcher as a server error.
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<Completion>,
}

impl Responder {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Completion>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver a status and payload.
    ///
    /// Returns `false` when nobody is waiting any more, e.g. because the
    /// handler also returned a completed reply and the dispatcher already
    /// answered.
    pub fn finish(self, status: u16, body: impl Into<Value>) -> bool {
        self.tx.send(Ok((status, body.into()))).is_ok()
    }

    /// Deliver a domain error instead of a payload.
    pub fn fail(self, error: DomainError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }
}

/// Marker returned by a handler that took over completion of its response.
///
/// Only [`Call::defer`] can create one.
#[derive(Debug)]
pub struct Deferred {
    _private: (),
}

/// Everything a verb handler receives for one request.
pub struct Call {
    verb: Verb,
    path: String,
    query: Option<String>,
    body: Bytes,
    dependencies: Arc<Dependencies>,
    responder: Responder,
}

impl Call {
    pub(crate) fn new(
        verb: Verb,
        path: String,
        query: Option<String>,
        body: Bytes,
        dependencies: Arc<Dependencies>,
        responder: Responder,
    ) -> Self {
        Self { verb, path, query, body, dependencies, responder }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Path relative to the root, as requested.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn dependency<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.dependencies.get(name)
    }

    /// Like [`dependency`](Self::dependency), but a missing or mistyped
    /// dependency is a server error.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, DomainError> {
        self.dependency(name)
            .ok_or_else(|| DomainError::server(format!("missing dependency: {name}")))
    }

    /// Take over completion of the response.
    ///
    /// The handler must return the [`Deferred`] token as
    /// [`Reply::Deferred`](crate::resource::Reply::Deferred) and later answer
    /// through the [`Responder`], possibly from another task.
    pub fn defer(self) -> (Responder, Deferred) {
        (self.responder, Deferred { _private: () })
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body_len", &self.body.len())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A bare call with no body or dependencies.
    pub(crate) fn call(verb: Verb) -> Call {
        let (responder, _rx) = Responder::channel();
        Call::new(verb, String::new(), None, Bytes::new(), Arc::new(Dependencies::empty()), responder)
    }
}
