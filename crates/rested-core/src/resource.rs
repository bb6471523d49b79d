use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{Call, Deferred};
use crate::error::DomainError;
use crate::key::Key;
use crate::value::Value;

/// HTTP methods a resource may answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Patch,
        Verb::Options,
        Verb::Head,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Method names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// What a verb handler produced.
///
/// A handler that chose to complete the response itself returns
/// [`Reply::Deferred`], which carries no payload. The [`Deferred`] token can
/// only be obtained from [`Call::defer`], alongside the responder that must
/// deliver the result.
#[derive(Debug)]
pub enum Reply {
    Completed { status: u16, body: Value },
    Deferred(Deferred),
}

impl Reply {
    pub fn ok(body: impl Into<Value>) -> Self {
        Self::with_status(200, body)
    }

    pub fn created(body: impl Into<Value>) -> Self {
        Self::with_status(201, body)
    }

    pub fn with_status(status: u16, body: impl Into<Value>) -> Self {
        Self::Completed { status, body: body.into() }
    }
}

pub type HandlerResult = Result<Reply, DomainError>;

/// An addressable node in the resource tree.
///
/// Every verb has a default: `get` reads the payload through unchanged and
/// all other verbs answer [`DomainError::NotImplemented`]. Implementors
/// override the verbs they support.
///
/// Handlers run concurrently against a shared tree. A resource that mutates
/// state is responsible for its own synchronization.
#[async_trait]
pub trait Resource: Send + Sync + fmt::Debug {
    /// The raw payload wrapped by this node.
    fn payload(&self) -> &Value;

    /// Child lookup used while resolving a path.
    ///
    /// Only values that are themselves nodes are routable. Raw values, absent
    /// keys, and non-container payloads all yield `None`.
    fn subscript(&self, key: &Key) -> Option<&Arc<dyn Resource>> {
        self.payload().get(key).and_then(Value::as_node)
    }

    async fn get(&self, _call: Call) -> HandlerResult {
        Ok(Reply::ok(self.payload().clone()))
    }

    async fn post(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    async fn put(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    async fn delete(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    async fn patch(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    async fn options(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    async fn head(&self, _call: Call) -> HandlerResult {
        Err(DomainError::NotImplemented)
    }

    /// Route a call to the handler for `verb`.
    async fn handle(&self, verb: Verb, call: Call) -> HandlerResult {
        match verb {
            Verb::Get => self.get(call).await,
            Verb::Post => self.post(call).await,
            Verb::Put => self.put(call).await,
            Verb::Delete => self.delete(call).await,
            Verb::Patch => self.patch(call).await,
            Verb::Options => self.options(call).await,
            Verb::Head => self.head(call).await,
        }
    }
}

/// A resource with nothing but the default handlers.
#[derive(Debug, Default)]
pub struct BasicResource {
    payload: Value,
}

impl BasicResource {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self { payload: payload.into() }
    }
}

impl Resource for BasicResource {
    fn payload(&self) -> &Value {
        &self.payload
    }
}
