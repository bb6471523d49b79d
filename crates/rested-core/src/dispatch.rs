use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::context::{Call, Completion, Dependencies, Responder};
use crate::encode::Encoder;
use crate::error::DomainError;
use crate::resolve::{resolve, Target};
use crate::resource::{Reply, Verb};
use crate::value::Value;

/// An inbound request, already extracted from the transport.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Method name as received; matched case-insensitively.
    pub method: String,
    /// Path relative to the root, without a leading slash.
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: None,
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// How a call ended, before serialization.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Completed(u16, Value),
    /// The handler owns completion; the result arrives through its responder.
    DeferredToHandler,
    Failed(DomainError),
}

impl Outcome {
    fn settle(completion: Result<Completion, oneshot::error::RecvError>) -> Self {
        match completion {
            Ok(Ok((status, body))) => Self::Completed(status, body),
            Ok(Err(err)) => Self::Failed(err),
            Err(_) => {
                error!("deferred handler dropped its responder without completing");
                Self::Failed(DomainError::server("response was never completed"))
            }
        }
    }
}

/// Pending result of a deferred handler.
#[derive(Debug)]
pub struct PendingCompletion {
    rx: Option<oneshot::Receiver<Completion>>,
}

impl PendingCompletion {
    fn none() -> Self {
        Self { rx: None }
    }

    /// Wait for the handler to complete through its responder.
    pub async fn wait(self) -> Outcome {
        match self.rx {
            Some(rx) => Outcome::settle(rx.await),
            None => Outcome::Failed(DomainError::server("no deferred completion pending")),
        }
    }
}

/// Result of [`Dispatcher::invoke`].
#[derive(Debug)]
pub struct Invocation {
    pub outcome: Outcome,
    /// Only meaningful when `outcome` is [`Outcome::DeferredToHandler`].
    pub completion: PendingCompletion,
}

/// A serialized response ready for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// JSON body; `None` for error statuses.
    pub body: Option<Vec<u8>>,
    /// Why the request failed, for diagnostics.
    pub reason: Option<String>,
}

impl Response {
    fn failure(status: u16, reason: impl Into<String>) -> Self {
        Self { status, body: None, reason: Some(reason.into()) }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Resolves requests against a resource tree and runs verb handlers.
///
/// Stateless per call: everything that persists lives in the tree.
#[derive(Debug)]
pub struct Dispatcher {
    root: Value,
    dependencies: Arc<Dependencies>,
    encoder: Encoder,
}

impl Dispatcher {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            root: root.into(),
            dependencies: Arc::new(Dependencies::empty()),
            encoder: Encoder::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = Arc::new(dependencies);
        self
    }

    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolve the target and run its handler, without serializing.
    pub async fn invoke(&self, request: Request) -> Invocation {
        let target = match resolve(&self.root, &request.path) {
            Ok(target) => target,
            Err(err) => return Self::settled(Outcome::Failed(err)),
        };
        let verb = request.method.parse::<Verb>();

        let node = match target {
            Target::Value(value) => {
                // Raw leaves have no handlers; they can only be read.
                let outcome = match verb {
                    Ok(Verb::Get) => Outcome::Completed(200, value.clone()),
                    _ => Outcome::Failed(DomainError::NotFound),
                };
                return Self::settled(outcome);
            }
            Target::Node(node) => node,
        };

        let verb = match verb {
            Ok(verb) => verb,
            Err(err) => {
                debug!(%err, "no handler for method");
                return Self::settled(Outcome::Failed(DomainError::NotImplemented));
            }
        };

        let (responder, rx) = Responder::channel();
        let call = Call::new(
            verb,
            request.path,
            request.query,
            request.body,
            self.dependencies.clone(),
            responder,
        );

        match node.handle(verb, call).await {
            Ok(Reply::Completed { status, body }) => Self::settled(Outcome::Completed(status, body)),
            Ok(Reply::Deferred(_)) => Invocation {
                outcome: Outcome::DeferredToHandler,
                completion: PendingCompletion { rx: Some(rx) },
            },
            Err(err) => Self::settled(Outcome::Failed(err)),
        }
    }

    /// Run a request to completion and serialize the result.
    ///
    /// Exactly one response is produced: either from the handler's return
    /// value or from its responder, never both.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method.clone();
        let path = request.path.clone();

        let Invocation { outcome, completion } = self.invoke(request).await;
        let outcome = match outcome {
            Outcome::DeferredToHandler => completion.wait().await,
            settled => settled,
        };

        let response = self.render(outcome);
        debug!(%method, %path, status = response.status, "dispatched request");
        response
    }

    /// Serialize a settled outcome.
    pub fn render(&self, outcome: Outcome) -> Response {
        match outcome {
            Outcome::Completed(status, body) => match self.encoder.to_vec(&body) {
                Ok(bytes) => Response { status, body: Some(bytes), reason: None },
                Err(err) => {
                    error!(%err, "failed to serialize response payload");
                    Response::failure(500, err.to_string())
                }
            },
            Outcome::Failed(err) => Response::failure(err.status(), err.to_string()),
            Outcome::DeferredToHandler => {
                error!("attempted to render a deferred outcome before it settled");
                Response::failure(500, "response was never completed")
            }
        }
    }

    fn settled(outcome: Outcome) -> Invocation {
        Invocation { outcome, completion: PendingCompletion::none() }
    }
}
