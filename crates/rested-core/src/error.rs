use thiserror::Error;

/// Routine routing and handler outcomes that map onto an HTTP status.
///
/// The resolver never distinguishes "indexed something that is not a
/// container" from "key missing from a container": both are [`NotFound`].
///
/// [`NotFound`]: DomainError::NotFound
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("resource not found")]
    NotFound,

    #[error("not authorized for resource")]
    NotAuthorized,

    #[error("server error: {0}")]
    ServerError(String),

    #[error("method not implemented")]
    NotImplemented,
}

impl DomainError {
    /// Convenience constructor for handler failures.
    pub fn server(reason: impl Into<String>) -> Self {
        Self::ServerError(reason.into())
    }

    /// HTTP status code this outcome maps to.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::NotAuthorized => 403,
            Self::ServerError(_) => 500,
            Self::NotImplemented => 501,
        }
    }
}

/// A payload could not be rendered as JSON.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SerializationError {
    /// No fallback encoder accepted an opaque value.
    #[error("cannot encode value of type {type_name} as JSON")]
    Unsupported { type_name: String },

    #[error("failed to write JSON: {0}")]
    Write(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
