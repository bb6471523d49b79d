//! HTTP transport for Rested.
//!
//! Mounts a resource tree under a URL prefix and serves it with axum: every
//! method on every path below the prefix is handed to the
//! [`Dispatcher`](rested_core::Dispatcher), and its result is written back as
//! `application/json`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::{RestedServer, ServerBuilder};
