use std::any::Any;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use rested_core::{Dependencies, DependenciesBuilder, Dispatcher, Encoder, FallbackEncoder, Value};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Serves a resource tree over HTTP.
pub struct RestedServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl RestedServer {
    /// Start configuring a server for the tree rooted at `root`.
    pub fn builder(root: impl Into<Value>) -> ServerBuilder {
        ServerBuilder {
            root: root.into(),
            config: ServerConfig::default(),
            dependencies: Dependencies::builder(),
            encoder: Encoder::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            dispatcher: self.dispatcher.clone(),
            mount: self.config.mount_path().into(),
            debug: self.config.debug,
            static_files: self.config.static_dir.as_ref().map(ServeDir::new),
        };
        build_router(state, self.config.gzip)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            "Rested server listening on {} (mounted at {}/)",
            self.config.bind_addr,
            self.config.mount_path()
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("Rested server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for RestedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestedServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Collects the root, configuration, dependencies, and encoders.
pub struct ServerBuilder {
    root: Value,
    config: ServerConfig,
    dependencies: DependenciesBuilder,
    encoder: Encoder,
}

impl ServerBuilder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Inject a value into every call under `name`.
    pub fn dependency<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.dependencies = self.dependencies.value(name, value);
        self
    }

    /// Inject the result of `factory`, evaluated once by [`build`](Self::build).
    pub fn lazy_dependency<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T + Send + 'static,
    {
        self.dependencies = self.dependencies.factory(name, factory);
        self
    }

    pub fn fallback_encoder<E: FallbackEncoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = self.encoder.with_fallback(encoder);
        self
    }

    pub fn build(self) -> RestedServer {
        let dependencies = self.dependencies.build();
        tracing::debug!(dependencies = ?dependencies.names(), "dependencies ready");
        let encoder = self.encoder.pretty(self.config.pretty);
        let dispatcher = Dispatcher::new(self.root)
            .with_dependencies(dependencies)
            .with_encoder(encoder);
        RestedServer {
            config: self.config,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::warn!("cannot listen for Ctrl-C, serving until killed: {e}");
            std::future::pending::<()>().await;
        }
    }
}
