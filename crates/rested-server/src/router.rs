use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router that hands every request to the dispatcher.
pub fn build_router(state: AppState, gzip: bool) -> Router {
    let router = Router::new()
        .fallback(handler::dispatch_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if gzip {
        router.layer(CompressionLayer::new())
    } else {
        router
    }
}
