use std::borrow::Cow;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use rested_core::Dispatcher;

/// Shared state for the dispatch handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Normalized mount path, e.g. `/api`, or empty for the site root.
    pub mount: Arc<str>,
    pub debug: bool,
    /// Static files answered for paths outside the mount.
    pub static_files: Option<ServeDir>,
}

/// Map a request path onto a tree path, if it lies under `mount`.
///
/// `/api` and `/api/` both address the root; `/apix` is outside the mount.
pub fn tree_path<'a>(mount: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Percent-decode a tree path. An escaped `%2F` becomes a separator, and
/// invalid UTF-8 is replaced rather than rejected.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

/// Catch-all handler: every method on every path ends up here.
pub async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(path) = tree_path(&state.mount, uri.path()).map(|p| decode_path(p).into_owned()) else {
        if let Some(files) = &state.static_files {
            return serve_static(files.clone(), method, uri, headers).await;
        }
        return json_response(&state, rested_core::Response {
            status: 404,
            body: None,
            reason: Some(format!("{} is outside {}", uri.path(), display_mount(&state.mount))),
        });
    };

    let request = rested_core::Request {
        method: method.as_str().to_string(),
        path,
        query: uri.query().map(str::to_string),
        body,
    };
    let response = state.dispatcher.dispatch(request).await;
    json_response(&state, response)
}

async fn serve_static(files: ServeDir, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let mut request = axum::http::Request::new(Body::empty());
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    match files.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn display_mount(mount: &str) -> &str {
    if mount.is_empty() { "/" } else { mount }
}

/// Write a dispatcher response as an HTTP response.
///
/// Error statuses have an empty body unless debug mode is on.
fn json_response(state: &AppState, response: rested_core::Response) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        tracing::error!(status = response.status, "handler returned an invalid status code");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let body = match response.body {
        Some(bytes) => Body::from(bytes),
        None if state.debug => Body::from(
            json!({
                "status": status.as_u16(),
                "error": response.reason.unwrap_or_else(|| status.to_string()),
            })
            .to_string(),
        ),
        None => Body::empty(),
    };

    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}
