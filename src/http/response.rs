//! Response generation for declared endpoints.
//!
//! # Responsibilities
//! - Execute a matched declaration: delay, headers, status, body
//! - Produce the fixed not-found response
//!
//! # Design Decisions
//! - Delays sleep inside the request task and hold no shared lock
//! - Declared headers are applied before the JSON content-type default
//! - Raw string bodies are written byte-for-byte; structured bodies are
//!   re-encoded as JSON
//! - Execution never fails; malformed pieces were rejected at load time and
//!   are skipped with a warning if they slip through

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::schema::EndpointDeclaration;

/// Content type applied when a declaration does not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Produce the canned response of a declaration.
pub async fn execute(endpoint: &EndpointDeclaration) -> Response {
    if let Some(delay) = endpoint.delay() {
        tokio::time::sleep(delay).await;
    }

    let body = match endpoint.response.render() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %endpoint.path, error = %e, "Failed to encode response body");
            Vec::new()
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = endpoint.status();

    let headers = response.headers_mut();
    for (name, value) in &endpoint.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(path = %endpoint.path, header = %name, "Skipping invalid header"),
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    response
}

/// 404 for requests no route answers.
pub fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found", "path": path })),
    )
        .into_response()
}

/// JSON error body with the given status.
pub fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
