//! Middleware for logging requests and responses.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::DetailMessage;

/// The number of bytes of a request or response body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body, in bytes, that is buffered for logging.
///
/// Requests with larger bodies are rejected with 413 Payload Too Large.
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(
                "Request body for {} {} is too large or could not be read: {error}",
                parts.method,
                parts.uri
            );
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(DetailMessage::new("Request body too large")),
            )
                .into_response();
        }
    };
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &body_bytes,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_body(&format!("Sending response: {}", parts.status), &body_bytes);

    Response::from_parts(parts, Body::from(body_bytes))
}

fn log_body(summary: &str, body_bytes: &Bytes) {
    let body = String::from_utf8_lossy(body_bytes);

    match truncate(&body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{summary}\nbody: {truncated}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{summary}\nbody: {body:?}"),
    }
}

/// Cut `text` down to at most `limit` bytes on a character boundary.
///
/// Returns `None` if `text` already fits.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    if text.len() <= limit {
        return None;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    Some(&text[..end])
}
