// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, Level};

use crate::common::helpers::truncate_chars;

/// Bodies above this are passed through without being buffered
const MAX_LOGGED_BODY_BYTES: usize = 1024 * 1024;
const MAX_LOGGED_CHARS: usize = 4000;

fn data_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"data:([a-zA-Z0-9.+/-]+);base64,[A-Za-z0-9+/=]+").ok())
        .as_ref()
}

/// Replaces inline base64 payloads with their mime type and length.
pub fn redact_body(body: &str) -> String {
    let Some(pattern) = data_url_pattern() else {
        return truncate_chars(body, MAX_LOGGED_CHARS);
    };
    let redacted = pattern.replace_all(body, |caps: &regex::Captures| {
        format!("data:{};base64,<{} chars>", &caps[1], caps[0].len())
    });
    truncate_chars(&redacted, MAX_LOGGED_CHARS)
}

/// Only small textual bodies are worth buffering. Requests without a
/// declared length are streamed through untouched.
fn is_loggable(headers: &HeaderMap, length_required: bool) -> bool {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !(content_type.starts_with("application/json") || content_type.starts_with("text/")) {
        return false;
    }
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .map(|len| len <= MAX_LOGGED_BODY_BYTES)
        .unwrap_or(!length_required)
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let request = if is_loggable(request.headers(), true) {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
            .await
            .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

        if !bytes.is_empty() {
            debug!(
                method = %parts.method,
                uri = %parts.uri,
                request_body = %redact_body(&String::from_utf8_lossy(&bytes)),
                "📥 Request"
            );
        }
        Request::from_parts(parts, Body::from(bytes))
    } else {
        debug!(method = %request.method(), uri = %request.uri(), "📥 Request (body not logged)");
        request
    };

    let response = next.run(request).await;
    if !is_loggable(response.headers(), false) {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            status = %parts.status,
            response_body = %redact_body(&String::from_utf8_lossy(&bytes)),
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
