//! CSRF protection for form posts
//!
//! Every POST must echo the session's token, either in the `X-CSRFToken`
//! header or in the `csrf_token` form field. Runs inside the session layer.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::warn;

use crate::error::AppError;
use crate::session::Session;
use crate::AppState;

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const CSRF_FIELD: &str = "csrf_token";

/// Largest form body buffered for token extraction
const MAX_FORM_BYTES: usize = 1024 * 1024;

pub const MISSING_TOKEN: &str = "The CSRF token is missing.";
pub const TOKEN_MISMATCH: &str = "The CSRF tokens do not match.";

fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn is_form(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Reject POSTs without a matching token
pub async fn csrf_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.config.csrf_enabled || request.method() != Method::POST {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return AppError::Internal("CSRF check requires the session layer".to_string()).into_response();
    };

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (request, provided) = match header_token {
        Some(token) => (request, Some(token)),
        None if is_form(&request) => {
            let (parts, body) = request.into_parts();
            let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
                Ok(bytes) => bytes,
                Err(e) => return AppError::BadRequest(format!("Failed to read body: {}", e)).into_response(),
            };
            let token = serde_urlencoded::from_bytes::<HashMap<String, String>>(&bytes)
                .ok()
                .and_then(|mut fields| fields.remove(CSRF_FIELD));
            (Request::from_parts(parts, Body::from(bytes)), token)
        }
        None => (request, None),
    };

    let Some(provided) = provided.filter(|t| !t.is_empty()) else {
        warn!(path = %request.uri().path(), "Rejected POST without CSRF token");
        return AppError::Csrf(MISSING_TOKEN.to_string()).into_response();
    };

    match session.existing_csrf_token() {
        Some(expected) if tokens_match(&expected, &provided) => next.run(request).await,
        _ => {
            warn!(path = %request.uri().path(), "Rejected POST with mismatched CSRF token");
            AppError::Csrf(TOKEN_MISMATCH.to_string()).into_response()
        }
    }
}
