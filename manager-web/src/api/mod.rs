//! HTTP handlers for manager-web

pub mod auth;
pub mod goals;
pub mod health;
pub mod spotify;
pub mod tasks;

pub use health::health_routes;
pub use spotify::spotify_routes;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult};

/// `302 Found` redirect
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Numeric path id; anything else is treated as an unknown resource
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{} {} not found", what, raw)))
}
