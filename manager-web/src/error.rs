//! Error types for manager-web
//!
//! Handlers return `AppResult`; the error becomes a small HTML page with the
//! matching status code.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::services::spotify::SpotifyError;

/// Request error
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Resource belongs to someone else (403)
    #[error("{0}")]
    Forbidden(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// CSRF validation failed (400)
    #[error("{0}")]
    Csrf(String),

    /// Spotify unreachable or returned an error (502)
    #[error("Spotify error: {0}")]
    Spotify(#[from] SpotifyError),

    /// Template rendering failure (500)
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// manager-common error (500)
    #[error("{0}")]
    Common(#[from] manager_common::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Csrf(_) => StatusCode::BAD_REQUEST,
            AppError::Spotify(_) => StatusCode::BAD_GATEWAY,
            AppError::Template(_) | AppError::Common(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the user; server-side details stay in the log
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Csrf(msg) => msg.clone(),
            AppError::Spotify(_) => "Cannot reach Spotify, please refresh the page and try again.".to_string(),
            _ => "Something went wrong, please try again.".to_string(),
        }
    }
}

/// Minimal standalone error page (no template engine involved)
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{code} {title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>{message}</p>\n</body>\n</html>\n",
        code = status.as_u16(),
        title = title,
        message = tera::escape_html(message),
    );
    (status, Html(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        error_page(status, &self.public_message())
    }
}

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;
