//! Spotify integration
//!
//! OAuth authorization-code flow, a session-scoped token cache, a small Web
//! API client and the catalog that maps task categories to music.

pub mod cache;
pub mod catalog;
pub mod client;
pub mod oauth;
pub mod uri;

pub use cache::{SessionTokenCache, TokenCache};
pub use catalog::{MusicSource, SpotifyLink};
pub use client::{Album, ExternalUrls, Page, Playlist, SpotifyClient};
pub use oauth::{SpotifyOAuth, TokenInfo};
pub use uri::{SpotifyUri, UriKind};

use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("manager-web/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid Spotify URI: {0}")]
    InvalidUri(String),

    #[error("Spotify client credentials are not configured")]
    NotConfigured,
}

/// Shared HTTP client settings for both Spotify hosts
pub(crate) fn http_client() -> Result<reqwest::Client, SpotifyError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| SpotifyError::NetworkError(e.to_string()))
}

/// Map a non-success response to the matching error
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let error_text = response.text().await.unwrap_or_default();

    Err(match status.as_u16() {
        401 => SpotifyError::Unauthorized(error_text),
        404 => SpotifyError::NotFound(url),
        429 => SpotifyError::RateLimitExceeded,
        code => SpotifyError::ApiError(code, error_text),
    })
}
