//! Spotify OAuth authorization-code flow
//!
//! The user is sent to the accounts host to grant access, comes back to
//! `/callback` with a code, and the code is exchanged for an access/refresh
//! token pair. Tokens are refreshed transparently by `validate_token`.

use chrono::Utc;
use manager_common::config::SpotifySettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};
use url::Url;

use super::{check_status, http_client, SpotifyError, TokenCache};

/// Tokens with less than this many seconds left are treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access/refresh token pair as stored in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: String,
    /// Unix timestamp, stamped locally when the token is received
    #[serde(default)]
    pub expires_at: i64,
}

impl TokenInfo {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.saturating_sub(now) < EXPIRY_MARGIN_SECS
    }

    /// Every `required` scope was granted
    pub fn covers_scopes<S: AsRef<str>>(&self, required: &[S]) -> bool {
        let granted: HashSet<&str> = self.scope.split_whitespace().collect();
        required.iter().all(|scope| granted.contains(scope.as_ref()))
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TokenResponse {
    fn into_token_info(self, now: i64) -> TokenInfo {
        TokenInfo {
            expires_at: now.saturating_add(self.expires_in),
            access_token: self.access_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
            scope: self.scope.unwrap_or_default(),
        }
    }
}

/// OAuth client for the Spotify accounts host
#[derive(Clone)]
pub struct SpotifyOAuth {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    show_dialog: bool,
    accounts_base_url: String,
}

impl fmt::Debug for SpotifyOAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyOAuth")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("show_dialog", &self.show_dialog)
            .field("accounts_base_url", &self.accounts_base_url)
            .finish_non_exhaustive()
    }
}

impl SpotifyOAuth {
    /// Build from settings; both credentials must be present
    pub fn new(settings: &SpotifySettings) -> Result<Self, SpotifyError> {
        let credential = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(SpotifyError::NotConfigured)
        };

        Ok(Self {
            http_client: http_client()?,
            client_id: credential(&settings.client_id)?,
            client_secret: credential(&settings.client_secret)?,
            redirect_uri: settings.redirect_uri.clone(),
            scopes: settings.scopes.clone(),
            show_dialog: settings.show_dialog,
            accounts_base_url: settings.accounts_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Requested scopes, space-joined
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    /// URL of the consent page
    pub fn authorize_url(&self, state: &str) -> Result<String, SpotifyError> {
        let scope = self.scope();
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_base_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
                ("show_dialog", if self.show_dialog { "true" } else { "false" }),
            ],
        )
        .map_err(|e| SpotifyError::InvalidUri(format!("Accounts URL: {}", e)))?;

        Ok(url.into())
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_base_url)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenInfo, SpotifyError> {
        let response = self
            .http_client
            .post(self.token_url())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let body: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

        Ok(body.into_token_info(Utc::now().timestamp()))
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, SpotifyError> {
        debug!("Exchanging Spotify authorization code");

        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;

        info!(scope = %token.scope, "Obtained Spotify access token");
        Ok(token)
    }

    /// Refresh an access token
    ///
    /// Spotify may omit `refresh_token` (and `scope`) from the response, in
    /// which case the previous values stay valid.
    pub async fn refresh_access_token(&self, previous: &TokenInfo) -> Result<TokenInfo, SpotifyError> {
        let refresh_token = previous
            .refresh_token
            .as_deref()
            .ok_or_else(|| SpotifyError::Unauthorized("No refresh token available".to_string()))?;

        debug!("Refreshing Spotify access token");

        let mut token = self
            .request_token(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await?;

        if token.refresh_token.is_none() {
            token.refresh_token = previous.refresh_token.clone();
        }
        if token.scope.is_empty() {
            token.scope = previous.scope.clone();
        }

        Ok(token)
    }

    /// Usable token from the cache, refreshing it when expired
    ///
    /// `None` when nothing is cached or the cached token lacks a requested
    /// scope; the caller then starts a new authorization.
    pub async fn validate_token<C: TokenCache + ?Sized>(&self, cache: &C) -> Result<Option<TokenInfo>, SpotifyError> {
        let Some(token) = cache.get_cached_token() else {
            return Ok(None);
        };

        if !token.covers_scopes(&self.scopes) {
            debug!(granted = %token.scope, "Cached token lacks requested scopes");
            return Ok(None);
        }

        if !token.is_expired() {
            return Ok(Some(token));
        }

        let refreshed = self.refresh_access_token(&token).await?;
        cache.save_token_to_cache(&refreshed);
        Ok(Some(refreshed))
    }
}
