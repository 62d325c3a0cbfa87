//! Server-side sessions
//!
//! The `manager_session` cookie carries an opaque id; the payload lives in the
//! `sessions` table. `session_middleware` loads the session before the
//! handler runs and persists it afterwards when it was modified.
//! `spawn_session_pruner` deletes rows that have not been saved for longer
//! than the configured session lifetime.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use manager_common::db::sessions;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::api::found;
use crate::error::AppError;
use crate::services::spotify::TokenInfo;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "manager_session";

/// Persisted session payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<String>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    /// No row or cookie exists yet
    is_new: bool,
    modified: bool,
    /// Stored id replaced by `clear`, deleted after the request
    retired_id: Option<String>,
    data: SessionData,
}

/// Per-request session handle
///
/// Cloning shares the same underlying session; the middleware keeps one clone
/// to persist whatever the handler changed.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

/// 32 random bytes, hex encoded
pub fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Session {
    fn from_inner(inner: SessionInner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Fresh, empty session with a new id
    pub fn new() -> Self {
        Self::from_inner(SessionInner {
            id: sessions::generate_session_id(),
            is_new: true,
            modified: false,
            retired_id: None,
            data: SessionData::default(),
        })
    }

    /// Session restored from the store
    pub fn existing(id: String, data: SessionData) -> Self {
        Self::from_inner(SessionInner {
            id,
            is_new: false,
            modified: false,
            retired_id: None,
            data,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // A panicking handler cannot leave the payload half-written
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let mut inner = self.lock();
        inner.modified = true;
        f(&mut inner.data)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn is_new(&self) -> bool {
        self.lock().is_new
    }

    pub fn is_modified(&self) -> bool {
        self.lock().modified
    }

    /// Snapshot of the payload
    pub fn data(&self) -> SessionData {
        self.lock().data.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.lock().data.username.clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        self.update(|data| data.username = Some(username));
    }

    pub fn remove_username(&self) {
        self.update(|data| data.username = None);
    }

    /// Move the session to a fresh id, keeping its payload
    ///
    /// The stored row under the old id is deleted once the request finishes.
    pub fn rotate_id(&self) {
        let mut inner = self.lock();
        let old_id = std::mem::replace(&mut inner.id, sessions::generate_session_id());
        if !inner.is_new {
            inner.retired_id = Some(old_id);
        }
        inner.is_new = true;
        inner.modified = true;
    }

    /// Drop everything stored in the session and move it to a fresh id
    pub fn clear(&self) {
        self.rotate_id();
        self.lock().data = SessionData::default();
    }

    fn take_retired_id(&self) -> Option<String> {
        self.lock().retired_id.take()
    }

    pub fn flash(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|data| data.flashes.push(message));
    }

    /// Remove and return pending flash messages
    pub fn take_flashes(&self) -> Vec<String> {
        let mut inner = self.lock();
        if inner.data.flashes.is_empty() {
            return Vec::new();
        }
        inner.modified = true;
        std::mem::take(&mut inner.data.flashes)
    }

    /// CSRF token for this session, created on first use
    pub fn csrf_token(&self) -> String {
        let mut inner = self.lock();
        if let Some(token) = &inner.data.csrf_token {
            return token.clone();
        }
        let token = random_token();
        inner.data.csrf_token = Some(token.clone());
        inner.modified = true;
        token
    }

    /// CSRF token without creating one
    pub fn existing_csrf_token(&self) -> Option<String> {
        self.lock().data.csrf_token.clone()
    }

    pub fn token_info(&self) -> Option<TokenInfo> {
        self.lock().data.token_info.clone()
    }

    pub fn set_token_info(&self, token: TokenInfo) {
        self.update(|data| data.token_info = Some(token));
    }

    /// Start an OAuth round trip and return its state value
    pub fn begin_oauth(&self) -> String {
        let state = random_token();
        let stored = state.clone();
        self.update(|data| data.oauth_state = Some(stored));
        state
    }

    /// Consume the pending OAuth state; true when it matches `returned`
    pub fn finish_oauth(&self, returned: &str) -> bool {
        self.update(|data| data.oauth_state.take())
            .is_some_and(|expected| expected == returned)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session id from the request's `Cookie` headers
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value).filter_map(Result::ok))
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| !id.is_empty())
}

fn session_cookie(id: &str, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
        .to_string()
}

fn expired_session_cookie(secure: bool) -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie.to_string()
}

fn append_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Invalid session cookie header: {}", e),
    }
}

/// Load the session, run the handler, persist changes
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session = match session_id_from_headers(request.headers()) {
        Some(id) => match sessions::load_session::<SessionData>(&state.db, &id).await {
            Ok(Some(data)) => Session::existing(id, data),
            Ok(None) => {
                debug!("Unknown session id presented, starting a new session");
                Session::new()
            }
            Err(e) => {
                warn!("Failed to load session, starting a new one: {}", e);
                Session::new()
            }
        },
        None => Session::new(),
    };

    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;
    let secure = state.config.session_cookie_secure;

    let retired = session.take_retired_id();
    if let Some(old_id) = &retired {
        match sessions::delete_session(&state.db, old_id).await {
            Ok(()) => debug!("Session cleared and its stored row deleted"),
            Err(e) => error!("Failed to delete cleared session: {}", e),
        }
    }

    if session.is_modified() {
        let data = session.data();
        if session.is_new() && data == SessionData::default() {
            // Nothing worth storing; tell the browser to forget a cleared id
            if retired.is_some() {
                append_cookie(&mut response, &expired_session_cookie(secure));
            }
            return response;
        }

        let id = session.id();
        match sessions::save_session(&state.db, &id, &data).await {
            Ok(()) => {
                if session.is_new() {
                    append_cookie(&mut response, &session_cookie(&id, secure));
                }
            }
            Err(e) => error!("Failed to save session: {}", e),
        }
    }

    response
}

/// Delete stale sessions now and then every `interval`
pub fn spawn_session_pruner(
    pool: SqlitePool,
    max_age: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            // First tick completes immediately
            ticker.tick().await;
            if let Err(e) = sessions::delete_expired_sessions(&pool, max_age).await {
                warn!("Failed to prune expired sessions: {}", e);
            }
        }
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

/// Logged-in user; anonymous requests are redirected to the login page
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
    pub session: Session,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match session.username() {
            Some(username) => Ok(CurrentUser { username, session }),
            None => {
                debug!(path = %parts.uri.path(), "Anonymous request redirected to login");
                Err(found("/"))
            }
        }
    }
}
