//! Spotify pages
//!
//! `/spotify` starts (or skips) the authorization round trip, `/callback`
//! completes it, and `/home_page/*` lists music for a task category. Each
//! page checks the session's token first and sends the browser back to the
//! consent page when there is no usable token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use manager_common::models::TaskTag;
use serde::Deserialize;
use tera::Context;
use tracing::{debug, error, info, warn};

use crate::api::found;
use crate::error::{AppError, AppResult};
use crate::render::{render, render_error};
use crate::services::spotify::{MusicSource, SessionTokenCache, SpotifyError, TokenCache, TokenInfo};
use crate::session::Session;
use crate::{AppState, SpotifyServices};

const UNREACHABLE: &str = "Cannot reach Spotify, please refresh the page and try again.";

pub fn spotify_routes() -> Router<AppState> {
    Router::new()
        .route("/spotify", get(spotify_home))
        .route("/callback", get(callback))
        .route("/home_page", get(home_page))
        .route("/home_page/logout", get(spotify_logout))
        .route("/home_page/:category", get(category_page))
}

fn services(state: &AppState) -> Result<&SpotifyServices, SpotifyError> {
    state.spotify.as_deref().ok_or(SpotifyError::NotConfigured)
}

/// Outcome of the per-page token check
enum TokenCheck {
    Valid(TokenInfo),
    /// Redirect to the consent page
    Authorize(Response),
}

async fn check_token(state: &AppState, session: &Session) -> Result<TokenCheck, SpotifyError> {
    let spotify = services(state)?;
    let cache = SessionTokenCache::new(session.clone());

    match spotify.oauth.validate_token(&cache).await? {
        Some(token) => Ok(TokenCheck::Valid(token)),
        None => {
            let oauth_state = session.begin_oauth();
            let url = spotify.oauth.authorize_url(&oauth_state)?;
            debug!("Redirecting to Spotify authorization");
            Ok(TokenCheck::Authorize(found(&url)))
        }
    }
}

/// Error page for a failed Spotify interaction
fn spotify_failure(state: &AppState, session: &Session, status: StatusCode, err: &SpotifyError) -> Response {
    error!("Spotify error: {}", err);
    session.flash(UNREACHABLE);
    render_error(&state.templates, session, status, "Spotify is unavailable right now.")
}

/// GET /spotify
pub async fn spotify_home(State(state): State<AppState>, session: Session) -> Response {
    match check_token(&state, &session).await {
        Ok(TokenCheck::Valid(_)) => found("/home_page"),
        Ok(TokenCheck::Authorize(redirect)) => redirect,
        Err(e) => spotify_failure(&state, &session, StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /callback
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> AppResult<Response> {
    if let Some(reason) = params.error {
        warn!(reason = %reason, "Spotify authorization was not granted");
        return Err(AppError::BadRequest(format!("Spotify authorization failed: {}", reason)));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(AppError::BadRequest("Missing authorization code".to_string()));
    };

    if !session.finish_oauth(params.state.as_deref().unwrap_or_default()) {
        warn!("Spotify callback with unexpected state");
        return Err(AppError::BadRequest("Invalid authorization state".to_string()));
    }

    let exchanged = match services(&state) {
        Ok(spotify) => spotify.oauth.exchange_code(&code).await,
        Err(e) => Err(e),
    };

    match exchanged {
        Ok(token) => {
            SessionTokenCache::new(session.clone()).save_token_to_cache(&token);
            info!("Spotify authorization completed");
            Ok(found("/home_page"))
        }
        Err(e) => Ok(spotify_failure(&state, &session, StatusCode::BAD_GATEWAY, &e)),
    }
}

/// GET /home_page
pub async fn home_page(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    match check_token(&state, &session).await {
        Ok(TokenCheck::Valid(_)) => {
            let mut context = Context::new();
            context.insert("categories", &category_links());
            render(&state.templates, &session, "home_page.html", context)
        }
        Ok(TokenCheck::Authorize(redirect)) => Ok(redirect),
        Err(e) => Ok(spotify_failure(&state, &session, StatusCode::BAD_GATEWAY, &e)),
    }
}

#[derive(Debug, serde::Serialize)]
struct CategoryLink {
    slug: &'static str,
    label: &'static str,
}

fn category_links() -> Vec<CategoryLink> {
    TaskTag::ALL
        .iter()
        .map(|tag| CategoryLink {
            slug: tag.slug(),
            label: tag.label(),
        })
        .collect()
}

/// GET /home_page/:category
pub async fn category_page(
    State(state): State<AppState>,
    session: Session,
    Path(category): Path<String>,
) -> AppResult<Response> {
    let tag = TaskTag::from_slug(&category)
        .ok_or_else(|| AppError::NotFound(format!("Unknown category: {}", category)))?;

    let token = match check_token(&state, &session).await {
        Ok(TokenCheck::Valid(token)) => token,
        Ok(TokenCheck::Authorize(redirect)) => return Ok(redirect),
        Err(e) => return Ok(spotify_failure(&state, &session, StatusCode::BAD_GATEWAY, &e)),
    };

    let spotify = services(&state)?;
    let source = MusicSource::for_tag(tag);

    let links = match source.fetch(&spotify.client, &token).await {
        Ok(links) => links,
        Err(e) => return Ok(spotify_failure(&state, &session, StatusCode::BAD_GATEWAY, &e)),
    };

    info!(category = tag.slug(), count = links.len(), "Listed Spotify music for category");

    let mut context = Context::new();
    context.insert("category", tag.label());
    context.insert("heading", source.heading());
    context.insert("links", &links);
    render(&state.templates, &session, "playlist.html", context)
}

/// GET /home_page/logout
pub async fn spotify_logout(session: Session) -> impl IntoResponse {
    session.clear();
    found("/spotify")
}
