//! manager-web library
//!
//! Household task and goal tracker with per-category Spotify suggestions.
//! Exposed as a library so integration tests can drive the router directly.

pub mod api;
pub mod csrf;
pub mod error;
pub mod forms;
pub mod render;
pub mod services;
pub mod session;

pub use crate::error::{AppError, AppResult};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use manager_common::config::ManagerConfig;
use services::spotify::{SpotifyClient, SpotifyError, SpotifyOAuth};
use sqlx::SqlitePool;
use std::sync::Arc;
use tera::Tera;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Spotify clients, present only when credentials are configured
#[derive(Debug, Clone)]
pub struct SpotifyServices {
    pub oauth: SpotifyOAuth,
    pub client: SpotifyClient,
}

impl SpotifyServices {
    pub fn from_config(config: &ManagerConfig) -> Result<Self, SpotifyError> {
        Ok(Self {
            oauth: SpotifyOAuth::new(&config.spotify)?,
            client: SpotifyClient::new(&config.spotify.api_base_url)?,
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub templates: Arc<Tera>,
    pub config: Arc<ManagerConfig>,
    pub spotify: Option<Arc<SpotifyServices>>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ManagerConfig) -> AppResult<Self> {
        let templates = render::load_templates()?;

        let spotify = if config.spotify_configured() {
            let services = SpotifyServices::from_config(&config)?;
            info!("Spotify integration enabled");
            Some(Arc::new(services))
        } else {
            warn!("Spotify client credentials missing (set CLIENT_ID and CLIENT_SECRET); Spotify pages are disabled");
            None
        };

        Ok(Self {
            db,
            templates: Arc::new(templates),
            config: Arc::new(config),
            spotify,
        })
    }
}

/// Build application router
///
/// Every page runs inside the session layer; POSTs additionally pass the CSRF
/// check. `/health` sits outside both.
pub fn build_router(state: AppState) -> Router {
    use api::{auth, goals, tasks};

    let pages = Router::new()
        .route("/", get(auth::show_login).post(auth::login))
        .route("/signup", get(auth::show_signup).post(auth::signup))
        .route("/logout", get(auth::logout))
        .route("/app", get(tasks::app_home))
        .route("/overview-tasks", get(tasks::overview_tasks))
        .route("/archived-tasks", get(tasks::archived_tasks))
        .route("/add-task", get(tasks::show_add_task).post(tasks::add_task))
        .route(
            "/update-task/:task_id",
            get(tasks::show_update_task).post(tasks::update_task),
        )
        .route("/claim-task/:task_id", post(tasks::claim_task))
        .route("/archive-task/:task_id", post(tasks::archive_task))
        .route("/overview-goals", get(goals::overview_goals))
        .route("/add-goal", get(goals::show_add_goal).post(goals::add_goal))
        .route(
            "/update-goal/:goal_id",
            get(goals::show_update_goal).post(goals::update_goal),
        )
        .merge(api::spotify_routes())
        .layer(middleware::from_fn_with_state(state.clone(), csrf::csrf_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), session::session_middleware));

    Router::new()
        .merge(pages)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
