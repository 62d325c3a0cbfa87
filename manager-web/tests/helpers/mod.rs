//! Shared helpers for manager-web integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use manager_common::config::ManagerConfig;
use manager_common::db::{init_memory_database, sessions, users};
use manager_web::session::{SessionData, SESSION_COOKIE};
use manager_web::{build_router, AppState};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

pub const TEST_USER: &str = "Test User";
pub const TEST_PASSWORD: &str = "correct horse";

/// Router plus direct database access
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

/// Test configuration: CSRF disabled, Spotify unconfigured
pub fn test_config() -> ManagerConfig {
    ManagerConfig {
        csrf_enabled: false,
        ..ManagerConfig::default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ManagerConfig) -> Self {
        let db = init_memory_database().await.expect("Should create in-memory database");
        let state = AppState::new(db.clone(), config).expect("Should build app state");
        Self {
            router: build_router(state),
            db,
        }
    }

    /// Store a session directly and return the matching `Cookie` header
    pub async fn session_with(&self, data: SessionData) -> String {
        let id = sessions::generate_session_id();
        sessions::save_session(&self.db, &id, &data)
            .await
            .expect("Should save session");
        format!("{}={}", SESSION_COOKIE, id)
    }

    /// Cookie for a logged-in session
    pub async fn logged_in(&self, username: &str) -> String {
        self.session_with(SessionData {
            username: Some(username.to_string()),
            ..SessionData::default()
        })
        .await
    }

    pub async fn create_user(&self, username: &str) {
        users::create_user(&self.db, "Test Name", username, TEST_PASSWORD)
            .await
            .expect("Should create user");
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("Router should respond")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Session payload behind a `Cookie` header value
    pub async fn session_data(&self, cookie: &str) -> SessionData {
        self.stored_session(cookie).await.expect("Session should exist")
    }

    /// Session payload, or `None` when no row is stored under the cookie's id
    pub async fn stored_session(&self, cookie: &str) -> Option<SessionData> {
        let id = cookie
            .strip_prefix(&format!("{}=", SESSION_COOKIE))
            .expect("Cookie should be the session cookie");
        sessions::load_session(&self.db, id)
            .await
            .expect("Should load session")
    }

    pub async fn session_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.db)
            .await
            .expect("Should count sessions")
    }
}

/// Extract response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

/// `Location` header of a redirect
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Redirect should carry Location")
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` of the session cookie issued by the response, if any
pub fn issued_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// True when the response tells the browser to drop the session cookie
pub fn clears_session_cookie(response: &Response<Body>) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&format!("{}=;", SESSION_COOKIE)) && v.contains("Max-Age=0"))
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), to);
}
