//! Integration tests for the Spotify pages against a mock Spotify server

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use manager_common::config::{ManagerConfig, SpotifySettings};
use manager_web::services::spotify::TokenInfo;
use manager_web::session::SessionData;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCOPES: &str = "playlist-read-private playlist-read-collaborative";

fn spotify_config(server: &MockServer) -> ManagerConfig {
    ManagerConfig {
        spotify: SpotifySettings {
            client_id: Some("test-client".to_string()),
            client_secret: Some("test-secret".to_string()),
            accounts_base_url: server.uri(),
            api_base_url: server.uri(),
            ..SpotifySettings::default()
        },
        ..test_config()
    }
}

fn valid_token() -> TokenInfo {
    TokenInfo {
        access_token: "access".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        refresh_token: Some("refresh".to_string()),
        scope: SCOPES.to_string(),
        expires_at: chrono::Utc::now().timestamp() + 3600,
    }
}

async fn with_token(app: &TestApp, token: TokenInfo) -> String {
    app.session_with(SessionData {
        token_info: Some(token),
        ..SessionData::default()
    })
    .await
}

// =============================================================================
// /spotify
// =============================================================================

#[tokio::test]
async fn test_spotify_redirects_to_authorization() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;

    let response = app.get("/spotify", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let target = Url::parse(&location(&response)).unwrap();
    assert_eq!(target.path(), "/authorize");
    let param = |name: &str| {
        target
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    assert_eq!(param("client_id").as_deref(), Some("test-client"));
    assert_eq!(param("response_type").as_deref(), Some("code"));
    assert_eq!(param("scope").as_deref(), Some(SCOPES));
    assert_eq!(param("show_dialog").as_deref(), Some("true"));

    let cookie = issued_cookie(&response).expect("Authorization should create a session");
    let stored = app.session_data(&cookie).await.oauth_state;
    assert!(stored.is_some());
    assert_eq!(param("state"), stored);
}

#[tokio::test]
async fn test_spotify_with_valid_token_goes_home() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/spotify", Some(&cookie)).await;
    assert_redirect(&response, "/home_page");
}

#[tokio::test]
async fn test_spotify_unconfigured() {
    let app = TestApp::new().await;

    let response = app.get("/spotify", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("Cannot reach Spotify, please refresh the page and try again."));
}

#[tokio::test]
async fn test_token_lacking_scope_reauthorizes() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(
        &app,
        TokenInfo {
            scope: "user-read-email".to_string(),
            ..valid_token()
        },
    )
    .await;

    let response = app.get("/home_page", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with(&format!("{}/authorize", server.uri())));
}

// =============================================================================
// /callback
// =============================================================================

#[tokio::test]
async fn test_callback_denied() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;

    let response = app.get("/callback?error=access_denied&state=abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_missing_code() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;

    let response = app.get("/callback?state=abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_state_mismatch() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = app
        .session_with(SessionData {
            oauth_state: Some("expected".to_string()),
            ..SessionData::default()
        })
        .await;

    let response = app.get("/callback?code=abc&state=forged", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.session_data(&cookie).await.token_info, None);
}

#[tokio::test]
async fn test_callback_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "new-refresh",
            "scope": SCOPES
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = app
        .session_with(SessionData {
            oauth_state: Some("expected".to_string()),
            ..SessionData::default()
        })
        .await;

    let response = app.get("/callback?code=abc&state=expected", Some(&cookie)).await;
    assert_redirect(&response, "/home_page");

    let data = app.session_data(&cookie).await;
    assert_eq!(data.oauth_state, None);
    let token = data.token_info.expect("Token should be cached in the session");
    assert_eq!(token.access_token, "new-access");
    assert_eq!(token.refresh_token.as_deref(), Some("new-refresh"));
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = app
        .session_with(SessionData {
            oauth_state: Some("expected".to_string()),
            ..SessionData::default()
        })
        .await;

    let response = app.get("/callback?code=abc&state=expected", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Cannot reach Spotify"));
}

// =============================================================================
// /home_page
// =============================================================================

#[tokio::test]
async fn test_home_page_lists_categories() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/home_page", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    for label in ["Cleaning", "Gardening", "DIY", "Childcare"] {
        assert!(html.contains(label), "missing category {}", label);
    }
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(
        &app,
        TokenInfo {
            expires_at: 0,
            ..valid_token()
        },
    )
    .await;

    let response = app.get("/home_page", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = app.session_data(&cookie).await.token_info.unwrap();
    assert_eq!(token.access_token, "fresh");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
    assert_eq!(token.scope, SCOPES);
}

#[tokio::test]
async fn test_cleaning_lists_artist_albums() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/artists/7tYKF4w9nC0nq9CsPZTHyP/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "a1",
                    "name": "Sparkling Floors",
                    "album_type": "album",
                    "external_urls": { "spotify": "https://open.spotify.com/album/a1" }
                },
                {
                    "id": "a2",
                    "name": "Dust Bunnies",
                    "album_type": "album",
                    "external_urls": { "spotify": "https://open.spotify.com/album/a2" }
                }
            ],
            "next": null,
            "total": 2
        })))
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/home_page/cleaning", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Cleaning: Albums"));
    assert!(html.contains("Sparkling Floors"));
    assert!(html.contains("Dust Bunnies"));
}

#[tokio::test]
async fn test_gardening_lists_playlists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/playlists/[A-Za-z0-9]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "name": "Garden Grooves",
            "external_urls": { "spotify": "https://open.spotify.com/playlist/p1" }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/home_page/gardening", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Gardening: Playlists"));
    assert_eq!(html.matches("Garden Grooves").count(), 3);
}

#[tokio::test]
async fn test_unknown_category() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/home_page/karaoke", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_without_token_reauthorizes() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;

    let response = app.get("/home_page/cooking", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with(&format!("{}/authorize", server.uri())));
}

#[tokio::test]
async fn test_category_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/playlists/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = with_token(&app, valid_token()).await;

    let response = app.get("/home_page/laundry", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response)
        .await
        .contains("Cannot reach Spotify, please refresh the page and try again."));
}

#[tokio::test]
async fn test_spotify_logout_clears_session() {
    let server = MockServer::start().await;
    let app = TestApp::with_config(spotify_config(&server)).await;
    let cookie = app
        .session_with(SessionData {
            username: Some(TEST_USER.to_string()),
            token_info: Some(valid_token()),
            ..SessionData::default()
        })
        .await;

    let other = app.logged_in("alex").await;
    assert_eq!(app.session_count().await, 2);

    let response = app.get("/home_page/logout", Some(&cookie)).await;
    assert_redirect(&response, "/spotify");

    // The old id is gone for good and nothing new was stored
    assert_eq!(app.stored_session(&cookie).await, None);
    assert_eq!(app.session_count().await, 1);
    assert!(clears_session_cookie(&response));
    assert!(app.stored_session(&other).await.is_some());

    // Replaying the old cookie lands on an anonymous session
    let response = app.get("/overview-tasks", Some(&cookie)).await;
    assert_redirect(&response, "/");
}
