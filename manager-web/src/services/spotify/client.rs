//! Spotify Web API client
//!
//! Only the read endpoints the category pages need: an artist's albums (with
//! paging) and single playlists.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{check_status, http_client, SpotifyError, SpotifyUri, TokenInfo, UriKind};

/// Albums per page (API maximum)
const ALBUM_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Paging object
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absolute URL of the next page
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http_client: reqwest::Client,
    api_base_url: String,
}

impl SpotifyClient {
    pub fn new(api_base_url: &str) -> Result<Self, SpotifyError> {
        Ok(Self {
            http_client: http_client()?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &TokenInfo,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SpotifyError> {
        debug!(url = %url, "Querying Spotify API");

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .query(query)
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))
    }

    /// First page of an artist's albums
    ///
    /// `album_type` narrows the result (`album`, `single`, ...).
    pub async fn artist_albums(
        &self,
        token: &TokenInfo,
        artist: &str,
        album_type: Option<&str>,
    ) -> Result<Page<Album>, SpotifyError> {
        let artist = SpotifyUri::parse(artist, UriKind::Artist)?;
        let url = format!("{}/artists/{}/albums", self.api_base_url, artist.id);

        let mut query = vec![("limit", ALBUM_PAGE_LIMIT.to_string())];
        if let Some(album_type) = album_type {
            query.push(("include_groups", album_type.to_string()));
        }

        self.get_json(token, &url, &query).await
    }

    /// Page following `page`, or `None` on the last page
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        token: &TokenInfo,
        page: &Page<T>,
    ) -> Result<Option<Page<T>>, SpotifyError> {
        match &page.next {
            Some(next) => self.get_json(token, next, &[]).await.map(Some),
            None => Ok(None),
        }
    }

    /// Every album of an artist, across all pages
    pub async fn all_artist_albums(
        &self,
        token: &TokenInfo,
        artist: &str,
        album_type: Option<&str>,
    ) -> Result<Vec<Album>, SpotifyError> {
        let mut page = self.artist_albums(token, artist, album_type).await?;
        let mut albums = std::mem::take(&mut page.items);

        while let Some(mut next) = self.next_page(token, &page).await? {
            albums.append(&mut next.items);
            page = next;
        }

        debug!(artist = %artist, count = albums.len(), "Fetched artist albums");
        Ok(albums)
    }

    pub async fn playlist(&self, token: &TokenInfo, playlist: &str) -> Result<Playlist, SpotifyError> {
        let playlist = SpotifyUri::parse(playlist, UriKind::Playlist)?;
        let url = format!("{}/playlists/{}", self.api_base_url, playlist.id);

        self.get_json(
            token,
            &url,
            &[("fields", "id,name,description,external_urls".to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token() -> TokenInfo {
        TokenInfo {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: None,
            scope: String::new(),
            expires_at: i64::MAX / 2,
        }
    }

    fn album(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Album {}", id),
            "album_type": "album",
            "external_urls": { "spotify": format!("https://open.spotify.com/album/{}", id) }
        })
    }

    #[tokio::test]
    async fn test_all_artist_albums_follows_next() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/artists/7tYKF4w9nC0nq9CsPZTHyP/albums"))
            .and(query_param("limit", "50"))
            .and(query_param("include_groups", "album"))
            .and(header("authorization", "Bearer access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [album("a1"), album("a2")],
                "next": format!("{}/next-page", server.uri()),
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/next-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [album("a3")],
                "next": null,
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SpotifyClient::new(&server.uri()).unwrap();
        let albums = client
            .all_artist_albums(&token(), "spotify:artist:7tYKF4w9nC0nq9CsPZTHyP", Some("album"))
            .await
            .unwrap();

        let ids: Vec<_> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "a3"]);
        assert_eq!(
            albums[2].external_urls.spotify.as_deref(),
            Some("https://open.spotify.com/album/a3")
        );
    }

    #[tokio::test]
    async fn test_playlist_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/37i9dQZF1DZ06evO0Co11u"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "37i9dQZF1DZ06evO0Co11u",
                "name": "Jazz Mix",
                "external_urls": { "spotify": "https://open.spotify.com/playlist/37i9dQZF1DZ06evO0Co11u" }
            })))
            .mount(&server)
            .await;

        let client = SpotifyClient::new(&server.uri()).unwrap();
        let playlist = client
            .playlist(&token(), "spotify:playlist:37i9dQZF1DZ06evO0Co11u")
            .await
            .unwrap();

        assert_eq!(playlist.name, "Jazz Mix");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/busy"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlists/expired"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let client = SpotifyClient::new(&server.uri()).unwrap();

        assert!(matches!(
            client.playlist(&token(), "missing").await,
            Err(SpotifyError::NotFound(_))
        ));
        assert!(matches!(
            client.playlist(&token(), "busy").await,
            Err(SpotifyError::RateLimitExceeded)
        ));
        assert!(matches!(
            client.playlist(&token(), "expired").await,
            Err(SpotifyError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_uri_kind_never_hits_network() {
        let client = SpotifyClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.playlist(&token(), "spotify:artist:7tYKF4w9nC0nq9CsPZTHyP").await,
            Err(SpotifyError::InvalidUri(_))
        ));
    }
}
