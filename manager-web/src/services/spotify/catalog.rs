//! Music suggested for each task category

use manager_common::models::TaskTag;
use serde::Serialize;

use super::{SpotifyClient, SpotifyError, TokenInfo};

/// Where a category's music comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicSource {
    /// Every album released by one artist
    ArtistAlbums(&'static str),
    /// A fixed set of playlists
    Playlists(&'static [&'static str]),
}

/// One rendered entry: display name and Spotify link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotifyLink {
    pub name: String,
    pub url: String,
}

impl MusicSource {
    pub fn for_tag(tag: TaskTag) -> Self {
        match tag {
            TaskTag::Cleaning => MusicSource::ArtistAlbums("spotify:artist:7tYKF4w9nC0nq9CsPZTHyP"),
            TaskTag::Cooking => MusicSource::ArtistAlbums("spotify:artist:2wY79sveU1sp5g7SokKOiI"),
            TaskTag::Gardening => MusicSource::Playlists(&[
                "spotify:playlist:37i9dQZF1DZ06evO0Co11u",
                "spotify:playlist:37i9dQZF1EIeptNKrK95ex",
                "spotify:playlist:37i9dQZF1DWV7EzJMK2FUI",
            ]),
            TaskTag::Shopping => MusicSource::Playlists(&[
                "spotify:playlist:2P0VBAcUPSzjhgYUsIyjjb",
                "spotify:playlist:2jMTSDkouGnpYE3JXAuRjy",
                "spotify:playlist:59bquJNzpBVlzePmksrzZ7",
            ]),
            TaskTag::Laundry => MusicSource::Playlists(&[
                "spotify:playlist:1ftFIOsNNt5mXJepj3wzuH",
                "spotify:playlist:37i9dQZF1DWT0IiTU5mrJ9",
                "spotify:playlist:4muHyvSwG1wP9sI4XihC5w",
            ]),
            TaskTag::Diy => MusicSource::Playlists(&[
                "spotify:playlist:2njiabuQAJcRTKC4CDja47",
                "spotify:playlist:4NMom1HAG5Nk2MvlueSsF7",
                "spotify:playlist:3okUIpItRWF127C92YaXQ6",
            ]),
            TaskTag::Finance => MusicSource::Playlists(&[
                "spotify:playlist:6E5WGfx9LF2rU1pqTGQlh5",
                "spotify:playlist:0ZMw0qV3CyIuBuBObouD1L",
                "spotify:playlist:31yp6AccQFiIwvC1SPnG7J",
            ]),
            TaskTag::Home => MusicSource::Playlists(&[
                "spotify:playlist:7BdkdQkR7GANVz11eElkpn",
                "spotify:playlist:2lB5UHNDgcQlSxafzqlUdq",
                "spotify:playlist:0kgirc9upn9id02xsxutPT",
            ]),
            TaskTag::Pets => MusicSource::Playlists(&[
                "spotify:playlist:2uXOLlA9SOwGKAWq8Ur5MH",
                "spotify:playlist:0tMwcHD10Mw0St4JswNLUI",
                "spotify:playlist:2R79wZ0MgXLUz33bBbKPIM",
            ]),
            TaskTag::Childcare => MusicSource::Playlists(&[
                "spotify:playlist:1CKZs4Atk5gBaL40EUVZRg",
                "spotify:playlist:37i9dQZF1DWVmLl2r5kAOQ",
                "spotify:playlist:37i9dQZF1DX2UkbeRPWQqZ",
            ]),
        }
    }

    /// Heading for the category page
    pub fn heading(self) -> &'static str {
        match self {
            MusicSource::ArtistAlbums(_) => "Albums",
            MusicSource::Playlists(_) => "Playlists",
        }
    }

    /// Resolve to name/link pairs
    ///
    /// Entries without a Spotify link are skipped.
    pub async fn fetch(self, client: &SpotifyClient, token: &TokenInfo) -> Result<Vec<SpotifyLink>, SpotifyError> {
        let mut links = Vec::new();

        match self {
            MusicSource::ArtistAlbums(artist) => {
                for album in client.all_artist_albums(token, artist, Some("album")).await? {
                    if let Some(url) = album.external_urls.spotify {
                        links.push(SpotifyLink { name: album.name, url });
                    }
                }
            }
            MusicSource::Playlists(ids) => {
                for id in ids {
                    let playlist = client.playlist(token, id).await?;
                    if let Some(url) = playlist.external_urls.spotify {
                        links.push(SpotifyLink { name: playlist.name, url });
                    }
                }
            }
        }

        Ok(links)
    }
}
