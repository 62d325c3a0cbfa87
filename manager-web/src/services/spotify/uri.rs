//! Spotify resource identifiers
//!
//! Accepts `spotify:<kind>:<id>` URIs, `https://open.spotify.com/<kind>/<id>`
//! URLs and bare base-62 ids.

use std::fmt;
use url::Url;

use super::SpotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriKind {
    Artist,
    Album,
    Playlist,
    Track,
}

impl UriKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UriKind::Artist => "artist",
            UriKind::Album => "album",
            UriKind::Playlist => "playlist",
            UriKind::Track => "track",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "artist" => Some(UriKind::Artist),
            "album" => Some(UriKind::Album),
            "playlist" => Some(UriKind::Playlist),
            "track" => Some(UriKind::Track),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyUri {
    pub kind: UriKind,
    pub id: String,
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

impl SpotifyUri {
    /// Parse any accepted form, requiring the given kind
    pub fn parse(input: &str, expected: UriKind) -> Result<Self, SpotifyError> {
        let input = input.trim();
        let invalid = || SpotifyError::InvalidUri(input.to_string());

        let (kind, id) = if let Some(rest) = input.strip_prefix("spotify:") {
            let (kind, id) = rest.split_once(':').ok_or_else(invalid)?;
            (UriKind::from_segment(kind).ok_or_else(invalid)?, id.to_string())
        } else if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input).map_err(|_| invalid())?;
            if url.host_str() != Some("open.spotify.com") {
                return Err(invalid());
            }
            let mut segments = url.path_segments().ok_or_else(invalid)?;
            let kind = segments.next().and_then(UriKind::from_segment).ok_or_else(invalid)?;
            let id = segments.next().ok_or_else(invalid)?;
            (kind, id.to_string())
        } else {
            (expected, input.to_string())
        };

        if kind != expected {
            return Err(SpotifyError::InvalidUri(format!(
                "Expected a {} but got a {}: {}",
                expected.as_str(),
                kind.as_str(),
                input
            )));
        }

        if !is_valid_id(&id) {
            return Err(invalid());
        }

        Ok(Self { kind, id })
    }
}

impl fmt::Display for SpotifyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spotify:{}:{}", self.kind.as_str(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_forms() {
        let expected = SpotifyUri {
            kind: UriKind::Artist,
            id: "7tYKF4w9nC0nq9CsPZTHyP".to_string(),
        };

        for input in [
            "spotify:artist:7tYKF4w9nC0nq9CsPZTHyP",
            "https://open.spotify.com/artist/7tYKF4w9nC0nq9CsPZTHyP",
            "https://open.spotify.com/artist/7tYKF4w9nC0nq9CsPZTHyP?si=abc",
            "7tYKF4w9nC0nq9CsPZTHyP",
        ] {
            assert_eq!(SpotifyUri::parse(input, UriKind::Artist).unwrap(), expected, "{}", input);
        }
    }

    #[test]
    fn test_kind_mismatch() {
        assert!(matches!(
            SpotifyUri::parse("spotify:playlist:37i9dQZF1DZ06evO0Co11u", UriKind::Artist),
            Err(SpotifyError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "spotify:artist", "spotify:show:abc", "https://example.com/artist/abc", "not/an-id"] {
            assert!(SpotifyUri::parse(input, UriKind::Artist).is_err(), "{}", input);
        }
    }

    #[test]
    fn test_display_is_uri_form() {
        let uri = SpotifyUri::parse("37i9dQZF1DZ06evO0Co11u", UriKind::Playlist).unwrap();
        assert_eq!(uri.to_string(), "spotify:playlist:37i9dQZF1DZ06evO0Co11u");
    }
}
