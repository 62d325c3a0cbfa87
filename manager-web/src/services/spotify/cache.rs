//! Token cache seam
//!
//! `SpotifyOAuth::validate_token` reads and writes tokens through this trait.
//! The web app keeps them in the browser session so each session owns its
//! own token pair.

use super::TokenInfo;
use crate::session::Session;

/// Storage for the current token pair
pub trait TokenCache {
    fn get_cached_token(&self) -> Option<TokenInfo>;

    fn save_token_to_cache(&self, token: &TokenInfo);
}

/// Token cache backed by the server-side session
#[derive(Debug, Clone)]
pub struct SessionTokenCache {
    session: Session,
}

impl SessionTokenCache {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl TokenCache for SessionTokenCache {
    fn get_cached_token(&self) -> Option<TokenInfo> {
        self.session.token_info()
    }

    fn save_token_to_cache(&self, token: &TokenInfo) {
        self.session.set_token_info(token.clone());
    }
}
