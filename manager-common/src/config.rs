//! Configuration loading
//!
//! Bootstrap configuration lives in a TOML file. Every field has a built-in
//! default, so a missing file is not an error. Resolution order for the file:
//! 1. Explicit path (command line / `MANAGER_CONFIG`)
//! 2. `<config_dir>/manager/config.toml`
//! 3. `/etc/manager/config.toml` (Linux only)
//! 4. Built-in defaults
//!
//! Command-line and environment overrides are applied by the binary on top
//! of the loaded file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ManagerConfig {
    /// SQLite database file; resolved by `database_path()` when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Validate CSRF tokens on every POST
    #[serde(default = "default_true")]
    pub csrf_enabled: bool,

    /// Mark the session cookie `Secure` (HTTPS deployments)
    #[serde(default)]
    pub session_cookie_secure: bool,

    /// Sessions not saved for this many days are deleted
    #[serde(default = "default_session_max_age_days")]
    pub session_max_age_days: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub spotify: SpotifySettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Spotify application registration and endpoints
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpotifySettings {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Force the Spotify consent dialog even when already approved
    #[serde(default = "default_true")]
    pub show_dialog: bool,

    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5003
}

fn default_true() -> bool {
    true
}

fn default_session_max_age_days() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:5003/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "playlist-read-private".to_string(),
        "playlist-read-collaborative".to_string(),
    ]
}

fn default_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            show_dialog: true,
            accounts_base_url: default_accounts_base_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            csrf_enabled: true,
            session_cookie_secure: false,
            session_max_age_days: default_session_max_age_days(),
            logging: LoggingConfig::default(),
            spotify: SpotifySettings::default(),
        }
    }
}

impl ManagerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration
    ///
    /// An explicit path must exist. Without one, the platform locations are
    /// tried and defaults are used when none is present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        match find_config_file() {
            Some(path) => {
                let config = Self::from_file(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Database file path, falling back to the OS data directory
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Idle lifetime of a stored session
    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_days.saturating_mul(24 * 60 * 60))
    }

    /// Address string for `TcpListener::bind`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Both Spotify credentials are present and non-blank
    pub fn spotify_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(is_valid_key);
        present(&self.spotify.client_id) && present(&self.spotify.client_secret)
    }

    /// Apply a credential override (command line / environment) on top of TOML
    ///
    /// Blank overrides are ignored with a warning.
    pub fn override_spotify_credentials(&mut self, client_id: Option<String>, client_secret: Option<String>) {
        if let Some(id) = client_id {
            if is_valid_key(&id) {
                if self.spotify.client_id.is_some() {
                    info!("Spotify client id from environment overrides TOML value");
                }
                self.spotify.client_id = Some(id);
            } else {
                warn!("Ignoring blank Spotify client id override");
            }
        }

        if let Some(secret) = client_secret {
            if is_valid_key(&secret) {
                self.spotify.client_secret = Some(secret);
            } else {
                warn!("Ignoring blank Spotify client secret override");
            }
        }
    }
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Locate the configuration file for the platform, if one exists
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("manager").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/manager/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("manager"))
        .unwrap_or_else(|| PathBuf::from("./manager_data"))
        .join("manager.db")
}
