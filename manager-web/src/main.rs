//! manager-web - household task manager with Spotify suggestions
//!
//! Serves the login, task, goal and Spotify pages on one port.

use anyhow::{Context, Result};
use clap::Parser;
use manager_common::config::ManagerConfig;
use manager_common::db::init_database;
use manager_web::session::spawn_session_pruner;
use manager_web::{build_router, AppState};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// How often stale sessions are deleted
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "manager-web")]
#[command(about = "Household task manager with Spotify playlists")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "MANAGER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "MANAGER_PORT")]
    port: Option<u16>,

    /// SQLite database file (overrides config)
    #[arg(short, long, env = "MANAGER_DATABASE")]
    database: Option<PathBuf>,

    /// Spotify application client id
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level can apply; load errors
    // are reported once tracing is up
    let loaded = ManagerConfig::load(args.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    info!(
        "Starting manager-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    config.override_spotify_credentials(args.client_id, args.client_secret);

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("✓ Database ready");

    spawn_session_pruner(pool.clone(), config.session_max_age(), SESSION_PRUNE_INTERVAL);

    let address = config.listen_address();
    let state = AppState::new(pool, config).context("Failed to initialize application state")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("manager-web listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
