//! Database initialization
//!
//! Creates the database file on first run and the schema idempotently on
//! every start. Enumerated columns carry CHECK constraints generated from the
//! Rust enums, so both layers accept exactly the same values.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

use crate::models::{GoalProgress, TaskStatus, TaskTag};
use crate::Result;

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to one connection that never idles out.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_tasks_table(pool).await?;
    create_goals_table(pool).await?;
    create_archived_tasks_table(pool).await?;
    create_sessions_table(pool).await?;
    Ok(())
}

/// `'a', 'b', 'c'` for a CHECK ... IN (...) clause
fn sql_in_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn tag_list() -> String {
    sql_in_list(TaskTag::ALL.iter().map(|t| t.as_str()))
}

fn status_list() -> String {
    sql_in_list(TaskStatus::ALL.iter().map(|s| s.as_str()))
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE CHECK (length(username) BETWEEN 1 AND 255),
            name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 255),
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_tasks_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            task_id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_name TEXT NOT NULL CHECK (length(task_name) BETWEEN 1 AND 255),
            task_description TEXT,
            task_owner TEXT CHECK (task_owner IS NULL OR length(task_owner) <= 255),
            task_tag TEXT NOT NULL CHECK (task_tag IN ({tags})),
            task_due TEXT,
            task_status TEXT NOT NULL DEFAULT 'New' CHECK (task_status IN ({statuses}))
        )
        "#,
        tags = tag_list(),
        statuses = status_list(),
    );

    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

pub async fn create_goals_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS goals (
            goal_id INTEGER PRIMARY KEY AUTOINCREMENT,
            goal_name TEXT NOT NULL CHECK (length(goal_name) BETWEEN 1 AND 255),
            goal_target TEXT,
            goal_progress TEXT CHECK (goal_progress IS NULL OR goal_progress IN ({progress})),
            goal_owner TEXT NOT NULL CHECK (length(goal_owner) BETWEEN 1 AND 255)
        )
        "#,
        progress = sql_in_list(GoalProgress::ALL.iter().map(|p| p.as_str())),
    );

    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

/// Archived tasks keep the id they had while active
pub async fn create_archived_tasks_table(pool: &SqlitePool) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS archived_tasks (
            task_id INTEGER PRIMARY KEY,
            task_name TEXT NOT NULL,
            task_description TEXT,
            task_owner TEXT,
            task_tag TEXT NOT NULL CHECK (task_tag IN ({tags})),
            task_due TEXT,
            task_status TEXT NOT NULL DEFAULT 'Completed' CHECK (task_status = 'Completed'),
            archived_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        tags = tag_list(),
    );

    sqlx::query(&sql).execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS archived_tasks_immutable
        BEFORE UPDATE ON archived_tasks
        BEGIN
            SELECT RAISE(ABORT, 'archived tasks are immutable');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Expiry pruning scans by age
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}
