//! Server-side session persistence
//!
//! The browser only holds an opaque session id; the session payload is
//! stored here as JSON. Callers own the payload type.

use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

use crate::{Error, Result};

/// Generate a new random session id (32 bytes, hex)
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Load a session payload
///
/// `Ok(None)` for an unknown id. A payload that no longer deserializes is an
/// error so the caller can decide to start over.
pub async fn load_session<T: DeserializeOwned>(pool: &SqlitePool, session_id: &str) -> Result<Option<T>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    data.map(|json| {
        serde_json::from_str(&json)
            .map_err(|e| Error::Internal(format!("Failed to deserialize session: {}", e)))
    })
    .transpose()
}

/// Insert or replace a session payload
pub async fn save_session<T: Serialize>(pool: &SqlitePool, session_id: &str, data: &T) -> Result<()> {
    let json = serde_json::to_string(data)
        .map_err(|e| Error::Internal(format!("Failed to serialize session: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO sessions (session_id, data) VALUES (?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            data = excluded.data,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(session_id)
    .bind(json)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_session(pool: &SqlitePool, session_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove sessions not saved within `max_age`; returns the number removed
pub async fn delete_expired_sessions(pool: &SqlitePool, max_age: Duration) -> Result<u64> {
    let done = sqlx::query("DELETE FROM sessions WHERE updated_at < datetime('now', ?)")
        .bind(format!("-{} seconds", max_age.as_secs()))
        .execute(pool)
        .await?;

    let removed = done.rows_affected();
    if removed > 0 {
        info!(removed, "Pruned expired sessions");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Payload {
        username: Option<String>,
        flashes: Vec<String>,
    }

    #[test]
    fn test_session_ids_are_unique_hex() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_save_load_overwrite_delete() {
        let pool = init_memory_database().await.unwrap();
        let id = generate_session_id();

        assert_eq!(load_session::<Payload>(&pool, &id).await.unwrap(), None);

        let first = Payload {
            username: Some("Test User".to_string()),
            flashes: vec!["Task created".to_string()],
        };
        save_session(&pool, &id, &first).await.unwrap();
        assert_eq!(load_session::<Payload>(&pool, &id).await.unwrap(), Some(first));

        save_session(&pool, &id, &Payload::default()).await.unwrap();
        assert_eq!(load_session::<Payload>(&pool, &id).await.unwrap(), Some(Payload::default()));

        delete_session(&pool, &id).await.unwrap();
        assert_eq!(load_session::<Payload>(&pool, &id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_an_error() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query("INSERT INTO sessions (session_id, data) VALUES ('broken', 'not json')")
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(
            load_session::<Payload>(&pool, "broken").await,
            Err(Error::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_sessions_are_pruned() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "stale", &Payload::default()).await.unwrap();
        save_session(&pool, "fresh", &Payload::default()).await.unwrap();
        sqlx::query("UPDATE sessions SET updated_at = datetime('now', '-40 days') WHERE session_id = 'stale'")
            .execute(&pool)
            .await
            .unwrap();

        let removed = delete_expired_sessions(&pool, Duration::from_secs(30 * 24 * 3600))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(load_session::<Payload>(&pool, "stale").await.unwrap(), None);
        assert!(load_session::<Payload>(&pool, "fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_saving_refreshes_age() {
        let pool = init_memory_database().await.unwrap();
        save_session(&pool, "active", &Payload::default()).await.unwrap();
        sqlx::query("UPDATE sessions SET updated_at = datetime('now', '-40 days')")
            .execute(&pool)
            .await
            .unwrap();

        save_session(&pool, "active", &Payload::default()).await.unwrap();

        let removed = delete_expired_sessions(&pool, Duration::from_secs(30 * 24 * 3600))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
