//! User accounts and credential checks

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{error, warn};

use crate::models::User;
use crate::password::{hash_password_async, verify_password_async};
use crate::Result;

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(User),
    MissingCredentials,
    InvalidCredentials,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            LoginOutcome::Success(_) => "Login has been successful!",
            LoginOutcome::MissingCredentials => "Username and password are required",
            LoginOutcome::InvalidCredentials => {
                "The credentials you have inputted are incorrect, please try again or contact customer support."
            }
        }
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
    })
}

/// Look up a user by unique username
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT user_id, username, name, password_hash FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Create a user with a freshly hashed password
///
/// A duplicate username surfaces as a unique-constraint database error.
pub async fn create_user(pool: &SqlitePool, name: &str, username: &str, password: &str) -> Result<User> {
    let password_hash = hash_password_async(password).await?;

    let result = sqlx::query("INSERT INTO users (username, name, password_hash) VALUES (?, ?, ?)")
        .bind(username)
        .bind(name)
        .bind(&password_hash)
        .execute(pool)
        .await;

    match result {
        Ok(done) => Ok(User {
            user_id: done.last_insert_rowid(),
            username: username.to_string(),
            name: name.to_string(),
            password_hash,
        }),
        Err(e) => {
            error!(username = %username, "Error creating user: {}", e);
            Err(e.into())
        }
    }
}

/// Check credentials against the stored hash
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<LoginOutcome> {
    if username.is_empty() || password.is_empty() {
        return Ok(LoginOutcome::MissingCredentials);
    }

    let user = find_by_username(pool, username).await.map_err(|e| {
        error!(username = %username, "Error during login: {}", e);
        e
    })?;

    let Some(user) = user else {
        warn!(username = %username, "Login rejected: unknown user");
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if verify_password_async(password, &user.password_hash).await? {
        Ok(LoginOutcome::Success(user))
    } else {
        warn!(username = %username, "Login rejected: wrong password");
        Ok(LoginOutcome::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = init_memory_database().await.unwrap();

        let created = create_user(&pool, "New User", "newuser4", "newpassword4").await.unwrap();
        let found = find_by_username(&pool, "newuser4").await.unwrap().unwrap();

        assert_eq!(created, found);
        assert_ne!(found.password_hash, "newpassword4");
        assert!(username_exists(&pool, "newuser4").await.unwrap());
        assert!(!username_exists(&pool, "someone-else").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let pool = init_memory_database().await.unwrap();

        create_user(&pool, "Existing User5", "existinguser5", "existingpassword").await.unwrap();
        let err = create_user(&pool, "Another User", "existinguser5", "newpassword5")
            .await
            .unwrap_err();

        assert_eq!(crate::db::DbFailure::of(&err), crate::db::DbFailure::InvalidData);
    }

    #[tokio::test]
    async fn test_authenticate_outcomes() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "Test User2", "testuser2", "testpassword2").await.unwrap();

        let ok = authenticate(&pool, "testuser2", "testpassword2").await.unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.message(), "Login has been successful!");

        let wrong = authenticate(&pool, "testuser2", "nope").await.unwrap();
        assert_eq!(wrong, LoginOutcome::InvalidCredentials);

        let unknown = authenticate(&pool, "ghost", "testpassword2").await.unwrap();
        assert_eq!(unknown, LoginOutcome::InvalidCredentials);

        let missing = authenticate(&pool, "", "testpassword2").await.unwrap();
        assert_eq!(missing, LoginOutcome::MissingCredentials);
        assert_eq!(missing.message(), "Username and password are required");
    }

    #[tokio::test]
    async fn test_login_does_not_block_runtime() {
        use std::sync::{Arc, Mutex};
        use std::time::{Duration, Instant};

        let pool = init_memory_database().await.unwrap();

        // Single-threaded runtime: the ticker only runs while login yields
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ticks.lock().unwrap().push(Instant::now());
                }
            }
        });

        create_user(&pool, "Ticker User", "tickeruser", "tickerpassword").await.unwrap();
        let outcome = authenticate(&pool, "tickeruser", "tickerpassword").await.unwrap();
        ticker.abort();

        assert!(outcome.is_success());
        let ticks = ticks.lock().unwrap();
        let worst_gap = ticks
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .max()
            .unwrap_or_default();
        assert!(worst_gap < Duration::from_millis(150), "runtime stalled for {:?}", worst_gap);
    }
}
