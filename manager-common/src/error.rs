//! Common error types for the Manager

use thiserror::Error;

/// Common result type for Manager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Manager crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or stored value outside its enumeration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing or hash parsing failure
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
