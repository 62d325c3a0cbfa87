//! Database schema and repository queries
//!
//! All tables live in one SQLite file. Ownership of tasks and goals is a
//! free-text match against usernames, so there are no foreign keys between
//! `users` and the work tables.

pub mod archive;
pub mod goals;
pub mod init;
pub mod sessions;
pub mod tasks;
pub mod users;

pub use init::{create_schema, init_database, init_memory_database};

use crate::Error;

/// SQLite primary result codes meaning the database file is unavailable:
/// BUSY, LOCKED, IOERR, CANTOPEN
const SQLITE_UNAVAILABLE_CODES: [i32; 4] = [5, 6, 10, 14];

/// Primary result code of a SQLite error (extended codes keep it in the low byte)
fn sqlite_primary_code(db_err: &dyn sqlx::error::DatabaseError) -> Option<i32> {
    db_err.code()?.parse::<i32>().ok().map(|code| code & 0xff)
}

/// User-facing classification of a failed database operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbFailure {
    /// The submitted values violate a constraint or cannot be decoded
    InvalidData,
    /// The database could not be reached (pool exhausted/closed, I/O)
    Unreachable,
    /// Anything else
    Other,
}

impl DbFailure {
    /// Classify a driver error
    pub fn classify(err: &sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => DbFailure::InvalidData,
                _ if sqlite_primary_code(&**db_err)
                    .is_some_and(|code| SQLITE_UNAVAILABLE_CODES.contains(&code)) =>
                {
                    DbFailure::Unreachable
                }
                _ => DbFailure::Other,
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => DbFailure::InvalidData,
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DbFailure::Unreachable,
            _ => DbFailure::Other,
        }
    }

    /// Classify a crate error
    pub fn of(err: &Error) -> Self {
        match err {
            Error::Database(db_err) => Self::classify(db_err),
            Error::InvalidInput(_) => DbFailure::InvalidData,
            Error::Io(_) => DbFailure::Unreachable,
            _ => DbFailure::Other,
        }
    }

    /// Flash message for this failure; `fallback` names the failed operation
    ///
    /// ```
    /// use manager_common::db::DbFailure;
    ///
    /// let msg = DbFailure::Other.message("Database Error: task could not be created");
    /// assert_eq!(msg, "Database Error: task could not be created");
    /// assert_eq!(DbFailure::Unreachable.message("ignored"), "Database could not be reached");
    /// ```
    pub fn message(self, fallback: &str) -> String {
        match self {
            DbFailure::InvalidData => "Incorrect data provided".to_string(),
            DbFailure::Unreachable => "Database could not be reached".to_string(),
            DbFailure::Other => fallback.to_string(),
        }
    }
}
