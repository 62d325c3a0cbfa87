//! # Manager Common Library
//!
//! Shared code for the Manager household task service:
//! - Domain models and their fixed enumerations
//! - Database schema creation and repository queries
//! - Server-side session persistence
//! - Password hashing
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod password;

pub use error::{Error, Result};
