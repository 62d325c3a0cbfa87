//! Outbound integrations

pub mod spotify;
