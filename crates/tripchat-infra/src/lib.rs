//! Infrastructure layer for Tripchat.
//!
//! Contains the SQLite implementations of the repository traits defined in
//! `tripchat-core` and the configuration loader.

pub mod config;
pub mod sqlite;
