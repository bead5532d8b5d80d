//! Shared domain types for Tripchat.
//!
//! This crate contains the core domain types used across the chat layer:
//! users, identities, rooms, messages, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod room;
pub mod user;
