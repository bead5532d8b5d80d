//! Request extractors: caller identity and list query parameters.

pub mod auth;
pub mod query;
