//! Chat business logic and repository trait definitions for Tripchat.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, and the services built on them: the room registry, the
//! message store and the direct-room resolver. It depends only on
//! `tripchat-types` -- never on `tripchat-infra` or any database/IO crate.

pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
