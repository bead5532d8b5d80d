//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and business rules. They depend on
//! traits (ports) -- never on concrete infrastructure implementations.

pub mod message;
pub mod resolver;
pub mod room;
pub mod storage;
pub mod user;
