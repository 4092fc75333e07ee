//! Shared types for the vigil observability core.
//!
//! Metric samples, alert rules and the primitives every service crate
//! depends on (id generation, the injectable [`clock::Clock`]) live here so
//! that the service crates only meet through these types.

pub mod clock;
pub mod id;
pub mod types;
