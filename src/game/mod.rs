//! Seeded procedural generation of solar systems.
//!
//! Everything under this module is a pure function of its seed and the
//! [`config::GenerationConfig`] tables: the same inputs always produce the
//! same bodies, down to the serialized bytes.

pub mod asteroid;
pub mod body;
pub mod comet;
pub mod config;
pub mod moon;
pub mod naming;
pub mod nebula;
pub mod planet;
pub mod random;
pub mod system;
pub mod terrain;
