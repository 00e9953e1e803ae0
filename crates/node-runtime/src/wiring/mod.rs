//! # Wiring
//!
//! Turns configuration into concrete adapters behind the membership ports.

pub mod registry;

pub use registry::open_registry;
