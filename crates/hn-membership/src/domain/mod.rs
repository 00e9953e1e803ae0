//! Domain Layer - membership state with no I/O
//!
//! This module contains:
//! - Node identity and registry entries
//! - The peer table and its read-only snapshots
//! - Liveness Protocol request/reply values
//! - Error taxonomy and timing configuration

pub mod config;
pub mod errors;
pub mod greeting;
pub mod identity;
pub mod peer_table;

pub use config::MembershipConfig;
pub use errors::{PeerError, RegistryError};
pub use greeting::{greeting_for, GreetReply, GreetRequest};
pub use identity::{name_from_key, registry_key, NodeIdentity, RegistryEntry, REGISTRY_KEY_PREFIX};
pub use peer_table::{PeerEntry, PeerSnapshot, PeerTable};
