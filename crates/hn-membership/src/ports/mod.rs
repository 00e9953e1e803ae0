//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the greet operation served to peers
//! - **Driven Ports (Outbound):** registry access and peer channels

pub mod inbound;
pub mod outbound;

pub use inbound::GreetHandler;
pub use outbound::{PeerChannel, PeerConnector, RegistryClient};
