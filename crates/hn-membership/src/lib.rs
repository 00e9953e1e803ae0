//! # Peer Membership & Liveness
//!
//! Nodes announce themselves in a shared key-value registry, poll it on a
//! fixed interval, and greet every peer they have not seen before. A peer
//! is "known" only after one successful greet; failures are retried on the
//! next tick.
//!
//! ## Socket-free Core
//!
//! The core library (domain, ports, service) does no I/O of its own.
//! Adapters are feature-gated:
//!
//! - `network` - TCP greet transport, dev registry client/server (serde, bincode)
//! - `etcd` - etcd registry backend (etcd-client)
//! - `test-utils` - mock peer network for downstream tests
//!
//! ## Architecture
//!
//! Hexagonal layout:
//! - **Domain Layer:** identity, peer table, greeting values, errors
//! - **Ports Layer:** `RegistryClient`, `PeerConnector`/`PeerChannel`, `GreetHandler`
//! - **Service Layer:** connection manager, membership poller, greeter
//! - **Adapters Layer:** concrete registries and transport
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hn_membership::{InMemoryRegistry, MembershipConfig, MembershipPoller, NodeIdentity, RegistryClient};
//! use hn_membership::testing::MockPeerNetwork;
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! registry.register(&NodeIdentity::new("A", "10.0.0.1:5000")).await?;
//!
//! let network = MockPeerNetwork::new();
//! network.add_node("A", "10.0.0.1:5000");
//!
//! // Node "C" polls once and greets "A".
//! let mut poller = MembershipPoller::new("C", registry, network.clone(), MembershipConfig::default());
//! let report = poller.poll_once().await?;
//! assert_eq!(report.connected, 1);
//! assert_eq!(network.greets_to("10.0.0.1:5000"), vec!["C"]);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

/// Adapters for registries and transport.
/// Socket-based adapters require feature: `network`
pub mod adapters;

/// Mock peer network and test helpers.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// =============================================================================
// CORE RE-EXPORTS
// =============================================================================

pub use domain::{
    greeting_for, GreetReply, GreetRequest, MembershipConfig, NodeIdentity, PeerEntry, PeerError,
    PeerSnapshot, PeerTable, RegistryEntry, RegistryError,
};

pub use ports::{GreetHandler, PeerChannel, PeerConnector, RegistryClient};

pub use service::{
    ConnectOutcome, GreeterService, MembershipPoller, PeerConnectionManager, TickReport,
};

// =============================================================================
// ADAPTER RE-EXPORTS (Feature-Gated)
// =============================================================================

pub use adapters::{InMemoryRegistry, TimeoutRegistry};

#[cfg(feature = "network")]
pub use adapters::{GreetServer, RegistryServer, TcpPeerChannel, TcpPeerConnector, TcpRegistryClient};

#[cfg(feature = "etcd")]
pub use adapters::EtcdRegistry;
