//! # Adapters
//!
//! Concrete implementations of the ports. Socket-based adapters are
//! feature-gated.

pub mod registry;

/// TCP transport for the Liveness Protocol.
/// Requires feature: `network`
#[cfg(feature = "network")]
pub mod transport;

pub use registry::{InMemoryRegistry, TimeoutRegistry};

#[cfg(feature = "network")]
pub use registry::{RegistryServer, TcpRegistryClient};

#[cfg(feature = "etcd")]
pub use registry::EtcdRegistry;

#[cfg(feature = "network")]
pub use transport::{GreetServer, TcpPeerChannel, TcpPeerConnector};
