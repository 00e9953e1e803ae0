//! # Driven Ports (Outbound SPI)
//!
//! Interfaces this crate **requires** from adapters: a registry to announce
//! and list nodes, and a way to open channels to peers.

use async_trait::async_trait;

use crate::domain::{GreetReply, NodeIdentity, PeerError, RegistryEntry, RegistryError};

/// Access to the shared key-value registry.
///
/// Pass-through only: implementations add no caching and no filtering.
/// Only eventual visibility of a `register` to later `list_all` calls is
/// assumed.
///
/// # Example Implementation
///
/// ```rust,ignore
/// #[async_trait]
/// impl RegistryClient for MyKvStore {
///     async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError> {
///         self.put(registry_key(identity.name()), identity.address()).await
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Write `name -> address` for this node.
    async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError>;

    /// Current snapshot of every registered entry, in backend order.
    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError>;
}

/// An open channel to one peer.
#[async_trait]
pub trait PeerChannel: Send + Sync {
    /// Perform one greet exchange, announcing `caller`.
    async fn greet(&self, caller: &str) -> Result<GreetReply, PeerError>;
}

/// Opens channels to peer addresses.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Channel type produced by this connector.
    type Channel: PeerChannel + 'static;

    /// Open a channel to `address`.
    ///
    /// Implementations need not bound the call; the connection manager
    /// wraps it in its own timeout.
    async fn connect(&self, address: &str) -> Result<Self::Channel, PeerError>;
}
