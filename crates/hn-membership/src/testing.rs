//! Centralized Testing Utilities
//!
//! In-process stand-ins for the network, used by this crate's tests and
//! available to other crates with the `test-utils` feature flag.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{GreetReply, NodeIdentity, PeerError, RegistryEntry, RegistryError};
use crate::ports::{PeerChannel, PeerConnector, RegistryClient};

pub use crate::adapters::InMemoryRegistry;

/// How a fake address behaves when dialled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Accepts connections and answers greets as the node `name`.
    Answer {
        /// Name used to build the greeting.
        name: String,
    },
    /// Refuses connections.
    Refuse,
    /// Accepts connections but never answers a greet.
    Hang,
}

#[derive(Debug, Default)]
struct MockNetworkState {
    behaviors: HashMap<String, MockBehavior>,
    connects: Vec<String>,
    /// `(callee address, caller name)` for every answered greet.
    greets: Vec<(String, String)>,
}

/// A fake network of addresses, usable as a [`PeerConnector`].
///
/// Clones share state, so a test can keep one handle for assertions and
/// hand another to the code under test. Unknown addresses refuse connections.
#[derive(Debug, Clone, Default)]
pub struct MockPeerNetwork {
    state: Arc<Mutex<MockNetworkState>>,
}

impl MockPeerNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `address` answer greets as `name`.
    pub fn add_node(&self, name: &str, address: &str) {
        self.set_behavior(
            address,
            MockBehavior::Answer {
                name: name.to_string(),
            },
        );
    }

    /// Set how `address` behaves from now on.
    pub fn set_behavior(&self, address: &str, behavior: MockBehavior) {
        self.state
            .lock()
            .behaviors
            .insert(address.to_string(), behavior);
    }

    /// Number of connection attempts made to `address`.
    pub fn connect_count(&self, address: &str) -> usize {
        self.state
            .lock()
            .connects
            .iter()
            .filter(|a| a.as_str() == address)
            .count()
    }

    /// Caller names of every greet answered at `address`, in order.
    pub fn greets_to(&self, address: &str) -> Vec<String> {
        self.state
            .lock()
            .greets
            .iter()
            .filter(|(callee, _)| callee == address)
            .map(|(_, caller)| caller.clone())
            .collect()
    }

    /// Total greets answered across all addresses.
    pub fn total_greets(&self) -> usize {
        self.state.lock().greets.len()
    }

    fn behavior(&self, address: &str) -> MockBehavior {
        self.state
            .lock()
            .behaviors
            .get(address)
            .cloned()
            .unwrap_or(MockBehavior::Refuse)
    }
}

#[async_trait]
impl PeerConnector for MockPeerNetwork {
    type Channel = MockChannel;

    async fn connect(&self, address: &str) -> Result<MockChannel, PeerError> {
        self.state.lock().connects.push(address.to_string());
        match self.behavior(address) {
            MockBehavior::Refuse => Err(PeerError::connect_failed(address, "connection refused")),
            MockBehavior::Answer { .. } | MockBehavior::Hang => Ok(MockChannel {
                address: address.to_string(),
                network: self.clone(),
            }),
        }
    }
}

/// Channel handed out by [`MockPeerNetwork`].
#[derive(Debug)]
pub struct MockChannel {
    address: String,
    network: MockPeerNetwork,
}

impl MockChannel {
    /// Address this channel was opened to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl PeerChannel for MockChannel {
    async fn greet(&self, caller: &str) -> Result<GreetReply, PeerError> {
        match self.network.behavior(&self.address) {
            MockBehavior::Answer { name } => {
                self.network
                    .state
                    .lock()
                    .greets
                    .push((self.address.clone(), caller.to_string()));
                Ok(GreetReply::from_callee(&name))
            }
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Refuse => Err(PeerError::greet_failed(&self.address, "connection reset")),
        }
    }
}

/// A registry that accepts calls and never answers them.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledRegistry;

#[async_trait]
impl RegistryClient for StalledRegistry {
    async fn register(&self, _identity: &NodeIdentity) -> Result<(), RegistryError> {
        std::future::pending().await
    }

    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        std::future::pending().await
    }
}
