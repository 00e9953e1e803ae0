//! Peer table: name -> established channel.
//!
//! ## Invariants
//!
//! - At most one entry per peer name is ever created.
//! - Once present, an entry is never replaced or removed.
//!
//! The table has a single writer (the membership poller, through the
//! connection manager). Other tasks only ever see [`PeerSnapshot`] copies.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One known peer.
#[derive(Debug)]
pub struct PeerEntry<H> {
    /// Address the channel was opened to.
    pub address: String,
    /// Greeting received during the handshake.
    pub greeting: String,
    /// Shared handle to the open channel.
    pub channel: Arc<H>,
}

impl<H> Clone for PeerEntry<H> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            greeting: self.greeting.clone(),
            channel: Arc::clone(&self.channel),
        }
    }
}

/// Mapping from peer name to its established channel.
#[derive(Debug)]
pub struct PeerTable<H> {
    entries: HashMap<String, PeerEntry<H>>,
}

impl<H> PeerTable<H> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Whether `name` already has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up a peer.
    pub fn get(&self, name: &str) -> Option<&PeerEntry<H>> {
        self.entries.get(name)
    }

    /// Insert a new peer.
    ///
    /// Returns `false` and leaves the table untouched if `name` is already
    /// present; existing entries are never replaced.
    pub fn insert(&mut self, name: impl Into<String>, entry: PeerEntry<H>) -> bool {
        match self.entries.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    /// Number of known peers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peer is known yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Known peer names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy the current contents for readers outside the owning task.
    pub fn snapshot(&self) -> PeerSnapshot<H> {
        let peers = self
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        PeerSnapshot {
            peers: Arc::new(peers),
        }
    }
}

impl<H> Default for PeerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of a [`PeerTable`], cheap to clone.
#[derive(Debug)]
pub struct PeerSnapshot<H> {
    peers: Arc<BTreeMap<String, PeerEntry<H>>>,
}

impl<H> PeerSnapshot<H> {
    /// Snapshot with no peers.
    pub fn empty() -> Self {
        Self {
            peers: Arc::new(BTreeMap::new()),
        }
    }

    /// Whether `name` was known when the snapshot was taken.
    pub fn contains(&self, name: &str) -> bool {
        self.peers.contains_key(name)
    }

    /// Look up a peer.
    pub fn get(&self, name: &str) -> Option<&PeerEntry<H>> {
        self.peers.get(name)
    }

    /// Known peer names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.peers.keys().cloned().collect()
    }

    /// Number of peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the snapshot holds no peers.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate peers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PeerEntry<H>)> {
        self.peers.iter()
    }
}

impl<H> Clone for PeerSnapshot<H> {
    fn clone(&self) -> Self {
        Self {
            peers: Arc::clone(&self.peers),
        }
    }
}

impl<H> Default for PeerSnapshot<H> {
    fn default() -> Self {
        Self::empty()
    }
}
