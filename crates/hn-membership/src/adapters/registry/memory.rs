use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{NodeIdentity, RegistryEntry, RegistryError};
use crate::ports::RegistryClient;

// ============================================================================
// InMemoryRegistry - shared registry for in-process clusters and tests
// ============================================================================

/// Registry held in process memory.
///
/// Share one instance through an `Arc` between several nodes to simulate a
/// common registry. Also backs the dev registry server.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: RwLock<BTreeMap<String, String>>,
    unreachable: AtomicBool,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`RegistryError::Unreachable`] until reset.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Whether [`set_unreachable`](Self::set_unreachable) is in effect.
    pub fn is_unreachable(&self) -> bool {
        self.unreachable.load(Ordering::SeqCst)
    }

    /// Raw key/value write, used by the dev registry server.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Raw key/value listing, optionally limited to a key prefix.
    pub fn list(&self, prefix: Option<&str>) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_reachable(&self) -> Result<(), RegistryError> {
        if self.is_unreachable() {
            return Err(RegistryError::unreachable("in-memory", "registry marked unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for InMemoryRegistry {
    async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError> {
        self.check_reachable()?;
        self.put(identity.name(), identity.address());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        self.check_reachable()?;
        Ok(self
            .list(None)
            .into_iter()
            .map(|(name, address)| RegistryEntry::new(name, address))
            .collect())
    }
}
