//! Per-request deadline for registries that have none of their own.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{NodeIdentity, RegistryEntry, RegistryError};
use crate::ports::RegistryClient;

/// Wraps a [`RegistryClient`] so every call fails with
/// [`RegistryError::Unreachable`] once `timeout` has elapsed.
#[derive(Debug, Clone)]
pub struct TimeoutRegistry<R> {
    inner: R,
    timeout: Duration,
    label: String,
}

impl<R: RegistryClient> TimeoutRegistry<R> {
    /// Bound every call on `inner` by `timeout`. `label` names the backend
    /// in errors.
    pub fn new(inner: R, timeout: Duration, label: impl Into<String>) -> Self {
        Self {
            inner,
            timeout,
            label: label.into(),
        }
    }

    /// The wrapped registry.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn expired(&self) -> RegistryError {
        RegistryError::unreachable(&self.label, format!("timed out after {:?}", self.timeout))
    }
}

#[async_trait]
impl<R: RegistryClient> RegistryClient for TimeoutRegistry<R> {
    async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError> {
        tokio::time::timeout(self.timeout, self.inner.register(identity))
            .await
            .unwrap_or_else(|_| Err(self.expired()))
    }

    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        tokio::time::timeout(self.timeout, self.inner.list_all())
            .await
            .unwrap_or_else(|_| Err(self.expired()))
    }
}
