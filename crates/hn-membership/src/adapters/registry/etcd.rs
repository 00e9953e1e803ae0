//! etcd-backed registry.
//!
//! Each node writes `/hellonode/nodes/<name> = <address>` once at startup.
//! Entries are written without a lease, so they outlive a crashed node.

use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, GetOptions};
use tracing::debug;

use crate::domain::{
    name_from_key, registry_key, NodeIdentity, RegistryEntry, RegistryError, REGISTRY_KEY_PREFIX,
};
use crate::ports::RegistryClient;

/// [`RegistryClient`] backed by an etcd cluster.
#[derive(Clone)]
pub struct EtcdRegistry {
    client: Client,
    endpoints: Vec<String>,
}

impl EtcdRegistry {
    /// Connect to the given etcd endpoints.
    ///
    /// `timeout` bounds the initial connect and every later request.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unreachable`] if no endpoint answers.
    pub async fn connect(endpoints: Vec<String>, timeout: Duration) -> Result<Self, RegistryError> {
        let options = ConnectOptions::new()
            .with_connect_timeout(timeout)
            .with_timeout(timeout);
        let client = Client::connect(&endpoints, Some(options))
            .await
            .map_err(|e| RegistryError::unreachable(endpoints.join(","), e))?;
        debug!(?endpoints, ?timeout, "Connected to etcd");
        Ok(Self { client, endpoints })
    }

    fn endpoint_label(&self) -> String {
        self.endpoints.join(",")
    }
}

#[async_trait]
impl RegistryClient for EtcdRegistry {
    async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError> {
        let mut client = self.client.clone();
        client
            .put(registry_key(identity.name()), identity.address(), None)
            .await
            .map_err(|e| RegistryError::RegistrationFailed {
                name: identity.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let mut client = self.client.clone();
        let response = client
            .get(REGISTRY_KEY_PREFIX, Some(GetOptions::new().with_prefix()))
            .await
            .map_err(|e| RegistryError::unreachable(self.endpoint_label(), e))?;

        let mut entries = Vec::with_capacity(response.kvs().len());
        for kv in response.kvs() {
            let key = kv
                .key_str()
                .map_err(|e| RegistryError::Malformed(e.to_string()))?;
            let address = kv
                .value_str()
                .map_err(|e| RegistryError::Malformed(e.to_string()))?;
            if let Some(name) = name_from_key(key) {
                entries.push(RegistryEntry::new(name, address));
            }
        }
        Ok(entries)
    }
}
