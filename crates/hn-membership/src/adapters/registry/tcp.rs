//! Dev registry over TCP.
//!
//! A tiny key-value service for local clusters that have no etcd at hand.
//! The server keeps entries in an [`InMemoryRegistry`]; clients speak the
//! same framed codec as the greet transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::memory::InMemoryRegistry;
use crate::adapters::transport::wire::{read_frame, write_frame, WireError};
use crate::domain::{
    name_from_key, registry_key, NodeIdentity, RegistryEntry, RegistryError, REGISTRY_KEY_PREFIX,
};
use crate::ports::RegistryClient;

/// Request sent to the dev registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryRequest {
    /// Store `key -> value`, overwriting any previous value.
    Put {
        /// Full key.
        key: String,
        /// Value to store.
        value: String,
    },
    /// List stored pairs, optionally restricted to a key prefix.
    List {
        /// Key prefix filter.
        prefix: Option<String>,
    },
}

/// Reply from the dev registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryResponse {
    /// A `Put` was applied.
    Stored,
    /// Result of a `List`.
    Entries(Vec<(String, String)>),
    /// The request could not be served (store marked unreachable).
    Error(String),
}

// ============================================================================
// TcpRegistryClient
// ============================================================================

/// [`RegistryClient`] backed by the dev registry server.
///
/// Opens a fresh connection per call; every call is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct TcpRegistryClient {
    endpoint: String,
    timeout: Duration,
}

impl TcpRegistryClient {
    /// Create a client for `endpoint` (`host:port`).
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, request: RegistryRequest) -> Result<RegistryResponse, RegistryError> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.endpoint).await?;
            write_frame(&mut stream, &request).await?;
            read_frame::<_, RegistryResponse>(&mut stream).await
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(RegistryError::unreachable(&self.endpoint, e)),
            Err(_) => Err(RegistryError::unreachable(
                &self.endpoint,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

#[async_trait]
impl RegistryClient for TcpRegistryClient {
    async fn register(&self, identity: &NodeIdentity) -> Result<(), RegistryError> {
        let request = RegistryRequest::Put {
            key: registry_key(identity.name()),
            value: identity.address().to_string(),
        };
        match self.call(request).await? {
            RegistryResponse::Stored => Ok(()),
            RegistryResponse::Error(reason) => Err(RegistryError::RegistrationFailed {
                name: identity.name().to_string(),
                reason,
            }),
            other => Err(RegistryError::Malformed(format!(
                "unexpected reply to put: {other:?}"
            ))),
        }
    }

    async fn list_all(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        let request = RegistryRequest::List {
            prefix: Some(REGISTRY_KEY_PREFIX.to_string()),
        };
        match self.call(request).await? {
            RegistryResponse::Entries(pairs) => Ok(pairs
                .into_iter()
                .filter_map(|(key, address)| {
                    name_from_key(&key).map(|name| RegistryEntry::new(name, address))
                })
                .collect()),
            RegistryResponse::Error(reason) => Err(RegistryError::unreachable(&self.endpoint, reason)),
            other => Err(RegistryError::Malformed(format!(
                "unexpected reply to list: {other:?}"
            ))),
        }
    }
}

// ============================================================================
// RegistryServer
// ============================================================================

/// Serves an [`InMemoryRegistry`] over TCP.
pub struct RegistryServer {
    listener: TcpListener,
    registry: Arc<InMemoryRegistry>,
}

impl RegistryServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the address cannot be bound.
    pub async fn bind(addr: &str, registry: Arc<InMemoryRegistry>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` turns `true`.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Registry server listening");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(serve_connection(stream, remote, registry));
                    }
                    Err(e) => warn!(error = %e, "Failed to accept registry connection"),
                },
                _ = shutdown.changed() => {
                    info!("Registry server shutting down");
                    return;
                }
            }
        }
    }
}

async fn serve_connection(mut stream: TcpStream, remote: SocketAddr, registry: Arc<InMemoryRegistry>) {
    loop {
        let request: RegistryRequest = match read_frame(&mut stream).await {
            Ok(request) => request,
            Err(WireError::Closed) => return,
            Err(e) => {
                warn!(%remote, error = %e, "Dropping registry connection after bad frame");
                return;
            }
        };

        let response = match request {
            _ if registry.is_unreachable() => {
                warn!(%remote, "Registry store unavailable, refusing request");
                RegistryResponse::Error("registry store unavailable".to_string())
            }
            RegistryRequest::Put { key, value } => {
                info!(%key, %value, "Registry put");
                registry.put(key, value);
                RegistryResponse::Stored
            }
            RegistryRequest::List { prefix } => {
                let entries = registry.list(prefix.as_deref());
                debug!(%remote, count = entries.len(), "Registry list");
                RegistryResponse::Entries(entries)
            }
        };

        if let Err(e) = write_frame(&mut stream, &response).await {
            warn!(%remote, error = %e, "Failed to send registry reply");
            return;
        }
    }
}
