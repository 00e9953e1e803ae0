//! # Node Runtime
//!
//! Owns the lifecycle of one node.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Bind the greet listener and start answering greets
//! 3. Register `name -> advertised address` in the registry
//! 4. Spawn the membership poller
//!
//! A bind or registration failure aborts startup. Once the poller is
//! running, registry and peer failures only cost a tick.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use hn_membership::{
    GreetServer, GreeterService, MembershipPoller, NodeIdentity, PeerSnapshot, RegistryClient,
    RegistryError, TcpPeerChannel, TcpPeerConnector,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{ConfigError, NodeConfig};

/// Peer-table snapshot type published by a running node.
pub type NodeSnapshot = PeerSnapshot<TcpPeerChannel>;

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The greet listener could not be bound.
    #[error("failed to bind listener on {addr}: {source}")]
    ListenBindFailed {
        /// Requested listen address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The registry rejected or never saw the initial registration.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The configured registry backend was not compiled in.
    #[error("registry backend '{0}' is not available (rebuild with --features {0})")]
    BackendUnavailable(&'static str),
}

/// A node that has not started yet.
pub struct NodeRuntime {
    config: NodeConfig,
    registry: Arc<dyn RegistryClient>,
}

impl NodeRuntime {
    /// Create a runtime for `config` that registers in and polls `registry`.
    pub fn new(config: NodeConfig, registry: Arc<dyn RegistryClient>) -> Self {
        Self { config, registry }
    }

    /// Bind, register, and start polling.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the configuration is invalid, the
    /// listener cannot be bound, or the initial registration fails. In the
    /// last case the listener is stopped before returning.
    pub async fn start(self) -> Result<RunningNode, StartupError> {
        self.config.validate()?;
        let node = &self.config.node;

        let server = GreetServer::bind(&node.listen_addr)
            .await
            .map_err(|source| StartupError::ListenBindFailed {
                addr: node.listen_addr.clone(),
                source,
            })?;
        let local_addr = server
            .local_addr()
            .map_err(|source| StartupError::ListenBindFailed {
                addr: node.listen_addr.clone(),
                source,
            })?;

        let advertised = advertised_address(local_addr, node.advertise_addr.as_deref());
        let identity = NodeIdentity::new(node.name.clone(), advertised);
        info!(%identity, %local_addr, "Starting node");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let greeter = Arc::new(GreeterService::new(identity.clone()));
        let server_task = tokio::spawn(server.serve(greeter.clone(), shutdown_rx.clone()));

        if let Err(e) = self.registry.register(&identity).await {
            error!(%identity, error = %e, "Registration failed, stopping listener");
            let _ = shutdown_tx.send(true);
            let _ = server_task.await;
            return Err(e.into());
        }
        info!(%identity, "Registered");

        let poller = MembershipPoller::new(
            identity.name(),
            self.registry,
            TcpPeerConnector::new(),
            self.config.membership,
        );
        let peers = poller.subscribe();
        let poller_task = tokio::spawn(poller.run(shutdown_rx));

        Ok(RunningNode {
            identity,
            local_addr,
            greeter,
            peers,
            shutdown_tx,
            server_task,
            poller_task,
        })
    }
}

/// A started node: listener and poller running on background tasks.
pub struct RunningNode {
    identity: NodeIdentity,
    local_addr: SocketAddr,
    greeter: Arc<GreeterService>,
    peers: watch::Receiver<NodeSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<()>,
    poller_task: JoinHandle<()>,
}

impl RunningNode {
    /// Name and advertised address.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Address the listener actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Latest published peer table.
    pub fn peers(&self) -> NodeSnapshot {
        self.peers.borrow().clone()
    }

    /// Receiver that wakes after every poll tick.
    pub fn subscribe(&self) -> watch::Receiver<NodeSnapshot> {
        self.peers.clone()
    }

    /// Greets this node has answered.
    pub fn greets_served(&self) -> u64 {
        self.greeter.served()
    }

    /// Stop the listener and the poller and wait for both.
    pub async fn shutdown(self) {
        info!(identity = %self.identity, "Shutting down");
        let _ = self.shutdown_tx.send(true);
        self.wait().await;
    }

    /// Wait for the listener and poller tasks to end.
    pub async fn wait(self) {
        if let Err(e) = self.server_task.await {
            warn!(error = %e, "Greet server task ended abnormally");
        }
        if let Err(e) = self.poller_task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
    }
}

/// The address to register: the explicit override, else the bound address
/// with an unspecified IP replaced by loopback.
fn advertised_address(bound: SocketAddr, advertise: Option<&str>) -> String {
    if let Some(addr) = advertise {
        return addr.to_string();
    }
    if bound.ip().is_unspecified() {
        let loopback = match bound.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        warn!(
            %bound,
            "Listening on an unspecified address; advertising loopback (set --advertise for remote peers)"
        );
        return SocketAddr::new(loopback, bound.port()).to_string();
    }
    bound.to_string()
}
