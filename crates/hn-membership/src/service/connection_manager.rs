use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{PeerEntry, PeerError, PeerSnapshot, PeerTable};
use crate::ports::{PeerChannel, PeerConnector};

/// What `connect_if_new` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The name was already in the table; nothing was sent.
    AlreadyKnown,
    /// A new channel was opened, greeted, and stored.
    Connected {
        /// Greeting returned by the peer.
        greeting: String,
    },
}

/// Owns the peer table and opens channels lazily, once per peer name.
///
/// A peer only enters the table after a successful greet. Failed attempts
/// leave no trace, so the same name is tried again on the next call.
pub struct PeerConnectionManager<C: PeerConnector> {
    /// Name announced in every greet.
    local_name: String,
    connector: C,
    /// Bound on one connect-and-greet exchange.
    greet_timeout: Duration,
    peers: PeerTable<C::Channel>,
}

impl<C: PeerConnector> PeerConnectionManager<C> {
    /// Create a manager that greets as `local_name`.
    pub fn new(local_name: impl Into<String>, connector: C, greet_timeout: Duration) -> Self {
        Self {
            local_name: local_name.into(),
            connector,
            greet_timeout,
            peers: PeerTable::new(),
        }
    }

    /// Name this node greets with.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Read access to the peer table.
    pub fn peers(&self) -> &PeerTable<C::Channel> {
        &self.peers
    }

    /// Copy of the peer table for other tasks.
    pub fn snapshot(&self) -> PeerSnapshot<C::Channel> {
        self.peers.snapshot()
    }

    /// Connect to and greet `name` at `address` unless it is already known.
    ///
    /// # Errors
    ///
    /// - [`PeerError::ConnectFailed`] if no channel could be opened
    /// - [`PeerError::GreetFailed`] if the exchange failed or exceeded the timeout
    /// - [`PeerError::IdentityMismatch`] if the reply came from a different node
    ///
    /// In every error case the table is left unchanged.
    pub async fn connect_if_new(
        &mut self,
        name: &str,
        address: &str,
    ) -> Result<ConnectOutcome, PeerError> {
        if self.peers.contains(name) {
            return Ok(ConnectOutcome::AlreadyKnown);
        }

        debug!(peer = name, address, "Connecting to new peer");

        let exchange = async {
            let channel = self.connector.connect(address).await?;
            let reply = channel.greet(&self.local_name).await?;
            Ok::<_, PeerError>((channel, reply))
        };

        let (channel, reply) = match tokio::time::timeout(self.greet_timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PeerError::greet_failed(
                    address,
                    format!("timed out after {:?}", self.greet_timeout),
                ))
            }
        };

        if !reply.is_from(name) {
            return Err(PeerError::IdentityMismatch {
                address: address.to_string(),
                expected: name.to_string(),
                message: reply.message,
            });
        }

        info!(peer = name, address, greeting = %reply.message, "Greeting from new peer");

        self.peers.insert(
            name,
            PeerEntry {
                address: address.to_string(),
                greeting: reply.message.clone(),
                channel: Arc::new(channel),
            },
        );

        Ok(ConnectOutcome::Connected {
            greeting: reply.message,
        })
    }
}
