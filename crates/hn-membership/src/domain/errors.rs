//! Domain errors for membership and liveness checks.
//!
//! Startup treats every [`RegistryError`] as fatal. During polling the same
//! errors only skip the current tick. Every [`PeerError`] is non-fatal: the
//! peer stays unknown and is retried on the next tick.

use thiserror::Error;

/// Errors raised by a registry backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry endpoint could not be contacted.
    #[error("registry {endpoint} unreachable: {reason}")]
    Unreachable {
        /// Endpoint that was dialled.
        endpoint: String,
        /// Underlying failure.
        reason: String,
    },

    /// The registry was reached but refused or failed the write.
    #[error("failed to register {name}: {reason}")]
    RegistrationFailed {
        /// Node name being registered.
        name: String,
        /// Underlying failure.
        reason: String,
    },

    /// The registry answered with something that is not a valid entry list.
    #[error("malformed registry response: {0}")]
    Malformed(String),
}

impl RegistryError {
    /// Shorthand for [`RegistryError::Unreachable`].
    pub fn unreachable(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreachable {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while connecting to or greeting a peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// No channel could be opened to the peer's address.
    #[error("failed to connect to {address}: {reason}")]
    ConnectFailed {
        /// Address that was dialled.
        address: String,
        /// Underlying failure.
        reason: String,
    },

    /// The channel opened but the greet exchange failed or timed out.
    #[error("greet to {address} failed: {reason}")]
    GreetFailed {
        /// Address of the peer.
        address: String,
        /// Underlying failure.
        reason: String,
    },

    /// The peer answered, but not with the greeting of the expected node.
    #[error("peer at {address} is not {expected}: replied {message:?}")]
    IdentityMismatch {
        /// Address of the peer.
        address: String,
        /// Name the registry listed for this address.
        expected: String,
        /// What the peer actually said.
        message: String,
    },
}

impl PeerError {
    /// Shorthand for [`PeerError::ConnectFailed`].
    pub fn connect_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::ConnectFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`PeerError::GreetFailed`].
    pub fn greet_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::GreetFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
