//! # Node Configuration
//!
//! Everything a node needs at startup: who it is, where it listens, which
//! registry it talks to, and the membership timings.
//!
//! All timeouts and intervals have sane defaults; [`NodeConfig::validate`]
//! rejects values that would stall the node.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use hn_membership::MembershipConfig;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Identity and listener settings.
    pub node: NodeSection,
    /// Registry connection settings.
    pub registry: RegistryConfig,
    /// Poll interval, greet timeout, startup delay.
    pub membership: MembershipConfig,
}

impl NodeConfig {
    /// Check the configuration before anything is bound or dialled.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the node name is empty
    /// - the poll interval, greet timeout, or registry timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.membership.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }
        if self.membership.greet_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("greet timeout"));
        }
        if self.registry.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("registry timeout"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No node name was given.
    #[error("node name must not be empty")]
    EmptyName,

    /// A timing value that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The registry endpoint could not be parsed.
    #[error("invalid registry endpoint '{endpoint}': {reason}")]
    InvalidRegistryEndpoint {
        /// The endpoint as given.
        endpoint: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Identity and listener settings.
#[derive(Debug, Clone)]
pub struct NodeSection {
    /// Node name, unique within the registry.
    pub name: String,
    /// Address the greet listener binds (`host:port`, port 0 allowed).
    pub listen_addr: String,
    /// Address written to the registry. Defaults to the bound address.
    pub advertise_addr: Option<String>,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            listen_addr: "127.0.0.1:5000".to_string(),
            advertise_addr: None,
        }
    }
}

/// Registry connection settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Which backend to use and where it lives.
    pub endpoint: RegistryEndpoint,
    /// Upper bound on a single registry request.
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: RegistryEndpoint::Tcp("127.0.0.1:2379".to_string()),
            request_timeout: Duration::from_secs(3),
        }
    }
}

/// A parsed registry endpoint.
///
/// Accepted forms:
/// - `tcp://host:port` or bare `host:port` - the dev registry server
/// - `etcd://host:port[,host:port...]` - an etcd cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEndpoint {
    /// Dev registry server.
    Tcp(String),
    /// etcd endpoints (`host:port` each).
    Etcd(Vec<String>),
}

impl FromStr for RegistryEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidRegistryEndpoint {
            endpoint: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix("etcd://") {
            let endpoints: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            if endpoints.is_empty() {
                return Err(invalid("no etcd endpoints given"));
            }
            if let Some(bad) = endpoints.iter().find(|e| !has_port(e)) {
                return Err(invalid(&format!("'{bad}' is not host:port")));
            }
            return Ok(Self::Etcd(endpoints));
        }

        let addr = trimmed.strip_prefix("tcp://").unwrap_or(trimmed);
        if addr.contains("://") {
            return Err(invalid("unknown scheme (expected tcp:// or etcd://)"));
        }
        if !has_port(addr) {
            return Err(invalid("expected host:port"));
        }
        Ok(Self::Tcp(addr.to_string()))
    }
}

impl fmt::Display for RegistryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Etcd(endpoints) => write!(f, "etcd://{}", endpoints.join(",")),
        }
    }
}

fn has_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
