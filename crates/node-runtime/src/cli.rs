//! Command-line interface.
//!
//! Every flag can also be set through a `HELLONODE_*` environment variable.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use hn_membership::MembershipConfig;

use crate::container::{ConfigError, NodeConfig, NodeSection, RegistryConfig, RegistryEndpoint};

/// hellonode: registry-driven peer membership with a greet handshake
#[derive(Parser, Debug)]
#[command(name = "hellonode", version)]
#[command(about = "Registry-driven peer membership with a greet-based liveness check")]
pub struct Cli {
    /// What to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a membership node
    Node(NodeArgs),
    /// Run the dev registry server
    Registry(RegistryArgs),
}

/// Flags for `hellonode node`.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Node name, unique within the registry
    #[arg(long, env = "HELLONODE_NAME")]
    pub name: String,

    /// Address to listen on for greets (port 0 picks a free port)
    #[arg(long, env = "HELLONODE_LISTEN", default_value = "127.0.0.1:5000")]
    pub listen: String,

    /// Address to register instead of the bound one
    #[arg(long, env = "HELLONODE_ADVERTISE")]
    pub advertise: Option<String>,

    /// Registry endpoint: tcp://host:port, host:port, or etcd://host:port[,host:port]
    #[arg(long, env = "HELLONODE_REGISTRY", default_value = "tcp://127.0.0.1:2379")]
    pub registry: String,

    /// Milliseconds between registry polls
    #[arg(long, env = "HELLONODE_POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Milliseconds allowed for one connect-and-greet
    #[arg(long, env = "HELLONODE_GREET_TIMEOUT_MS", default_value_t = 3000)]
    pub greet_timeout_ms: u64,

    /// Milliseconds to wait before the first poll
    #[arg(long, env = "HELLONODE_STARTUP_DELAY_MS", default_value_t = 0)]
    pub startup_delay_ms: u64,

    /// Milliseconds allowed for one registry request
    #[arg(long, env = "HELLONODE_REGISTRY_TIMEOUT_MS", default_value_t = 3000)]
    pub registry_timeout_ms: u64,
}

impl NodeArgs {
    /// Build and validate a [`NodeConfig`] from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed registry endpoint or any
    /// value [`NodeConfig::validate`] rejects.
    pub fn into_config(self) -> Result<NodeConfig, ConfigError> {
        let endpoint: RegistryEndpoint = self.registry.parse()?;
        let config = NodeConfig {
            node: NodeSection {
                name: self.name,
                listen_addr: self.listen,
                advertise_addr: self.advertise,
            },
            registry: RegistryConfig {
                endpoint,
                request_timeout: Duration::from_millis(self.registry_timeout_ms),
            },
            membership: MembershipConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                greet_timeout: Duration::from_millis(self.greet_timeout_ms),
                startup_delay: Duration::from_millis(self.startup_delay_ms),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Flags for `hellonode registry`.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Address the dev registry listens on
    #[arg(long, env = "HELLONODE_REGISTRY_LISTEN", default_value = "127.0.0.1:2379")]
    pub listen: String,
}
