//! # hellonode
//!
//! `hellonode node` binds a greet listener, registers itself in the shared
//! registry, and greets every peer it finds there once.
//! `hellonode registry` runs the dev registry server for local clusters.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hn_membership::{InMemoryRegistry, RegistryServer};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::cli::{Cli, Command, RegistryArgs};
use node_runtime::wiring::open_registry;
use node_runtime::{NodeConfig, NodeRuntime};

async fn run_node(config: NodeConfig) -> Result<()> {
    let registry = open_registry(&config.registry)
        .await
        .with_context(|| format!("Failed to open registry {}", config.registry.endpoint))?;

    let node = NodeRuntime::new(config, registry)
        .start()
        .await
        .context("Node startup failed")?;

    info!(identity = %node.identity(), "Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    node.shutdown().await;
    Ok(())
}

async fn run_registry(args: RegistryArgs) -> Result<()> {
    let store = Arc::new(InMemoryRegistry::new());
    let server = RegistryServer::bind(&args.listen, store)
        .await
        .with_context(|| format!("Failed to bind registry on {}", args.listen))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(server.serve(shutdown_rx));

    info!(listen = %args.listen, "Registry is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let _ = shutdown_tx.send(true);
    task.await.context("Registry task failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Node(args) => {
            let config = args.into_config().context("Invalid node configuration")?;
            run_node(config).await
        }
        Command::Registry(args) => run_registry(args).await,
    }
}
