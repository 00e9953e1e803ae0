//! # Membership Integration Tests
//!
//! Real nodes on loopback (port 0) sharing one registry. Covers the
//! startup sequence, mutual discovery, and greeting through stored
//! handles.

use std::net::TcpListener as StdListener;
use std::sync::Arc;
use std::time::Duration;

use hn_membership::{
    InMemoryRegistry, MembershipConfig, PeerChannel, RegistryClient, RegistryError,
    RegistryServer, TcpRegistryClient,
};
use node_runtime::container::{NodeSection, RegistryConfig};
use node_runtime::{NodeConfig, NodeRuntime, RunningNode, StartupError};
use tokio::sync::watch;
use tokio::time::timeout;

fn node_config(name: &str) -> NodeConfig {
    NodeConfig {
        node: NodeSection {
            name: name.to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
            advertise_addr: None,
        },
        registry: RegistryConfig::default(),
        membership: MembershipConfig::for_testing(),
    }
}

async fn start_node(name: &str, registry: Arc<dyn RegistryClient>) -> RunningNode {
    NodeRuntime::new(node_config(name), registry)
        .start()
        .await
        .expect("node should start")
}

/// Wait until `node` knows exactly `expected`.
async fn wait_for_peers(node: &RunningNode, expected: &[&str]) {
    let mut peers = node.subscribe();
    let found = timeout(Duration::from_secs(5), async {
        loop {
            if peers.borrow_and_update().names() == expected {
                return;
            }
            peers.changed().await.expect("poller stopped early");
        }
    })
    .await;
    assert!(
        found.is_ok(),
        "{} never saw {expected:?}, has {:?}",
        node.identity().name(),
        node.peers().names()
    );
}

#[tokio::test]
async fn test_two_nodes_discover_each_other() {
    let registry = Arc::new(InMemoryRegistry::new());

    let n1 = start_node("N1", registry.clone()).await;
    let n2 = start_node("N2", registry.clone()).await;

    wait_for_peers(&n1, &["N2"]).await;
    wait_for_peers(&n2, &["N1"]).await;

    let entries = registry.list_all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .any(|e| e.name == "N1" && e.address == n1.local_addr().to_string()));

    n1.shutdown().await;
    n2.shutdown().await;
}

#[tokio::test]
async fn test_stored_handle_greets_remote_node() {
    let registry = Arc::new(InMemoryRegistry::new());
    let n1 = start_node("N1", registry.clone()).await;
    let n2 = start_node("N2", registry.clone()).await;
    wait_for_peers(&n1, &["N2"]).await;

    let peers = n1.peers();
    let entry = peers.get("N2").expect("N2 in peer table");
    assert_eq!(entry.address, n2.local_addr().to_string());
    assert!(entry.greeting.contains("N2"));

    let served_before = n2.greets_served();
    let reply = entry.channel.greet("N1").await.unwrap();

    assert!(reply.message.contains("N2"));
    assert!(!reply.message.contains("N1"));
    assert_eq!(n2.greets_served(), served_before + 1);

    n1.shutdown().await;
    n2.shutdown().await;
}

#[tokio::test]
async fn test_single_node_never_greets_itself() {
    let registry = Arc::new(InMemoryRegistry::new());
    let solo = start_node("N1", registry).await;

    let mut peers = solo.subscribe();
    for _ in 0..3 {
        timeout(Duration::from_secs(5), peers.changed())
            .await
            .expect("tick")
            .unwrap();
    }

    assert!(solo.peers().is_empty());
    assert_eq!(solo.greets_served(), 0);
    solo.shutdown().await;
}

#[tokio::test]
async fn test_nodes_over_dev_registry_server() {
    let store = Arc::new(InMemoryRegistry::new());
    let server = RegistryServer::bind("127.0.0.1:0", store.clone())
        .await
        .unwrap();
    let endpoint = server.local_addr().unwrap().to_string();
    let (stop_registry, registry_rx) = watch::channel(false);
    tokio::spawn(server.serve(registry_rx));

    let client = || -> Arc<dyn RegistryClient> {
        Arc::new(TcpRegistryClient::new(endpoint.clone(), Duration::from_secs(1)))
    };
    let n1 = start_node("N1", client()).await;
    let n2 = start_node("N2", client()).await;

    wait_for_peers(&n1, &["N2"]).await;
    wait_for_peers(&n2, &["N1"]).await;
    assert_eq!(store.len(), 2);

    n1.shutdown().await;
    n2.shutdown().await;
    let _ = stop_registry.send(true);
}

#[tokio::test]
async fn test_late_joiner_is_discovered() {
    let registry = Arc::new(InMemoryRegistry::new());
    let n1 = start_node("N1", registry.clone()).await;
    let n2 = start_node("N2", registry.clone()).await;
    wait_for_peers(&n1, &["N2"]).await;

    let n3 = start_node("N3", registry.clone()).await;

    wait_for_peers(&n1, &["N2", "N3"]).await;
    wait_for_peers(&n2, &["N1", "N3"]).await;
    wait_for_peers(&n3, &["N1", "N2"]).await;

    for node in [n1, n2, n3] {
        node.shutdown().await;
    }
}

#[tokio::test]
async fn test_registration_failure_aborts_startup() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.set_unreachable(true);

    let result = NodeRuntime::new(node_config("N1"), registry).start().await;

    assert!(matches!(
        result,
        Err(StartupError::Registry(RegistryError::Unreachable { .. }))
    ));
}

#[tokio::test]
async fn test_bind_failure_aborts_startup() {
    let taken = StdListener::bind("127.0.0.1:0").unwrap();
    let mut config = node_config("N1");
    config.node.listen_addr = taken.local_addr().unwrap().to_string();
    let registry = Arc::new(InMemoryRegistry::new());

    let result = NodeRuntime::new(config, registry.clone()).start().await;

    assert!(matches!(result, Err(StartupError::ListenBindFailed { .. })));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_invalid_config_aborts_startup() {
    let registry = Arc::new(InMemoryRegistry::new());

    let result = NodeRuntime::new(node_config(""), registry).start().await;

    assert!(matches!(result, Err(StartupError::Config(_))));
}

#[tokio::test]
async fn test_advertise_override_is_registered() {
    let registry = Arc::new(InMemoryRegistry::new());
    let mut config = node_config("N1");
    config.node.advertise_addr = Some("node1.example:7000".to_string());

    let node = NodeRuntime::new(config, registry.clone())
        .start()
        .await
        .unwrap();

    assert_eq!(node.identity().address(), "node1.example:7000");
    let entries = registry.list_all().await.unwrap();
    assert_eq!(entries[0].address, "node1.example:7000");
    node.shutdown().await;
}
