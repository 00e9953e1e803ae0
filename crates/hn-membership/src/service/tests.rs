//! Tests for the membership service layer

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::poller::PollerState;
use super::*;
use crate::adapters::TimeoutRegistry;
use crate::domain::{MembershipConfig, NodeIdentity, PeerError, RegistryError};
use crate::ports::{GreetHandler, PeerChannel, RegistryClient};
use crate::testing::{InMemoryRegistry, MockBehavior, MockPeerNetwork, StalledRegistry};
use crate::GreetRequest;

const ADDR_A: &str = "10.0.0.1:5000";
const ADDR_B: &str = "10.0.0.2:5000";
const ADDR_C: &str = "10.0.0.3:5000";
const ADDR_X: &str = "10.0.0.9:5000";

/// Registers each `(name, address)` pair in a fresh shared registry.
async fn registry_with(nodes: &[(&str, &str)]) -> Arc<InMemoryRegistry> {
    let registry = Arc::new(InMemoryRegistry::new());
    for (name, address) in nodes {
        registry
            .register(&NodeIdentity::new(*name, *address))
            .await
            .unwrap();
    }
    registry
}

fn poller_for(
    local: &str,
    registry: Arc<InMemoryRegistry>,
    network: &MockPeerNetwork,
) -> MembershipPoller<InMemoryRegistry, MockPeerNetwork> {
    MembershipPoller::new(local, registry, network.clone(), MembershipConfig::for_testing())
}

// =============================================================================
// PeerConnectionManager
// =============================================================================

#[tokio::test]
async fn test_connect_if_new_is_idempotent() {
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let mut manager = PeerConnectionManager::new("C", network.clone(), Duration::from_secs(1));

    let first = manager.connect_if_new("A", ADDR_A).await.unwrap();
    let second = manager.connect_if_new("A", ADDR_A).await.unwrap();

    assert_eq!(
        first,
        ConnectOutcome::Connected {
            greeting: "Hello from A".into()
        }
    );
    assert_eq!(second, ConnectOutcome::AlreadyKnown);
    assert_eq!(manager.peers().len(), 1);
    assert_eq!(network.connect_count(ADDR_A), 1);
    assert_eq!(network.greets_to(ADDR_A), vec!["C".to_string()]);
}

#[tokio::test]
async fn test_refused_connection_leaves_peer_absent() {
    let network = MockPeerNetwork::new();
    let mut manager = PeerConnectionManager::new("C", network.clone(), Duration::from_secs(1));

    let result = manager.connect_if_new("X", ADDR_X).await;

    assert!(matches!(result, Err(PeerError::ConnectFailed { .. })));
    assert!(!manager.peers().contains("X"));
}

#[tokio::test(start_paused = true)]
async fn test_hanging_peer_times_out_as_greet_failure() {
    let network = MockPeerNetwork::new();
    network.set_behavior(ADDR_X, MockBehavior::Hang);
    let mut manager = PeerConnectionManager::new("C", network.clone(), Duration::from_secs(3));

    let result = manager.connect_if_new("X", ADDR_X).await;

    match result {
        Err(PeerError::GreetFailed { address, reason }) => {
            assert_eq!(address, ADDR_X);
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected GreetFailed, got {other:?}"),
    }
    assert!(manager.peers().is_empty());
}

#[tokio::test]
async fn test_wrong_identity_is_rejected() {
    let network = MockPeerNetwork::new();
    // Registry says X lives here, but Z answers.
    network.add_node("Z", ADDR_X);
    let mut manager = PeerConnectionManager::new("C", network.clone(), Duration::from_secs(1));

    let result = manager.connect_if_new("X", ADDR_X).await;

    assert!(matches!(result, Err(PeerError::IdentityMismatch { .. })));
    assert!(!manager.peers().contains("X"));
}

#[tokio::test]
async fn test_stored_handle_greets_the_remote() {
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let mut manager = PeerConnectionManager::new("C", network.clone(), Duration::from_secs(1));
    manager.connect_if_new("A", ADDR_A).await.unwrap();

    let entry = manager.peers().get("A").unwrap();
    let reply = entry.channel.greet("C").await.unwrap();

    assert_eq!(reply.message, "Hello from A");
    assert_eq!(entry.greeting, "Hello from A");
    assert_eq!(network.greets_to(ADDR_A).len(), 2);
}

// =============================================================================
// MembershipPoller
// =============================================================================

#[tokio::test]
async fn test_one_tick_connects_every_listed_peer() {
    let registry = registry_with(&[("A", ADDR_A), ("B", ADDR_B), ("C", ADDR_C)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    network.add_node("B", ADDR_B);
    network.add_node("C", ADDR_C);
    let mut poller = poller_for("C", registry, &network);

    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.listed, 3);
    assert_eq!(report.skipped_self, 1);
    assert_eq!(report.connected, 2);
    assert_eq!(poller.manager().peers().names(), vec!["A", "B"]);
    assert_eq!(network.greets_to(ADDR_A), vec!["C".to_string()]);
    assert_eq!(network.greets_to(ADDR_B), vec!["C".to_string()]);
    // No self-greet
    assert_eq!(network.connect_count(ADDR_C), 0);
}

#[tokio::test]
async fn test_own_name_never_enters_table() {
    let registry = registry_with(&[("C", ADDR_C)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("C", ADDR_C);
    network.add_node("A", ADDR_A);
    let mut poller = poller_for("C", registry.clone(), &network);

    for round in 0..3 {
        if round == 1 {
            registry.register(&NodeIdentity::new("A", ADDR_A)).await.unwrap();
        }
        poller.poll_once().await.unwrap();
        assert!(!poller.manager().peers().contains("C"));
    }

    assert_eq!(poller.manager().peers().names(), vec!["A"]);
    assert_eq!(network.total_greets(), 1);
}

#[tokio::test]
async fn test_second_tick_greets_nobody_new() {
    let registry = registry_with(&[("A", ADDR_A), ("B", ADDR_B)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    network.add_node("B", ADDR_B);
    let mut poller = poller_for("C", registry, &network);

    poller.poll_once().await.unwrap();
    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.already_known, 2);
    assert_eq!(report.connected, 0);
    assert_eq!(network.total_greets(), 2);
}

#[tokio::test]
async fn test_failed_listing_leaves_table_unchanged() {
    let registry = registry_with(&[("A", ADDR_A)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    network.add_node("B", ADDR_B);
    let mut poller = poller_for("C", registry.clone(), &network);
    poller.poll_once().await.unwrap();
    let before = poller.manager().peers().names();

    registry.register(&NodeIdentity::new("B", ADDR_B)).await.unwrap();
    registry.set_unreachable(true);
    let result = poller.poll_once().await;

    assert!(matches!(result, Err(RegistryError::Unreachable { .. })));
    assert_eq!(poller.manager().peers().names(), before);
    assert_eq!(poller.state(), PollerState::Idle);
    assert_eq!(network.connect_count(ADDR_B), 0);
}

#[tokio::test]
async fn test_unreachable_peer_is_retried_next_tick() {
    let registry = registry_with(&[("X", ADDR_X)]).await;
    let network = MockPeerNetwork::new();
    let mut poller = poller_for("C", registry, &network);

    let first = poller.poll_once().await.unwrap();
    assert_eq!(first.failed, 1);
    assert!(!poller.manager().peers().contains("X"));

    let second = poller.poll_once().await.unwrap();
    assert_eq!(second.failed, 1);
    assert_eq!(network.connect_count(ADDR_X), 2);

    network.add_node("X", ADDR_X);
    let third = poller.poll_once().await.unwrap();
    assert_eq!(third.connected, 1);
    assert!(poller.manager().peers().contains("X"));
}

#[tokio::test]
async fn test_one_failing_peer_does_not_block_others() {
    let registry = registry_with(&[("A", ADDR_A), ("X", ADDR_X), ("B", ADDR_B)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    network.add_node("B", ADDR_B);
    network.set_behavior(ADDR_X, MockBehavior::Hang);
    let mut poller = MembershipPoller::new(
        "C",
        registry,
        network.clone(),
        MembershipConfig::for_testing().with_greet_timeout(Duration::from_millis(20)),
    );

    let report = poller.poll_once().await.unwrap();

    assert_eq!(report.connected, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(poller.manager().peers().names(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_snapshot_published_after_tick() {
    let registry = registry_with(&[("A", ADDR_A)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let mut poller = poller_for("C", registry, &network);
    let snapshots = poller.subscribe();

    assert!(snapshots.borrow().is_empty());
    poller.poll_once().await.unwrap();

    assert!(snapshots.has_changed().unwrap());
    assert_eq!(snapshots.borrow().names(), vec!["A"]);
}

#[tokio::test]
async fn test_run_discovers_late_joiner_and_stops_on_shutdown() {
    let registry = registry_with(&[("A", ADDR_A)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    network.add_node("B", ADDR_B);
    let poller = poller_for("C", registry.clone(), &network);
    let mut snapshots = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(poller.run(shutdown_rx));

    registry.register(&NodeIdentity::new("B", ADDR_B)).await.unwrap();
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            snapshots.changed().await.unwrap();
            if snapshots.borrow().len() == 2 {
                return;
            }
        }
    })
    .await;
    assert!(found.is_ok(), "late joiner was never discovered");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller did not stop")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stalled_registry_fails_tick_instead_of_blocking() {
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let registry = Arc::new(TimeoutRegistry::new(
        StalledRegistry,
        Duration::from_secs(3),
        "stalled",
    ));
    let mut poller = MembershipPoller::new("C", registry, network.clone(), MembershipConfig::for_testing());

    let result = tokio::time::timeout(Duration::from_secs(3600), poller.poll_once())
        .await
        .expect("tick never finished");

    assert!(matches!(result, Err(RegistryError::Unreachable { .. })));
    assert_eq!(poller.state(), PollerState::Idle);
    assert!(poller.manager().peers().is_empty());
    assert_eq!(network.connect_count(ADDR_A), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_waits_for_startup_delay() {
    let registry = registry_with(&[("A", ADDR_A)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let poller = MembershipPoller::new(
        "C",
        registry,
        network.clone(),
        MembershipConfig::for_testing().with_startup_delay(Duration::from_secs(5)),
    );
    let mut snapshots = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let started = tokio::time::Instant::now();

    let handle = tokio::spawn(poller.run(shutdown_rx));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(network.connect_count(ADDR_A), 0);
    assert!(!snapshots.has_changed().unwrap());

    tokio::time::timeout(Duration::from_secs(5), snapshots.changed())
        .await
        .expect("first tick never ran")
        .unwrap();
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(network.connect_count(ADDR_A), 1);
    assert_eq!(snapshots.borrow().names(), vec!["A"]);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_startup_delay_skips_polling() {
    let registry = registry_with(&[("A", ADDR_A)]).await;
    let network = MockPeerNetwork::new();
    network.add_node("A", ADDR_A);
    let poller = MembershipPoller::new(
        "C",
        registry,
        network.clone(),
        MembershipConfig::for_testing().with_startup_delay(Duration::from_secs(60)),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(poller.run(shutdown_rx));
    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("poller ignored shutdown during startup delay")
        .unwrap();
    assert_eq!(network.connect_count(ADDR_A), 0);
}

// =============================================================================
// GreeterService
// =============================================================================

#[test]
fn test_greeter_replies_with_own_name() {
    let greeter = GreeterService::new(NodeIdentity::new("N2", "127.0.0.1:5002"));

    let reply = greeter.greet(GreetRequest::new("N1"));

    assert_eq!(reply.message, "Hello from N2");
    assert!(!reply.message.contains("N1"));
    assert_eq!(greeter.served(), 1);
}
