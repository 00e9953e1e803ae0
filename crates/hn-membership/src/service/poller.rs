use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::{MembershipConfig, PeerSnapshot, RegistryError};
use crate::ports::{PeerConnector, RegistryClient};
use crate::service::connection_manager::{ConnectOutcome, PeerConnectionManager};

/// Poller state. A tick always runs to completion before returning to `Idle`.
///
/// `poll_once` holds `&mut self` for the whole tick, so `Polling` is only
/// visible from inside the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollerState {
    /// Between ticks.
    Idle,
    /// A discovery cycle is in progress.
    Polling,
}

/// Counters for one successful tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entries returned by the registry.
    pub listed: usize,
    /// Entries skipped because they name this node.
    pub skipped_self: usize,
    /// Entries already in the peer table.
    pub already_known: usize,
    /// Peers connected and greeted during this tick.
    pub connected: usize,
    /// Peers that could not be connected or greeted.
    pub failed: usize,
}

/// Periodically lists the registry and connects to peers it has not seen.
///
/// The poller is the only writer of the peer table. After every tick it
/// publishes a [`PeerSnapshot`] on a watch channel for other tasks.
pub struct MembershipPoller<R: RegistryClient + ?Sized, C: PeerConnector> {
    registry: Arc<R>,
    manager: PeerConnectionManager<C>,
    config: MembershipConfig,
    #[cfg_attr(not(test), allow(dead_code))]
    state: PollerState,
    snapshot_tx: watch::Sender<PeerSnapshot<C::Channel>>,
}

impl<R, C> MembershipPoller<R, C>
where
    R: RegistryClient + ?Sized,
    C: PeerConnector,
{
    /// Create a poller that greets as `local_name`.
    pub fn new(
        local_name: impl Into<String>,
        registry: Arc<R>,
        connector: C,
        config: MembershipConfig,
    ) -> Self {
        let manager = PeerConnectionManager::new(local_name, connector, config.greet_timeout);
        let (snapshot_tx, _) = watch::channel(PeerSnapshot::empty());
        Self {
            registry,
            manager,
            config,
            state: PollerState::Idle,
            snapshot_tx,
        }
    }

    /// Subscribe to peer-table snapshots published after each tick.
    pub fn subscribe(&self) -> watch::Receiver<PeerSnapshot<C::Channel>> {
        self.snapshot_tx.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PollerState {
        self.state
    }

    /// The connection manager driven by this poller.
    pub fn manager(&self) -> &PeerConnectionManager<C> {
        &self.manager
    }

    /// Run one discovery cycle.
    ///
    /// # Errors
    ///
    /// Returns the registry error if listing failed. The peer table is not
    /// touched in that case. Per-peer failures are counted in the report,
    /// not returned.
    pub async fn poll_once(&mut self) -> Result<TickReport, RegistryError> {
        self.state = PollerState::Polling;
        let result = self.discover().await;
        self.state = PollerState::Idle;
        self.publish();
        result
    }

    async fn discover(&mut self) -> Result<TickReport, RegistryError> {
        let entries = self.registry.list_all().await?;
        let mut report = TickReport {
            listed: entries.len(),
            ..TickReport::default()
        };

        for entry in entries {
            if entry.name == self.manager.local_name() {
                report.skipped_self += 1;
                continue;
            }

            match self.manager.connect_if_new(&entry.name, &entry.address).await {
                Ok(ConnectOutcome::AlreadyKnown) => report.already_known += 1,
                Ok(ConnectOutcome::Connected { .. }) => report.connected += 1,
                Err(e) => {
                    warn!(peer = %entry.name, address = %entry.address, error = %e, "Peer not reachable, will retry next tick");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    fn publish(&self) {
        // send_replace keeps the latest value even with no subscribers
        self.snapshot_tx.send_replace(self.manager.snapshot());
    }

    /// Tick forever at the configured interval until `shutdown` turns `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.startup_delay.is_zero() {
            debug!(delay = ?self.config.startup_delay, "Waiting before first poll");
            tokio::select! {
                _ = tokio::time::sleep(self.config.startup_delay) => {}
                _ = shutdown.changed() => return,
            }
        }

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            node = self.manager.local_name(),
            interval = ?self.config.poll_interval,
            "Membership poller started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("Membership poller shutting down");
                    return;
                }
            }

            match self.poll_once().await {
                Ok(report) if report.connected > 0 || report.failed > 0 => {
                    info!(
                        listed = report.listed,
                        connected = report.connected,
                        failed = report.failed,
                        known = self.manager.peers().len(),
                        "Poll tick complete"
                    );
                }
                Ok(report) => {
                    debug!(listed = report.listed, known = self.manager.peers().len(), "Poll tick: no changes");
                }
                Err(e) => {
                    warn!(error = %e, "Registry listing failed, skipping tick");
                }
            }
        }
    }
}
