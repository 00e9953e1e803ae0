//! # Membership Service
//!
//! Wires the domain to the ports:
//!
//! - [`PeerConnectionManager`]: lazy, once-per-name connect-and-greet
//! - [`MembershipPoller`]: fixed-interval registry diffing
//! - [`GreeterService`]: the local answer to inbound greets

mod connection_manager;
mod greeter;
mod poller;

pub use connection_manager::{ConnectOutcome, PeerConnectionManager};
pub use greeter::GreeterService;
pub use poller::{MembershipPoller, TickReport};

#[cfg(test)]
mod tests;
