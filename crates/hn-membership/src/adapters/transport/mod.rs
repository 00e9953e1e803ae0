//! # TCP Transport
//!
//! Connection-oriented transport for the Liveness Protocol: a framed
//! `bincode` codec, the inbound [`GreetServer`], and the outbound
//! [`TcpPeerConnector`] whose channels stay open for later greets.

mod client;
mod server;
pub mod wire;

pub use client::{TcpPeerChannel, TcpPeerConnector};
pub use server::GreetServer;
pub use wire::{WireError, MAX_FRAME_LEN};
