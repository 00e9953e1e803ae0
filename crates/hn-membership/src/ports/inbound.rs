//! # Driving Ports (Inbound API)
//!
//! The operation every node exposes to its peers.

use crate::domain::{GreetReply, GreetRequest};

/// Server side of the Liveness Protocol.
///
/// Stateless with respect to the caller: the reply depends only on the
/// local node. No self-greet check happens here; callers filter themselves
/// out before greeting.
pub trait GreetHandler: Send + Sync {
    /// Answer a greet from `request.name`.
    fn greet(&self, request: GreetRequest) -> GreetReply;
}
