use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::domain::{GreetReply, GreetRequest, NodeIdentity};
use crate::ports::GreetHandler;

/// Answers greets on behalf of the local node.
///
/// Reads only the local identity; it never touches the peer table.
#[derive(Debug)]
pub struct GreeterService {
    identity: NodeIdentity,
    served: AtomicU64,
}

impl GreeterService {
    /// Create a greeter for `identity`.
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            served: AtomicU64::new(0),
        }
    }

    /// Identity this greeter answers for.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Number of greets answered so far.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }
}

impl GreetHandler for GreeterService {
    fn greet(&self, request: GreetRequest) -> GreetReply {
        self.served.fetch_add(1, Ordering::Relaxed);
        info!(caller = %request.name, "Greet received");
        GreetReply::from_callee(self.identity.name())
    }
}
