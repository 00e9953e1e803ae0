//! Liveness Protocol values.
//!
//! A greet is a single request/response pair: the caller sends its own
//! name and the callee answers with a greeting derived from *its* name.
//! Nothing else travels on the wire and no state is kept between calls.

/// Request half of a greet: who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "network", derive(serde::Serialize, serde::Deserialize))]
pub struct GreetRequest {
    /// The caller's node name.
    pub name: String,
}

impl GreetRequest {
    /// Create a request announcing `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Reply half of a greet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "network", derive(serde::Serialize, serde::Deserialize))]
pub struct GreetReply {
    /// Human-readable greeting naming the callee.
    pub message: String,
}

impl GreetReply {
    /// The reply a node called `callee` always gives.
    pub fn from_callee(callee: &str) -> Self {
        Self {
            message: greeting_for(callee),
        }
    }

    /// Whether this reply is the one `callee` would have produced.
    pub fn is_from(&self, callee: &str) -> bool {
        self.message == greeting_for(callee)
    }
}

/// Deterministic greeting text for a callee name.
pub fn greeting_for(callee: &str) -> String {
    format!("Hello from {callee}")
}
