//! # Node Runtime Library
//!
//! Assembles a membership node out of the `hn-membership` ports and
//! adapters. The `hellonode` binary in `main.rs` is a thin shell around it.
//!
//! ## Modules
//!
//! - `container/` - node configuration and validation
//! - `wiring/` - registry backend selection
//! - `runtime` - startup sequence and the running node handle
//! - `cli` - clap definitions for the binary

#![warn(missing_docs)]

pub mod cli;
pub mod container;
pub mod runtime;
pub mod wiring;

pub use container::{ConfigError, NodeConfig};
pub use runtime::{NodeRuntime, NodeSnapshot, RunningNode, StartupError};
