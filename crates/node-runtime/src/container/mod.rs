//! # Node Container
//!
//! Configuration for a single node and the pieces it is assembled from.

pub mod config;

pub use config::{ConfigError, NodeConfig, NodeSection, RegistryConfig, RegistryEndpoint};
