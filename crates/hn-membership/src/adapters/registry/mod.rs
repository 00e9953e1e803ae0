//! # Registry Adapters
//!
//! - [`InMemoryRegistry`]: always available; in-process clusters and tests
//! - [`TimeoutRegistry`]: per-request deadline around another backend
//! - [`TcpRegistryClient`] / [`RegistryServer`]: dev registry (`network`)
//! - [`EtcdRegistry`]: etcd backend (`etcd`)

mod memory;
mod timeout;

#[cfg(feature = "network")]
mod tcp;

#[cfg(feature = "etcd")]
mod etcd;

pub use memory::InMemoryRegistry;
pub use timeout::TimeoutRegistry;

#[cfg(feature = "network")]
pub use tcp::{RegistryRequest, RegistryResponse, RegistryServer, TcpRegistryClient};

#[cfg(feature = "etcd")]
pub use etcd::EtcdRegistry;
