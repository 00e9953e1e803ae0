//! Node identity and registry entries.

use std::fmt;

/// The identity a node advertises: its name and the address peers dial.
///
/// Set once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    name: String,
    address: String,
}

impl NodeIdentity {
    /// Create an identity from a node name and a `host:port` address.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// The node name, unique within a registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The address peers should connect to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The registry entry this node writes at startup.
    pub fn to_entry(&self) -> RegistryEntry {
        RegistryEntry::new(self.name.clone(), self.address.clone())
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.address)
    }
}

/// One `name -> address` pair as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryEntry {
    /// Node name (the registry key, without any backend prefix).
    pub name: String,
    /// Advertised `host:port`.
    pub address: String,
}

impl RegistryEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Key prefix used by registry backends with a shared, flat keyspace.
pub const REGISTRY_KEY_PREFIX: &str = "/hellonode/nodes/";

/// Registry key for a node name.
pub fn registry_key(name: &str) -> String {
    format!("{REGISTRY_KEY_PREFIX}{name}")
}

/// Node name for a registry key, or `None` if the key lies outside the prefix.
pub fn name_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(REGISTRY_KEY_PREFIX)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_to_entry() {
        let identity = NodeIdentity::new("N1", "127.0.0.1:5001");
        let entry = identity.to_entry();

        assert_eq!(entry.name, "N1");
        assert_eq!(entry.address, "127.0.0.1:5001");
        assert_eq!(identity.to_string(), "N1@127.0.0.1:5001");
    }

    #[test]
    fn test_registry_key_round_trip() {
        let key = registry_key("N2");
        assert_eq!(key, "/hellonode/nodes/N2");
        assert_eq!(name_from_key(&key), Some("N2"));
    }

    #[test]
    fn test_name_from_foreign_key() {
        assert_eq!(name_from_key("/other/nodes/N2"), None);
        assert_eq!(name_from_key(REGISTRY_KEY_PREFIX), None);
    }
}
