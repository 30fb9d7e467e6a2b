//! Existence cache for provisioned namespaces

use std::collections::BTreeSet;

use dashmap::DashSet;

/// Concurrent set of namespace names known to exist in the config center
///
/// Entries are added after a successful existence query or a provisioning
/// sequence and are never expired. A namespace deleted out-of-band stays
/// cached until it is removed explicitly.
#[derive(Debug, Default)]
pub struct ProvisionCache {
    names: DashSet<String>,
}

impl ProvisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a namespace as existing. Returns `false` if it already was.
    pub fn add(&self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Forget a namespace. Returns `true` if it was cached.
    pub fn remove(&self, name: &str) -> bool {
        self.names.remove(name).is_some()
    }

    /// Names cached at the time of the call
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.names.iter().map(|name| name.key().clone()).collect()
    }

    /// Remove every name present in a snapshot taken now and return them
    ///
    /// Names added concurrently after the snapshot survive the clear.
    pub fn clear(&self) -> BTreeSet<String> {
        let snapshot = self.snapshot();
        for name in &snapshot {
            self.names.remove(name);
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
