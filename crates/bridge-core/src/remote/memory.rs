//! In-process config center
//!
//! Keeps namespaces, items and release history in memory. Used for local
//! development and as the backing store of test doubles.
//!
//! Writes land in a namespace's working items. Reads serve the items captured
//! by the most recent publish, so unpublished edits stay invisible to readers.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    ConfigCenter, Item, Namespace, NamespaceDefinition, NamespaceFormat, NamespaceSummary,
    NamespaceTarget, Release, RemoteError, RemoteResult,
};

#[derive(Debug, Clone)]
struct StoredNamespace {
    is_public: bool,
    format: NamespaceFormat,
    items: BTreeMap<String, Item>,
    published: BTreeMap<String, Item>,
    releases: Vec<Release>,
}

/// Config center that lives entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryConfigCenter {
    /// (app id, namespace name) -> namespace
    namespaces: Mutex<BTreeMap<(String, String), StoredNamespace>>,
}

impl InMemoryConfigCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BTreeMap<(String, String), StoredNamespace>> {
        self.namespaces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(app_id: &str, namespace: &str) -> (String, String) {
        (app_id.to_string(), namespace.to_string())
    }

    /// Remove a namespace out-of-band, as an operator would in the portal
    pub fn delete_namespace(&self, app_id: &str, namespace: &str) -> bool {
        self.state().remove(&Self::key(app_id, namespace)).is_some()
    }

    /// Whether the namespace exists
    pub fn contains_namespace(&self, app_id: &str, namespace: &str) -> bool {
        self.state().contains_key(&Self::key(app_id, namespace))
    }

    /// Format the namespace was created with
    pub fn namespace_format(&self, app_id: &str, namespace: &str) -> Option<NamespaceFormat> {
        self.state()
            .get(&Self::key(app_id, namespace))
            .map(|ns| ns.format)
    }

    /// Releases published for a namespace, oldest first
    pub fn releases(&self, app_id: &str, namespace: &str) -> Vec<Release> {
        self.state()
            .get(&Self::key(app_id, namespace))
            .map(|ns| ns.releases.clone())
            .unwrap_or_default()
    }

    /// Working value of an item, published or not
    pub fn item_value(&self, app_id: &str, namespace: &str, key: &str) -> Option<String> {
        self.state()
            .get(&Self::key(app_id, namespace))
            .and_then(|ns| ns.items.get(key))
            .map(|item| item.value.clone())
    }
}

#[async_trait]
impl ConfigCenter for InMemoryConfigCenter {
    async fn create_namespace(&self, definition: &NamespaceDefinition) -> RemoteResult<()> {
        let mut state = self.state();
        let key = Self::key(&definition.app_id, &definition.name);
        if state.contains_key(&key) {
            return Err(RemoteError::AlreadyExists {
                namespace: definition.name.clone(),
            });
        }
        state.insert(
            key,
            StoredNamespace {
                is_public: definition.is_public,
                format: definition.format,
                items: BTreeMap::new(),
                published: BTreeMap::new(),
                releases: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_namespace(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
    ) -> RemoteResult<Namespace> {
        let state = self.state();
        let stored = state
            .get(&Self::key(&target.app_id, namespace))
            .ok_or_else(|| RemoteError::NotFound {
                namespace: namespace.to_string(),
            })?;
        Ok(Namespace {
            name: namespace.to_string(),
            is_public: stored.is_public,
            items: stored.published.values().cloned().collect(),
        })
    }

    async fn create_or_update_item(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        item: &Item,
    ) -> RemoteResult<()> {
        let mut state = self.state();
        let stored = state
            .get_mut(&Self::key(&target.app_id, namespace))
            .ok_or_else(|| RemoteError::NotFound {
                namespace: namespace.to_string(),
            })?;
        if item.key.trim().is_empty() {
            return Err(RemoteError::Rejected {
                message: format!("item key in namespace [{}] must not be blank", namespace),
            });
        }
        stored.items.insert(item.key.clone(), item.clone());
        Ok(())
    }

    async fn publish_namespace(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        release: &Release,
    ) -> RemoteResult<()> {
        let mut state = self.state();
        let stored = state
            .get_mut(&Self::key(&target.app_id, namespace))
            .ok_or_else(|| RemoteError::NotFound {
                namespace: namespace.to_string(),
            })?;
        stored.published = stored.items.clone();
        stored.releases.push(release.clone());
        Ok(())
    }

    async fn list_namespaces(&self, target: &NamespaceTarget) -> RemoteResult<Vec<NamespaceSummary>> {
        Ok(self
            .state()
            .iter()
            .filter(|((app_id, _), _)| *app_id == target.app_id)
            .map(|((_, name), stored)| NamespaceSummary {
                name: name.clone(),
                is_public: stored.is_public,
            })
            .collect())
    }
}
