//! Lazy namespace provisioning
//!
//! `ensure_exists` walks the same sequence on every call:
//!
//! ```text
//! cache hit ------------------------------------------------> done
//! cache miss -> query remote -- found ----------------------> cache, done
//!                             \- not found / error -> create -> publish -> cache, done
//! ```
//!
//! Query and create failures are logged and absorbed. A failed create most
//! often means a concurrent caller (or another dashboard instance) created the
//! namespace first, so the sequence carries on to the initial publish.

use std::sync::Arc;

use chrono::{DateTime, Local};
use dashmap::DashMap;
use tokio::sync::Mutex;

use super::cache::ProvisionCache;
use crate::remote::{ConfigCenter, NamespaceDefinition, NamespaceFormat, NamespaceTarget, Release};
use crate::{Error, Result};

/// How `ensure_exists` concluded that a namespace exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// Already in the existence cache; no remote call was made
    Cached,
    /// The remote query found it
    Found,
    /// Created (or creation attempted) and published for the first time
    Created,
}

/// Title of the release that activates a newly created namespace
pub fn first_release_title(now: DateTime<Local>) -> String {
    format!("{}-first-publish-release", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Guarantees namespaces exist in the config center before items are written
pub struct NamespaceProvisioner {
    client: Arc<dyn ConfigCenter>,
    target: NamespaceTarget,
    operator: String,
    cache: ProvisionCache,
    /// Serializes provisioning of the same namespace name
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl NamespaceProvisioner {
    pub fn new(
        client: Arc<dyn ConfigCenter>,
        target: NamespaceTarget,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            client,
            target,
            operator: operator.into(),
            cache: ProvisionCache::new(),
            gates: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &ProvisionCache {
        &self.cache
    }

    /// Make sure the namespace exists remotely and is cached
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] only when the initial publish of a freshly
    /// provisioned namespace fails; the namespace is not cached in that case.
    pub async fn ensure_exists(&self, namespace: &str) -> Result<Provisioned> {
        if self.cache.contains(namespace) {
            tracing::debug!(namespace, "Namespace already provisioned");
            return Ok(Provisioned::Cached);
        }

        // Locals drop in reverse order: permit, then gate, then the release
        // check, which also runs when this future is cancelled mid-flight
        let _release = GateRelease {
            gates: &self.gates,
            namespace,
        };
        let gate = self.gate(namespace);
        let _permit = gate.lock().await;
        self.provision(namespace).await
    }

    /// Number of namespaces with provisioning in flight
    pub fn in_flight(&self) -> usize {
        self.gates.len()
    }

    fn gate(&self, namespace: &str) -> Arc<Mutex<()>> {
        self.gates
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn provision(&self, namespace: &str) -> Result<Provisioned> {
        // Another caller may have finished while we waited on the gate
        if self.cache.contains(namespace) {
            return Ok(Provisioned::Cached);
        }

        match self.client.get_namespace(&self.target, namespace).await {
            Ok(_) => {
                self.cache.add(namespace);
                tracing::debug!(namespace, "Namespace found in config center");
                return Ok(Provisioned::Found);
            }
            Err(e) => {
                tracing::warn!(
                    namespace,
                    error = %e,
                    "Namespace query failed, it may not exist in the config center yet"
                );
            }
        }

        let definition = NamespaceDefinition {
            name: namespace.to_string(),
            app_id: self.target.app_id.clone(),
            format: NamespaceFormat::Properties,
            is_public: true,
            append_org_prefix: false,
            created_by: self.operator.clone(),
        };
        match self.client.create_namespace(&definition).await {
            Ok(()) => tracing::info!(namespace, "Created public namespace"),
            Err(e) => {
                tracing::error!(namespace, error = %e, "Failed to create public namespace, continuing");
            }
        }

        let release = Release {
            title: first_release_title(Local::now()),
            released_by: self.operator.clone(),
        };
        self.client
            .publish_namespace(&self.target, namespace, &release)
            .await
            .map_err(|e| Error::remote("publish", namespace, e))?;
        tracing::info!(namespace, release = %release.title, "Published new namespace");

        self.cache.add(namespace);
        Ok(Provisioned::Created)
    }
}

/// Drops a namespace's gate once no caller holds it
struct GateRelease<'a> {
    gates: &'a DashMap<String, Arc<Mutex<()>>>,
    namespace: &'a str,
}

impl Drop for GateRelease<'_> {
    fn drop(&mut self) {
        self.gates
            .remove_if(self.namespace, |_, gate| Arc::strong_count(gate) == 1);
    }
}
