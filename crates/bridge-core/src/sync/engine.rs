//! RuleSyncEngine implementation
//!
//! The RuleSyncEngine moves rule lists between dashboard projects and the
//! config center: resolve namespace, ensure it is provisioned, write the
//! item(s), publish.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Local};

use super::outcome::{SyncHandle, SyncOutcome};
use crate::config::BridgeConfig;
use crate::naming::NameCodec;
use crate::provision::{NamespaceProvisioner, Provisioned};
use crate::remote::{ConfigCenter, Item, NamespaceTarget, Release};
use crate::rules::{Rule, RuleType, decode_rules, encode_rules};
use crate::{Error, Result};

/// Rule lists of one project, keyed by rule type
pub type ProjectRules = BTreeMap<RuleType, Vec<Rule>>;

/// Title of the release that activates a rule change
pub fn rule_release_title(now: DateTime<Local>) -> String {
    format!("rule dashboard operate on {}", now.format("%Y-%m-%d %H:%M:%S"))
}

struct EngineInner {
    client: Arc<dyn ConfigCenter>,
    codec: NameCodec,
    provisioner: NamespaceProvisioner,
    target: NamespaceTarget,
    operator: String,
}

impl EngineInner {
    fn item(&self, project_name: &str, rule_type: RuleType, rules: &[Rule]) -> Result<Item> {
        Ok(Item {
            key: self.codec.item_key(project_name, rule_type)?,
            value: encode_rules(rules)?,
            modified_by: self.operator.clone(),
        })
    }

    async fn write_item(&self, namespace: &str, item: &Item) -> Result<()> {
        self.client
            .create_or_update_item(&self.target, namespace, item)
            .await
            .map_err(|e| Error::remote("write item", namespace, e))?;
        tracing::debug!(namespace, key = %item.key, "Wrote rule item");
        Ok(())
    }

    async fn publish(&self, namespace: &str) -> Result<()> {
        let release = Release {
            title: rule_release_title(Local::now()),
            released_by: self.operator.clone(),
        };
        self.client
            .publish_namespace(&self.target, namespace, &release)
            .await
            .map_err(|e| Error::remote("publish", namespace, e))?;
        tracing::info!(namespace, release = %release.title, "Published rules");
        Ok(())
    }
}

/// Engine for pushing and reading project rules
///
/// Cloning is cheap; clones share the name codec, the provisioner and its
/// existence cache.
#[derive(Clone)]
pub struct RuleSyncEngine {
    inner: Arc<EngineInner>,
}

impl RuleSyncEngine {
    pub fn new(
        client: Arc<dyn ConfigCenter>,
        codec: NameCodec,
        target: NamespaceTarget,
        operator: impl Into<String>,
    ) -> Self {
        let operator = operator.into();
        let provisioner =
            NamespaceProvisioner::new(Arc::clone(&client), target.clone(), operator.clone());
        Self {
            inner: Arc::new(EngineInner {
                client,
                codec,
                provisioner,
                target,
                operator,
            }),
        }
    }

    pub fn from_config(config: &BridgeConfig, client: Arc<dyn ConfigCenter>) -> Self {
        Self::new(
            client,
            NameCodec::from_config(config),
            config.target(),
            config.remote.operator.clone(),
        )
    }

    pub fn codec(&self) -> &NameCodec {
        &self.inner.codec
    }

    pub fn provisioner(&self) -> &NamespaceProvisioner {
        &self.inner.provisioner
    }

    /// Provision the project's namespace without writing any rules
    pub async fn register_project_if_absent(&self, project_name: &str) -> Result<Provisioned> {
        let namespace = self.inner.codec.namespace_name(project_name)?;
        self.inner.provisioner.ensure_exists(&namespace).await
    }

    /// Push one rule list and publish it on the runtime
    ///
    /// Names are validated and the namespace is provisioned before this
    /// returns; the item write and publish run on a spawned task.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument`/`UnsupportedRuleType` for bad input and
    /// [`Error::Remote`] if provisioning a new namespace fails.
    pub async fn set_rules_async(
        &self,
        project_name: &str,
        rule_type: RuleType,
        rules: Vec<Rule>,
    ) -> Result<SyncHandle> {
        let namespace = self.inner.codec.namespace_name(project_name)?;
        let item = self.inner.item(project_name, rule_type, &rules)?;

        self.inner.provisioner.ensure_exists(&namespace).await?;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            inner.write_item(&namespace, &item).await?;
            inner.publish(&namespace).await
        });
        Ok(SyncHandle::new(project_name, task))
    }

    /// Push one rule list and wait until it is published
    ///
    /// Remote failures are absorbed into [`SyncOutcome::Failed`]; callers
    /// may simply retry. Only invalid input is returned as an error.
    pub async fn set_rules(
        &self,
        project_name: &str,
        rule_type: RuleType,
        rules: Vec<Rule>,
    ) -> Result<SyncOutcome> {
        let handle = match self.set_rules_async(project_name, rule_type, rules).await {
            Ok(handle) => handle,
            Err(e) if e.is_invalid_argument() => return Err(e),
            Err(e) => {
                tracing::debug!(project = project_name, error = %e, "Failed to set rules");
                return Ok(SyncOutcome::failed(&e));
            }
        };

        match handle.wait().await {
            Ok(()) => Ok(SyncOutcome::Published),
            Err(e) => {
                tracing::debug!(project = project_name, error = %e, "Failed to set rules");
                Ok(SyncOutcome::failed(&e))
            }
        }
    }

    /// Push rule lists for many projects
    ///
    /// Projects are handled one after another. Every rule type of a project
    /// is written before a single publish for that project. All names are
    /// validated before the first remote call.
    pub async fn set_all_rules(&self, projects: &BTreeMap<String, ProjectRules>) -> Result<()> {
        let mut batches = Vec::with_capacity(projects.len());
        for (project_name, rules) in projects {
            let namespace = self.inner.codec.namespace_name(project_name)?;
            let items = rules
                .iter()
                .map(|(rule_type, rules)| self.inner.item(project_name, *rule_type, rules))
                .collect::<Result<Vec<_>>>()?;
            batches.push((namespace, items));
        }

        // TODO: push independent projects concurrently once the config center
        // rate limits are known
        for (namespace, items) in batches {
            self.inner.provisioner.ensure_exists(&namespace).await?;
            for item in &items {
                self.inner.write_item(&namespace, item).await?;
            }
            self.inner.publish(&namespace).await?;
        }
        Ok(())
    }

    /// Read back all rule lists of a project
    ///
    /// Items that do not match a configured rule type key are ignored.
    pub async fn get_rules(&self, project_name: &str) -> Result<ProjectRules> {
        let namespace = self.inner.codec.namespace_name(project_name)?;
        let found = self
            .inner
            .client
            .get_namespace(&self.inner.target, &namespace)
            .await
            .map_err(|e| Error::remote("query", &namespace, e))?;

        let mut rules = ProjectRules::new();
        for item in &found.items {
            if let Some(rule_type) = self.inner.codec.rule_type_for_key(project_name, &item.key) {
                rules.insert(rule_type, decode_rules(&item.value)?);
            }
        }
        Ok(rules)
    }

    /// Project names whose namespaces exist in the config center
    pub async fn list_remote_project_names(&self) -> Result<BTreeSet<String>> {
        let namespaces = self
            .inner
            .client
            .list_namespaces(&self.inner.target)
            .await
            .map_err(|e| Error::remote("list", &self.inner.target.app_id, e))?;

        let codec = &self.inner.codec;
        Ok(namespaces
            .into_iter()
            .filter(|ns| ns.is_public && codec.is_project_namespace(&ns.name))
            .filter_map(|ns| match codec.project_name(&ns.name) {
                Ok(project_name) => Some(project_name),
                Err(e) => {
                    tracing::warn!(namespace = %ns.name, error = %e, "Skipping namespace");
                    None
                }
            })
            .collect())
    }

    /// Read back the rules of every project found in the config center
    pub async fn get_all_rules(&self) -> Result<BTreeMap<String, ProjectRules>> {
        let mut all = BTreeMap::new();
        for project_name in self.list_remote_project_names().await? {
            let rules = self.get_rules(&project_name).await?;
            all.insert(project_name, rules);
        }
        Ok(all)
    }

    /// Projects whose namespaces are in the existence cache
    pub fn list_cached_project_names(&self) -> BTreeSet<String> {
        let codec = &self.inner.codec;
        self.inner
            .provisioner
            .cache()
            .snapshot()
            .iter()
            .filter_map(|namespace| codec.project_name(namespace).ok())
            .collect()
    }

    /// Forget that the project's namespace exists
    ///
    /// The next push for the project queries the config center again.
    pub fn clear_cache_of_project(&self, project_name: &str) -> Result<bool> {
        let namespace = self.inner.codec.namespace_name(project_name)?;
        Ok(self.inner.provisioner.cache().remove(&namespace))
    }

    /// Empty the existence cache and return the projects that were in it
    ///
    /// Not atomic with respect to concurrent provisioning: a project being
    /// provisioned while this runs may be re-cached immediately afterwards.
    pub fn clear_all_cached_project_names(&self) -> BTreeSet<String> {
        let codec = &self.inner.codec;
        self.inner
            .provisioner
            .cache()
            .clear()
            .iter()
            .filter_map(|namespace| codec.project_name(namespace).ok())
            .collect()
    }
}
