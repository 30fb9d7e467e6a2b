//! Bridge configuration
//!
//! Loaded from a TOML file with three sections:
//!
//! ```toml
//! [remote]
//! portal_url = "http://config-portal:8070"
//! token = "..."
//! operator = "rule-dashboard"
//! app_id = "rule-dashboard"
//! env = "DEV"
//! cluster = "default"
//! namespace_length_limit = 32
//!
//! [namespace]
//! org_id = "platform"
//! dashboard_app_id = "rule-dashboard"
//! prefix = "rules."
//!
//! [rules.suffixes]
//! flow = ".flow-rules"
//! degrade = ".degrade-rules"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::remote::NamespaceTarget;
use crate::rules::RuleType;
use crate::{Error, Result};

/// Config center enforces this limit on namespace names unless told otherwise.
pub const DEFAULT_NAMESPACE_LENGTH_LIMIT: usize = 32;

fn default_cluster() -> String {
    "default".to_string()
}

fn default_namespace_length_limit() -> usize {
    DEFAULT_NAMESPACE_LENGTH_LIMIT
}

fn default_suffixes() -> BTreeMap<String, String> {
    RuleType::ALL
        .into_iter()
        .map(|t| (t.as_str().to_string(), t.default_suffix()))
        .collect()
}

/// Connection and identity used for every config center call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the config center's open API portal
    pub portal_url: String,
    /// Open API access token
    pub token: String,
    /// User recorded as creator/releaser of namespaces, items and releases
    pub operator: String,
    /// Application that owns the shared namespaces
    pub app_id: String,
    /// Environment the namespaces are operated in
    pub env: String,
    /// Cluster the namespaces are operated in
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// Maximum namespace name length accepted by the config center
    #[serde(default = "default_namespace_length_limit")]
    pub namespace_length_limit: usize,
}

/// Namespace naming settings shared with rule consumers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Organization the shared namespaces are registered under
    #[serde(default)]
    pub org_id: String,
    /// App id of the dashboard itself
    #[serde(default)]
    pub dashboard_app_id: String,
    /// Prefix prepended to a project name to form its namespace name
    pub prefix: String,
}

/// Item key settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Rule type name -> item key suffix
    #[serde(default = "default_suffixes")]
    pub suffixes: BTreeMap<String, String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
        }
    }
}

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub remote: RemoteConfig,
    pub namespace: NamespaceConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl BridgeConfig {
    /// Parse and validate configuration from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_at(content, Path::new("<inline>"))
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_at(&content, path)
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate().map_err(|message| Error::InvalidConfig {
            path: PathBuf::from(path),
            message,
        })?;
        tracing::debug!(path = %path.display(), prefix = %config.namespace.prefix, "Loaded bridge configuration");
        Ok(config)
    }

    /// Check required fields and cross-field constraints
    pub fn validate(&self) -> std::result::Result<(), String> {
        let required = [
            ("remote.portal_url", &self.remote.portal_url),
            ("remote.token", &self.remote.token),
            ("remote.operator", &self.remote.operator),
            ("remote.app_id", &self.remote.app_id),
            ("remote.env", &self.remote.env),
            ("remote.cluster", &self.remote.cluster),
            ("namespace.prefix", &self.namespace.prefix),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(format!("{} must not be empty", field));
        }

        let prefix_len = self.namespace.prefix.chars().count();
        if prefix_len >= self.remote.namespace_length_limit {
            return Err(format!(
                "namespace.prefix is {} characters, leaving no room for a project name under the limit of {}",
                prefix_len, self.remote.namespace_length_limit
            ));
        }

        // Each rule type owns exactly one item key
        let mut rule_types: BTreeMap<RuleType, &str> = BTreeMap::new();
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, suffix) in &self.rules.suffixes {
            let rule_type = name
                .parse::<RuleType>()
                .map_err(|e| format!("rules.suffixes: {}", e))?;
            if suffix.is_empty() {
                return Err(format!("rules.suffixes.{} must not be empty", name));
            }
            if let Some(previous) = rule_types.insert(rule_type, name) {
                return Err(format!(
                    "rules.suffixes.{} and rules.suffixes.{} both name rule type {}",
                    previous, name, rule_type
                ));
            }
            if let Some(previous) = owners.insert(suffix, name) {
                return Err(format!(
                    "rules.suffixes.{} and rules.suffixes.{} share suffix [{}]",
                    previous, name, suffix
                ));
            }
        }

        Ok(())
    }

    /// Suffix table keyed by rule type
    ///
    /// Entries whose name is not a known rule type are skipped; `validate`
    /// rejects them on load.
    pub fn suffix_table(&self) -> BTreeMap<RuleType, String> {
        self.rules
            .suffixes
            .iter()
            .filter_map(|(name, suffix)| Some((name.parse::<RuleType>().ok()?, suffix.clone())))
            .collect()
    }

    /// Where namespaces are operated
    pub fn target(&self) -> NamespaceTarget {
        NamespaceTarget {
            app_id: self.remote.app_id.clone(),
            env: self.remote.env.clone(),
            cluster: self.remote.cluster.clone(),
        }
    }
}
