//! Namespace resolution and rule synchronization for the rule dashboard
//!
//! The dashboard groups control rules by *project*; the configuration center
//! stores flat key/value items in shared *namespaces*. This crate bridges the
//! two:
//!
//! - **NameCodec**: project name <-> namespace name, (project, rule type) -> item key
//! - **ProvisionCache**: concurrent set of namespaces known to exist
//! - **NamespaceProvisioner**: lazily creates and first-publishes namespaces
//! - **RuleSyncEngine**: write/publish pipeline, bulk push and read-back
//!
//! # Architecture
//!
//! ```text
//!              rule dashboard
//!                    |
//!             RuleSyncEngine
//!              /           \
//!     NameCodec     NamespaceProvisioner -- ProvisionCache
//!                          |
//!                   dyn ConfigCenter
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bridge_core::{BridgeConfig, InMemoryConfigCenter, RuleSyncEngine, RuleType};
//!
//! # async fn example() -> bridge_core::Result<()> {
//! let config = BridgeConfig::parse(r#"
//! [remote]
//! portal_url = "http://localhost:8070"
//! token = "secret"
//! operator = "dashboard"
//! app_id = "rule-dashboard"
//! env = "DEV"
//!
//! [namespace]
//! prefix = "app."
//! "#)?;
//!
//! let engine = RuleSyncEngine::from_config(&config, Arc::new(InMemoryConfigCenter::new()));
//! let outcome = engine
//!     .set_rules("orders", RuleType::Flow, vec![serde_json::json!({"resource": "/orders"})])
//!     .await?;
//! assert!(outcome.is_published());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod provision;
pub mod remote;
pub mod rules;
pub mod sync;

pub use config::{BridgeConfig, NamespaceConfig, RemoteConfig, RulesConfig};
pub use error::{Error, Result};
pub use naming::NameCodec;
pub use provision::{NamespaceProvisioner, ProvisionCache, Provisioned};
pub use remote::{
    ConfigCenter, InMemoryConfigCenter, Item, Namespace, NamespaceDefinition, NamespaceFormat,
    NamespaceSummary, NamespaceTarget, Release, RemoteError, RemoteResult,
};
pub use rules::{Rule, RuleType, decode_rules, encode_rules};
pub use sync::{ProjectRules, RuleSyncEngine, SyncHandle, SyncOutcome};
