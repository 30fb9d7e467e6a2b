//! Config center interface
//!
//! The bridge talks to the remote configuration center only through the
//! [`ConfigCenter`] trait. Transport, authentication and retry policy belong
//! to the implementation; the bridge treats every call as blocking I/O with
//! no timeout of its own.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryConfigCenter;

/// Failure reported by a config center call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("namespace [{namespace}] not found")]
    NotFound { namespace: String },

    #[error("namespace [{namespace}] already exists")]
    AlreadyExists { namespace: String },

    #[error("config center unavailable: {message}")]
    Unavailable { message: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },
}

/// Result type for config center calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Application, environment and cluster a namespace lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceTarget {
    pub app_id: String,
    pub env: String,
    pub cluster: String,
}

/// Item format of a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceFormat {
    #[default]
    Properties,
    Json,
    Yaml,
}

/// Request to create an application namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDefinition {
    pub name: String,
    pub app_id: String,
    pub format: NamespaceFormat,
    pub is_public: bool,
    /// Whether the config center may prepend the organization id to `name`
    pub append_org_prefix: bool,
    pub created_by: String,
}

/// Key/value entry of a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub value: String,
    pub modified_by: String,
}

/// Namespace with its items, as returned by a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub is_public: bool,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Namespace descriptor returned by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSummary {
    pub name: String,
    pub is_public: bool,
}

/// Metadata attached to a publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub title: String,
    pub released_by: String,
}

/// Operations the bridge needs from the remote configuration center
#[async_trait]
pub trait ConfigCenter: Send + Sync {
    /// Create a namespace owned by `definition.app_id`
    async fn create_namespace(&self, definition: &NamespaceDefinition) -> RemoteResult<()>;

    /// Read a namespace with its last published items; `NotFound` when it does not exist
    async fn get_namespace(&self, target: &NamespaceTarget, namespace: &str)
    -> RemoteResult<Namespace>;

    /// Create or overwrite one item
    async fn create_or_update_item(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        item: &Item,
    ) -> RemoteResult<()>;

    /// Activate the namespace's current items for consumers
    async fn publish_namespace(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        release: &Release,
    ) -> RemoteResult<()>;

    /// Enumerate namespaces visible to the target application
    async fn list_namespaces(&self, target: &NamespaceTarget) -> RemoteResult<Vec<NamespaceSummary>>;
}
