//! [`RecordingConfigCenter`] for asserting on remote interactions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{
    ConfigCenter, InMemoryConfigCenter, Item, Namespace, NamespaceDefinition, NamespaceFormat,
    NamespaceSummary, NamespaceTarget, Release, RemoteError, RemoteResult,
};

/// Kind of config center call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Write,
    Publish,
    List,
}

/// One recorded config center call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreateNamespace { namespace: String },
    GetNamespace { namespace: String },
    WriteItem { namespace: String, key: String },
    Publish { namespace: String, title: String },
    ListNamespaces,
}

impl RemoteCall {
    pub fn operation(&self) -> Operation {
        match self {
            RemoteCall::CreateNamespace { .. } => Operation::Create,
            RemoteCall::GetNamespace { .. } => Operation::Get,
            RemoteCall::WriteItem { .. } => Operation::Write,
            RemoteCall::Publish { .. } => Operation::Publish,
            RemoteCall::ListNamespaces => Operation::List,
        }
    }
}

/// In-memory config center that records calls and injects failures.
///
/// # Example
///
/// ```rust,no_run
/// use bridge_core::RemoteError;
/// use bridge_test_utils::{Operation, RecordingConfigCenter};
///
/// let center = RecordingConfigCenter::new();
/// center.fail_next(Operation::Publish, RemoteError::Unavailable {
///     message: "portal down".to_string(),
/// });
/// assert_eq!(center.count(Operation::Publish), 0);
/// ```
#[derive(Debug, Default)]
pub struct RecordingConfigCenter {
    store: InMemoryConfigCenter,
    calls: Mutex<Vec<RemoteCall>>,
    one_shot: Mutex<HashMap<Operation, VecDeque<RemoteError>>>,
    always: Mutex<HashMap<Operation, RemoteError>>,
    latency: Option<Duration>,
}

impl RecordingConfigCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Backing store, for inspecting state without recording calls.
    pub fn store(&self) -> &InMemoryConfigCenter {
        &self.store
    }

    /// Create a namespace directly in the store, bypassing the call log.
    pub async fn seed_namespace(&self, app_id: &str, name: &str, is_public: bool) {
        self.store
            .create_namespace(&NamespaceDefinition {
                name: name.to_string(),
                app_id: app_id.to_string(),
                format: NamespaceFormat::Properties,
                is_public,
                append_org_prefix: false,
                created_by: "seed".to_string(),
            })
            .await
            .expect("seed_namespace: namespace already exists");
    }

    /// Fail the next call of `operation` with `error`. Queues up.
    pub fn fail_next(&self, operation: Operation, error: RemoteError) {
        self.one_shot
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Fail every call of `operation` until [`RecordingConfigCenter::heal`].
    pub fn fail_always(&self, operation: Operation, error: RemoteError) {
        self.always.lock().unwrap().insert(operation, error);
    }

    /// Stop injecting failures for `operation`.
    pub fn heal(&self, operation: Operation) {
        self.always.lock().unwrap().remove(&operation);
        self.one_shot.lock().unwrap().remove(&operation);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Operations of every call so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.calls().iter().map(RemoteCall::operation).collect()
    }

    /// Number of calls of `operation` so far.
    pub fn count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn enter(&self, call: RemoteCall) -> RemoteResult<()> {
        let operation = call.operation();
        self.calls.lock().unwrap().push(call);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self
            .one_shot
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        match self.always.lock().unwrap().get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigCenter for RecordingConfigCenter {
    async fn create_namespace(&self, definition: &NamespaceDefinition) -> RemoteResult<()> {
        self.enter(RemoteCall::CreateNamespace {
            namespace: definition.name.clone(),
        })
        .await?;
        self.store.create_namespace(definition).await
    }

    async fn get_namespace(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
    ) -> RemoteResult<Namespace> {
        self.enter(RemoteCall::GetNamespace {
            namespace: namespace.to_string(),
        })
        .await?;
        self.store.get_namespace(target, namespace).await
    }

    async fn create_or_update_item(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        item: &Item,
    ) -> RemoteResult<()> {
        self.enter(RemoteCall::WriteItem {
            namespace: namespace.to_string(),
            key: item.key.clone(),
        })
        .await?;
        self.store.create_or_update_item(target, namespace, item).await
    }

    async fn publish_namespace(
        &self,
        target: &NamespaceTarget,
        namespace: &str,
        release: &Release,
    ) -> RemoteResult<()> {
        self.enter(RemoteCall::Publish {
            namespace: namespace.to_string(),
            title: release.title.clone(),
        })
        .await?;
        self.store.publish_namespace(target, namespace, release).await
    }

    async fn list_namespaces(&self, target: &NamespaceTarget) -> RemoteResult<Vec<NamespaceSummary>> {
        self.enter(RemoteCall::ListNamespaces).await?;
        self.store.list_namespaces(target).await
    }
}
