//! Results of rule pushes

use tokio::task::JoinHandle;

use crate::{Error, Result};

/// Whether a synchronous rule push reached a published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The item was written and the namespace published
    Published,
    /// A remote failure was absorbed; the rules may not be live
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn failed(error: &Error) -> Self {
        SyncOutcome::Failed {
            reason: error.to_string(),
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, SyncOutcome::Published)
    }
}

/// Handle to a write+publish running on the runtime
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct SyncHandle {
    project: String,
    task: JoinHandle<Result<()>>,
}

impl SyncHandle {
    pub(crate) fn new(project: impl Into<String>, task: JoinHandle<Result<()>>) -> Self {
        Self {
            project: project.into(),
            task,
        }
    }

    /// Project the rules were pushed for
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Whether the write+publish has settled
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the write+publish to settle
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::TaskFailed {
                message: format!("project [{}]: {}", self.project, e),
            }),
        }
    }
}
