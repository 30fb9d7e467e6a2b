//! Rule synchronization between projects and config center namespaces
//!
//! - **engine**: push (sync, async, bulk) and read-back operations
//! - **outcome**: result types for synchronous and spawned pushes

mod engine;
mod outcome;

pub use engine::{ProjectRules, RuleSyncEngine, rule_release_title};
pub use outcome::{SyncHandle, SyncOutcome};
