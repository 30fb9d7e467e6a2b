//! Standard engine setup shared by integration tests.
//!
//! Every fixture uses prefix `app.`, the config center's default namespace
//! length limit and the default suffix for every rule type.

use std::collections::BTreeMap;
use std::sync::Arc;

use bridge_core::config::DEFAULT_NAMESPACE_LENGTH_LIMIT;
use bridge_core::{NameCodec, NamespaceProvisioner, NamespaceTarget, RuleSyncEngine, RuleType};

use crate::RecordingConfigCenter;

pub const APP_ID: &str = "rule-dashboard";
pub const PREFIX: &str = "app.";
pub const OPERATOR: &str = "tester";

pub fn target() -> NamespaceTarget {
    NamespaceTarget {
        app_id: APP_ID.to_string(),
        env: "DEV".to_string(),
        cluster: "default".to_string(),
    }
}

pub fn codec() -> NameCodec {
    let suffixes: BTreeMap<RuleType, String> = RuleType::ALL
        .into_iter()
        .map(|t| (t, t.default_suffix()))
        .collect();
    NameCodec::new(PREFIX, DEFAULT_NAMESPACE_LENGTH_LIMIT, suffixes)
}

pub fn engine(center: &Arc<RecordingConfigCenter>) -> RuleSyncEngine {
    RuleSyncEngine::new(center.clone(), codec(), target(), OPERATOR)
}

pub fn provisioner(center: &Arc<RecordingConfigCenter>) -> NamespaceProvisioner {
    NamespaceProvisioner::new(center.clone(), target(), OPERATOR)
}
