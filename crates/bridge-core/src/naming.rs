//! Project name to namespace name and item key mapping
//!
//! A project `orders` under prefix `app.` lives in namespace `app.orders`,
//! and its flow rules are stored under item key `orders.flow-rules`. The
//! prefix is concatenated as-is; no separator is inserted.

use std::collections::BTreeMap;

use crate::config::BridgeConfig;
use crate::rules::RuleType;
use crate::{Error, Result};

/// Bidirectional mapping between dashboard projects and config center names
#[derive(Debug, Clone)]
pub struct NameCodec {
    prefix: String,
    namespace_length_limit: usize,
    suffixes: BTreeMap<RuleType, String>,
}

impl NameCodec {
    pub fn new(
        prefix: impl Into<String>,
        namespace_length_limit: usize,
        suffixes: BTreeMap<RuleType, String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace_length_limit,
            suffixes,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.namespace.prefix.clone(),
            config.remote.namespace_length_limit,
            config.suffix_table(),
        )
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Longest project name that still fits the namespace length limit
    pub fn project_name_length_limit(&self) -> usize {
        self.namespace_length_limit
            .saturating_sub(self.prefix.chars().count())
    }

    /// Namespace holding the project's rules
    pub fn namespace_name(&self, project_name: &str) -> Result<String> {
        if project_name.is_empty() {
            return Err(Error::invalid_argument("project name must not be empty"));
        }
        let limit = self.project_name_length_limit();
        if project_name.chars().count() > limit {
            return Err(Error::invalid_argument(format!(
                "project name [{}] is too long. Its length should not exceed {}",
                project_name, limit
            )));
        }
        Ok(format!("{}{}", self.prefix, project_name))
    }

    /// Whether a namespace name was derived from some project name
    pub fn is_project_namespace(&self, namespace_name: &str) -> bool {
        namespace_name.starts_with(&self.prefix)
    }

    /// Inverse of [`NameCodec::namespace_name`]
    pub fn project_name(&self, namespace_name: &str) -> Result<String> {
        let project_name = namespace_name.strip_prefix(&self.prefix).ok_or_else(|| {
            Error::invalid_argument(format!(
                "namespace [{}] does not belong to any project",
                namespace_name
            ))
        })?;
        if project_name.is_empty() {
            return Err(Error::invalid_argument(format!(
                "namespace [{}] carries the prefix only",
                namespace_name
            )));
        }
        Ok(project_name.to_string())
    }

    /// Item key for one rule type of a project
    pub fn item_key(&self, project_name: &str, rule_type: RuleType) -> Result<String> {
        let suffix = self
            .suffixes
            .get(&rule_type)
            .ok_or_else(|| Error::UnsupportedRuleType {
                rule_type: rule_type.to_string(),
            })?;
        Ok(format!("{}{}", project_name, suffix))
    }

    /// Rule type whose item key for `project_name` is exactly `key`
    pub fn rule_type_for_key(&self, project_name: &str, key: &str) -> Option<RuleType> {
        let suffix = key.strip_prefix(project_name)?;
        self.suffixes
            .iter()
            .find(|(_, s)| s.as_str() == suffix)
            .map(|(rule_type, _)| *rule_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> NameCodec {
        let suffixes = BTreeMap::from([
            (RuleType::Flow, ".flow-rules".to_string()),
            (RuleType::Degrade, ".degrade-rules".to_string()),
        ]);
        NameCodec::new("app.", 12, suffixes)
    }

    #[test]
    fn test_project_name_length_limit() {
        assert_eq!(codec().project_name_length_limit(), 8);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let codec = codec();
        assert_eq!(codec.namespace_name("12345678").unwrap(), "app.12345678");
        assert!(codec.namespace_name("123456789").is_err());
    }

    #[test]
    fn test_rule_type_for_key() {
        let codec = codec();
        assert_eq!(
            codec.rule_type_for_key("orders", "orders.flow-rules"),
            Some(RuleType::Flow)
        );
        assert_eq!(codec.rule_type_for_key("orders", "billing.flow-rules"), None);
        assert_eq!(codec.rule_type_for_key("orders", "orders.system-rules"), None);
    }

    #[test]
    fn test_unconfigured_rule_type() {
        let err = codec().item_key("orders", RuleType::System).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRuleType { .. }));
    }
}
