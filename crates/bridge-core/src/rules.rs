//! Rule types and the rule-list codec
//!
//! A project owns one rule list per [`RuleType`]. The core treats individual
//! rules as opaque JSON objects; only the list framing is defined here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A single control rule, kept opaque by the bridge.
pub type Rule = Value;

/// Category of control rule. Each type is stored under its own item key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleType {
    /// Flow-control (QPS / concurrency) rules
    Flow,
    /// Circuit-breaking rules
    Degrade,
    /// Hot-parameter flow rules
    ParamFlow,
    /// System adaptive protection rules
    System,
    /// Origin allow/deny rules
    Authority,
    /// Gateway route flow rules
    GatewayFlow,
    /// Gateway API group definitions
    GatewayApiGroup,
}

impl RuleType {
    /// Every rule type, in declaration order.
    pub const ALL: [RuleType; 7] = [
        RuleType::Flow,
        RuleType::Degrade,
        RuleType::ParamFlow,
        RuleType::System,
        RuleType::Authority,
        RuleType::GatewayFlow,
        RuleType::GatewayApiGroup,
    ];

    /// Kebab-case name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Flow => "flow",
            RuleType::Degrade => "degrade",
            RuleType::ParamFlow => "param-flow",
            RuleType::System => "system",
            RuleType::Authority => "authority",
            RuleType::GatewayFlow => "gateway-flow",
            RuleType::GatewayApiGroup => "gateway-api-group",
        }
    }

    /// Item key suffix used when no explicit suffix is configured.
    pub fn default_suffix(&self) -> String {
        format!(".{}-rules", self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        RuleType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| Error::UnsupportedRuleType {
                rule_type: s.to_string(),
            })
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize an ordered rule list into an item value.
pub fn encode_rules(rules: &[Rule]) -> Result<String> {
    Ok(serde_json::to_string(rules)?)
}

/// Parse an item value back into an ordered rule list.
///
/// A blank value is read as an empty list.
pub fn decode_rules(value: &str) -> Result<Vec<Rule>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(value)?)
}
