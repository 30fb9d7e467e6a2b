//! Error types for bridge-core

use std::path::PathBuf;

use crate::remote::RemoteError;

/// Result type for bridge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bridge-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or over-length project name, or a namespace name that does
    /// not belong to any project
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No item key suffix is configured for the rule type
    #[error("Unsupported rule type: {rule_type}")]
    UnsupportedRuleType { rule_type: String },

    /// A config center call failed and the failure was not absorbed
    #[error("Config center {operation} failed for namespace [{namespace}]: {source}")]
    Remote {
        operation: &'static str,
        namespace: String,
        #[source]
        source: RemoteError,
    },

    /// A spawned write+publish task panicked or was aborted by the runtime
    #[error("Sync task failed: {message}")]
    TaskFailed { message: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parsed but violates a constraint
    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// Rule list could not be encoded or decoded
    #[error(transparent)]
    RuleCodec(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn remote(
        operation: &'static str,
        namespace: impl Into<String>,
        source: RemoteError,
    ) -> Self {
        Self::Remote {
            operation,
            namespace: namespace.into(),
            source,
        }
    }

    /// Whether the error comes from caller input rather than from the
    /// config center.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument { .. } | Error::UnsupportedRuleType { .. }
        )
    }
}
