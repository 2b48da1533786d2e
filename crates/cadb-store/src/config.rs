use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What `store` does when the identity is already mapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Return the existing identity and leave the entry untouched.
    #[default]
    Reuse,
    /// Fail with `AlreadyExists`.
    Reject,
}

/// What `resolve` does with an entry whose last resolution failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Re-raise the recorded failure without recomputing.
    #[default]
    Sticky,
    /// Start a fresh resolution round.
    Retry,
}

/// Configuration for an object database.
///
/// ```toml
/// duplicate_policy = "reject"
/// failure_policy = "retry"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub failure_policy: FailurePolicy,
}

impl StoreConfig {
    /// Duplicate stores are errors and failures are final.
    pub fn strict() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            failure_policy: FailurePolicy::Sticky,
        }
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}
