//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What to do with a listener whose callbacks fail (return an error or panic).
///
/// The same policy applies to node-level and hierarchy-level notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ListenerFailurePolicy {
    /// Log every failure, keep the listener registered.
    #[default]
    LogAndContinue,
    /// Log, and deregister a listener after this many consecutive failures.
    Strict { max_consecutive_failures: u32 },
}

/// Configuration shared by every hierarchy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub listener_policy: ListenerFailurePolicy,
    /// Also send node-changed events to the descendants of an entity whose
    /// parents changed (their paths to the root changed with it).
    pub notify_descendants: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self { listener_policy: ListenerFailurePolicy::LogAndContinue, notify_descendants: true }
    }
}

impl HierarchyConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let ListenerFailurePolicy::Strict { max_consecutive_failures: 0 } = self.listener_policy {
            return Err(Error::Config("max_consecutive_failures must be at least 1".into()));
        }
        Ok(())
    }

    pub fn strict(max_consecutive_failures: u32) -> Self {
        Self {
            listener_policy: ListenerFailurePolicy::Strict { max_consecutive_failures },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = HierarchyConfig::from_json("{}").unwrap();
        assert_eq!(config, HierarchyConfig::default());
        assert!(config.notify_descendants);
    }

    #[test]
    fn test_strict_policy_from_json() {
        let config = HierarchyConfig::from_json(
            r#"{"listener_policy": {"mode": "strict", "max_consecutive_failures": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.listener_policy, ListenerFailurePolicy::Strict { max_consecutive_failures: 3 });
    }

    #[test]
    fn test_zero_failures_rejected() {
        let result = HierarchyConfig::from_json(
            r#"{"listener_policy": {"mode": "strict", "max_consecutive_failures": 0}}"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(HierarchyConfig::from_json("{"), Err(Error::Json(_))));
    }
}
