//! Tunables of the merge engine

use castsync_config::{MergeConfig, WriteFailurePolicy};

/// Behaviour switches for [`FeedMergeEngine`](crate::FeedMergeEngine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// What to do when a store write fails mid-merge
    pub write_failure_policy: WriteFailurePolicy,
    /// Re-link stored episodes whose identifier changed upstream
    pub repair_changed_identifiers: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            write_failure_policy: WriteFailurePolicy::Propagate,
            repair_changed_identifiers: true,
        }
    }
}

impl From<&MergeConfig> for MergeOptions {
    fn from(config: &MergeConfig) -> Self {
        Self {
            write_failure_policy: config.write_failure_policy,
            repair_changed_identifiers: config.repair_changed_identifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config_defaults() {
        assert_eq!(
            MergeOptions::from(&MergeConfig::default()),
            MergeOptions::default()
        );
    }

    #[test]
    fn test_from_config() {
        let config = MergeConfig {
            write_failure_policy: WriteFailurePolicy::LogAndContinue,
            repair_changed_identifiers: false,
            ..MergeConfig::default()
        };
        let options = MergeOptions::from(&config);
        assert_eq!(options.write_failure_policy, WriteFailurePolicy::LogAndContinue);
        assert!(!options.repair_changed_identifiers);
    }
}
