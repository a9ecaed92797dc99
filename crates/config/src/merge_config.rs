//! Feed reconciliation configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a merge does when a store write fails
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// Abort the merge and return the store error
    #[default]
    Propagate,
    /// Log the failure and return the merged feed anyway
    LogAndContinue,
}

impl std::fmt::Display for WriteFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteFailurePolicy::Propagate => write!(f, "propagate"),
            WriteFailurePolicy::LogAndContinue => write!(f, "log_and_continue"),
        }
    }
}

impl FromStr for WriteFailurePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "propagate" => Ok(WriteFailurePolicy::Propagate),
            "log_and_continue" => Ok(WriteFailurePolicy::LogAndContinue),
            _ => Err(ValidationError::with_value(
                "merge.write_failure_policy",
                "must be one of: propagate, log_and_continue",
                s,
            )),
        }
    }
}

/// Feed reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    /// Handling of failed store writes
    pub write_failure_policy: WriteFailurePolicy,

    /// Re-link stored episodes whose identifier changed upstream
    pub repair_changed_identifiers: bool,

    /// Largest duration difference for two episodes to look alike (seconds)
    pub duplicate_duration_tolerance_secs: u64,

    /// Largest publication date difference for two episodes to look alike (hours)
    pub duplicate_date_tolerance_hours: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            write_failure_policy: WriteFailurePolicy::Propagate,
            repair_changed_identifiers: true,
            duplicate_duration_tolerance_secs: 600,
            duplicate_date_tolerance_hours: 24,
        }
    }
}

impl ConfigSection for MergeConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let results = vec![
            Validator::in_range(
                self.duplicate_duration_tolerance_secs,
                1,
                3600,
                "merge.duplicate_duration_tolerance_secs",
            ),
            Validator::in_range(
                self.duplicate_date_tolerance_hours,
                0,
                168,
                "merge.duplicate_date_tolerance_hours",
            ),
        ];

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.write_failure_policy = other.write_failure_policy;
        self.repair_changed_identifiers = other.repair_changed_identifiers;
        self.duplicate_duration_tolerance_secs = other.duplicate_duration_tolerance_secs;
        self.duplicate_date_tolerance_hours = other.duplicate_date_tolerance_hours;
    }

    fn section_name(&self) -> &'static str {
        "merge"
    }
}
