//! Episode action synchronization section

use crate::validation::{ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};

/// Synchronization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Queue episode actions for upload
    pub enabled: bool,
}

impl ConfigSection for SyncConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        self.enabled = other.enabled;
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let config = SyncConfig::default();
        assert!(!config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge() {
        let mut base = SyncConfig::default();
        base.merge(SyncConfig { enabled: true });
        assert!(base.enabled);
    }
}
