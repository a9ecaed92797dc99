// crates/sync-engine/src/error.rs
//! Error types for sync operations

use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while building or exchanging sync actions
#[derive(Debug, Error)]
pub enum SyncError {
    /// An action was encoded before a timestamp was set
    #[error("Sync action has no timestamp")]
    MissingTimestamp,

    /// Invalid sync data
    #[error("Invalid sync data: {0}")]
    InvalidData(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pending queue lock was poisoned
    #[error("Sync queue lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::MissingTimestamp;
        assert!(err.to_string().contains("no timestamp"));
    }

    #[test]
    fn test_invalid_data_error() {
        let err = SyncError::InvalidData("corrupted".to_string());
        assert!(err.to_string().contains("Invalid sync data"));
    }

    #[test]
    fn test_serialization_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SyncError::from(json_err);
        assert!(matches!(err, SyncError::Serialization(_)));
    }
}
