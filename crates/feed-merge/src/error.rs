//! Error types for feed reconciliation

use castsync_core::FeedId;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors reported by a [`FeedStore`](crate::FeedStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// No feed with the given id
    #[error("Feed {0} not found in store")]
    FeedNotFound(FeedId),

    /// The backing storage failed
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Errors that abort a merge
#[derive(Debug, Error)]
pub enum MergeError {
    /// A store read, or a write under the propagating policy, failed
    #[error("Store failure during merge: {0}")]
    Store(#[from] StoreError),

    /// The merge lock was poisoned by a panicking merge
    #[error("Merge lock poisoned")]
    LockPoisoned,
}
