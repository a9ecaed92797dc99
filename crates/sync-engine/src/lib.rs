// crates/sync-engine/src/lib.rs
//! Cross-device synchronization of episode actions
//!
//! This crate provides the portable record of user playback events:
//! - [`SyncAction`] values and their builder
//! - JSON record encoding/decoding ([`codec`])
//! - Upload/download batch payloads
//! - The [`SyncActionSink`] contract and an in-memory [`SyncQueue`]
//!
//! # Example
//!
//! ```rust
//! use castsync_sync_engine::{codec, ActionKind, SyncAction};
//!
//! let action = SyncAction::builder(
//!     "https://example.com/feed.xml",
//!     "https://example.com/episode-1.mp3",
//!     ActionKind::Play,
//! )
//! .current_timestamp()
//! .started(0)
//! .position(120)
//! .total(1800)
//! .build();
//!
//! let record = codec::encode(&action).unwrap();
//! let decoded = codec::decode(&record).unwrap();
//! assert_eq!(decoded.position(), 120);
//! ```

pub mod codec;
mod error;
mod protocol;
mod queue;
mod types;

pub use error::{SyncError, SyncResult};
pub use protocol::{ActionUpload, RemoteActions};
pub use queue::{SyncActionSink, SyncQueue};
pub use types::{ActionKind, SyncAction, SyncActionBuilder, UNSET_POSITION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: SyncQueue = SyncQueue::new(false);
        let _: SyncAction = SyncAction::builder("p", "e", ActionKind::New).build();
        assert_eq!(UNSET_POSITION, -1);
    }
}
