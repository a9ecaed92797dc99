//! Feed reconciliation engine
//!
//! Combines a freshly parsed [`Feed`](castsync_core::Feed) with the state
//! already persisted for it. The engine works against injected
//! collaborators:
//! - [`FeedStore`] for persistence ([`InMemoryStore`] provided)
//! - [`DuplicateMatcher`] to recognise the same episode under different
//!   ids ([`EpisodeDuplicateGuesser`] provided)
//! - [`SyncActionSink`](castsync_sync_engine::SyncActionSink) for playback
//!   state that must survive an identifier change
//! - [`EventSink`] for change notifications ([`ChannelEventSink`] provided)
//!
//! # Example
//!
//! ```rust
//! use castsync_core::{Feed, FeedItem};
//! use castsync_feed_merge::{
//!     EpisodeDuplicateGuesser, FeedMergeEngine, InMemoryStore, NoopEventSink,
//! };
//! use castsync_sync_engine::SyncQueue;
//! use std::sync::Arc;
//!
//! let engine = FeedMergeEngine::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(EpisodeDuplicateGuesser::default()),
//!     Arc::new(SyncQueue::new(false)),
//!     Arc::new(NoopEventSink),
//! );
//!
//! let mut feed = Feed::new("https://example.com/feed.xml", "Example");
//! feed.add_item(FeedItem::new("Episode 1").with_identifier("ep-1"));
//!
//! let outcome = engine.update_feed(feed, false).unwrap();
//! assert!(outcome.feed.id.is_saved());
//! assert!(outcome.feed.items[0].is_new());
//! ```

mod diagnostics;
mod engine;
mod error;
mod events;
mod matcher;
mod options;
mod store;

pub use diagnostics::{episode_details, DiagnosticKind, DiagnosticRecord};
pub use engine::{FeedMergeEngine, MergeOutcome};
pub use error::{MergeError, MergeResult, StoreError, StoreResult};
pub use events::{ChannelEventSink, EventSink, FeedEvent, FeedListUpdate, ItemEvent, NoopEventSink};
pub use matcher::{DuplicateMatcher, EpisodeDuplicateGuesser};
pub use options::MergeOptions;
pub use store::{FeedStore, InMemoryStore, StoreSnapshot};

pub use castsync_config::WriteFailurePolicy;
