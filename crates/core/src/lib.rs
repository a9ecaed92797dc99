//! Shared feed model for castsync
//!
//! A [`Feed`] owns an ordered list of [`FeedItem`]s (newest first by
//! convention), each of which may link a downloadable [`FeedMedia`].
//! These values are produced fresh by the parsing layer on every refresh
//! and reconciled against persisted state by `castsync-feed-merge`.

pub mod types;

pub use types::{
    Duration, Feed, FeedId, FeedItem, FeedMedia, FeedPreferences, FeedType, ItemId, MediaId,
    PlayState, LOCAL_FEED_PREFIX,
};
