//! Domain types for castsync
//!
//! - `feed`: Feed, its type tag and per-feed preferences
//! - `item`: FeedItem and its local play state
//! - `media`: FeedMedia linked to an item
//! - `common`: identifiers and media durations

mod common;
mod feed;
mod item;
mod media;

pub use common::{Duration, FeedId, ItemId, MediaId};
pub use feed::{Feed, FeedPreferences, FeedType, LOCAL_FEED_PREFIX};
pub use item::{FeedItem, PlayState};
pub use media::FeedMedia;
