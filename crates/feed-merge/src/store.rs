//! Persistent feed storage contract and an in-memory implementation

use crate::diagnostics::DiagnosticRecord;
use crate::error::{StoreError, StoreResult};
use castsync_core::{Feed, FeedId, FeedItem, ItemId, MediaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Feed and item persistence used by the merge engine
///
/// Every call blocks until the underlying write or read has completed and
/// either fully succeeds or reports an error. Feeds returned by
/// `find_feed_by_id` and `list_feeds` carry no items; use `load_items`.
pub trait FeedStore: Send + Sync {
    /// Looks up a feed by its store id
    fn find_feed_by_id(&self, id: FeedId) -> StoreResult<Option<Feed>>;

    /// Lists every stored feed
    fn list_feeds(&self) -> StoreResult<Vec<Feed>>;

    /// Loads a feed's items in stored order
    fn load_items(&self, feed: &Feed) -> StoreResult<Vec<FeedItem>>;

    /// Inserts a new feed with its items
    ///
    /// Assigns ids to the feed, its items and their media in place.
    fn insert_feed(&self, feed: &mut Feed) -> StoreResult<FeedId>;

    /// Replaces a stored feed and its item list
    ///
    /// Items and media without an id are assigned one in place. Items
    /// already stored keep their stored play state and media file,
    /// download flag and position; those values are copied back into
    /// `feed`. Local state only changes through `update_item_state` and
    /// `update_media`.
    fn update_feed(&self, feed: &mut Feed) -> StoreResult<()>;

    /// Deletes items belonging to `feed`
    fn delete_items(&self, feed: &Feed, items: &[FeedItem]) -> StoreResult<()>;

    /// Deletes a feed and all its items
    fn delete_feed(&self, id: FeedId) -> StoreResult<()>;

    /// Persists the media of a single item
    fn update_media(&self, item: &FeedItem) -> StoreResult<()>;

    /// Persists the play state of a single item
    fn update_item_state(&self, item: &FeedItem) -> StoreResult<()>;

    /// Appends a diagnostic record to the anomaly log
    fn record_diagnostic(&self, record: &DiagnosticRecord) -> StoreResult<()>;
}

/// Serializable copy of an [`InMemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Feeds with their items
    #[serde(default)]
    pub feeds: Vec<Feed>,
    /// Recorded diagnostics, oldest first
    #[serde(default)]
    pub diagnostics: Vec<DiagnosticRecord>,
}

#[derive(Debug, Default)]
struct StoreState {
    feeds: BTreeMap<FeedId, Feed>,
    items: BTreeMap<FeedId, Vec<FeedItem>>,
    diagnostics: Vec<DiagnosticRecord>,
    last_feed_id: u64,
    last_item_id: u64,
    last_media_id: u64,
}

impl StoreState {
    fn assign_item_ids(&mut self, feed_id: FeedId, items: &mut [FeedItem]) {
        for item in items {
            item.feed_id = feed_id;
            if !item.id.is_saved() {
                self.last_item_id += 1;
                item.id = ItemId::new(self.last_item_id);
            }
            if let Some(media) = item.media.as_mut() {
                if !media.id.is_saved() {
                    self.last_media_id += 1;
                    media.id = MediaId::new(self.last_media_id);
                }
            }
        }
    }

    /// Overwrites local state in `items` with what is already stored
    fn keep_local_state(&self, feed_id: FeedId, items: &mut [FeedItem]) {
        let Some(stored) = self.items.get(&feed_id) else {
            return;
        };
        for item in items.iter_mut().filter(|item| item.id.is_saved()) {
            let Some(row) = stored.iter().find(|row| row.id == item.id) else {
                continue;
            };
            item.state = row.state;
            if let (Some(media), Some(row_media)) = (item.media.as_mut(), row.media.as_ref()) {
                media.file_url = row_media.file_url.clone();
                media.downloaded = row_media.downloaded;
                media.position = row_media.position;
            }
        }
    }

    fn find_item_mut(&mut self, item: &FeedItem) -> StoreResult<&mut FeedItem> {
        self.items
            .get_mut(&item.feed_id)
            .and_then(|items| items.iter_mut().find(|s| s.id == item.id))
            .ok_or_else(|| StoreError::Backend(format!("item {} not found", item.id)))
    }

    fn store(&mut self, feed: &Feed) {
        let mut header = feed.clone();
        let items = std::mem::take(&mut header.items);
        self.items.insert(feed.id, items);
        self.feeds.insert(feed.id, header);
    }
}

/// Thread-safe store keeping everything in memory
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot
    ///
    /// Id counters continue after the highest id found in the snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut state = StoreState {
            diagnostics: snapshot.diagnostics,
            ..StoreState::default()
        };
        for feed in &snapshot.feeds {
            state.last_feed_id = state.last_feed_id.max(feed.id.get());
            for item in &feed.items {
                state.last_item_id = state.last_item_id.max(item.id.get());
                if let Some(media) = &item.media {
                    state.last_media_id = state.last_media_id.max(media.id.get());
                }
            }
        }
        for mut feed in snapshot.feeds {
            if !feed.id.is_saved() {
                state.last_feed_id += 1;
                feed.id = FeedId::new(state.last_feed_id);
            }
            let feed_id = feed.id;
            state.assign_item_ids(feed_id, &mut feed.items);
            state.store(&feed);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Copies the whole store, items included
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let state = self.lock()?;
        let feeds = state
            .feeds
            .values()
            .map(|header| {
                let mut feed = header.clone();
                feed.items = state.items.get(&header.id).cloned().unwrap_or_default();
                feed
            })
            .collect();
        Ok(StoreSnapshot {
            feeds,
            diagnostics: state.diagnostics.clone(),
        })
    }

    /// Returns a feed with its items loaded
    pub fn feed_with_items(&self, id: FeedId) -> StoreResult<Option<Feed>> {
        let state = self.lock()?;
        Ok(state.feeds.get(&id).map(|header| {
            let mut feed = header.clone();
            feed.items = state.items.get(&id).cloned().unwrap_or_default();
            feed
        }))
    }

    /// All recorded diagnostics, oldest first
    pub fn diagnostics(&self) -> StoreResult<Vec<DiagnosticRecord>> {
        Ok(self.lock()?.diagnostics.clone())
    }

    /// Number of stored feeds
    pub fn feed_count(&self) -> usize {
        self.state.lock().map(|s| s.feeds.len()).unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl FeedStore for InMemoryStore {
    fn find_feed_by_id(&self, id: FeedId) -> StoreResult<Option<Feed>> {
        Ok(self.lock()?.feeds.get(&id).cloned())
    }

    fn list_feeds(&self) -> StoreResult<Vec<Feed>> {
        Ok(self.lock()?.feeds.values().cloned().collect())
    }

    fn load_items(&self, feed: &Feed) -> StoreResult<Vec<FeedItem>> {
        let state = self.lock()?;
        if !state.feeds.contains_key(&feed.id) {
            return Err(StoreError::FeedNotFound(feed.id));
        }
        Ok(state.items.get(&feed.id).cloned().unwrap_or_default())
    }

    fn insert_feed(&self, feed: &mut Feed) -> StoreResult<FeedId> {
        let mut state = self.lock()?;
        state.last_feed_id += 1;
        feed.id = FeedId::new(state.last_feed_id);
        let feed_id = feed.id;
        state.assign_item_ids(feed_id, &mut feed.items);
        state.store(feed);
        log::debug!("Inserted feed {} ({} items)", feed.id, feed.items.len());
        Ok(feed.id)
    }

    fn update_feed(&self, feed: &mut Feed) -> StoreResult<()> {
        let mut state = self.lock()?;
        if !state.feeds.contains_key(&feed.id) {
            return Err(StoreError::FeedNotFound(feed.id));
        }
        let feed_id = feed.id;
        state.keep_local_state(feed_id, &mut feed.items);
        state.assign_item_ids(feed_id, &mut feed.items);
        state.store(feed);
        Ok(())
    }

    fn delete_items(&self, feed: &Feed, items: &[FeedItem]) -> StoreResult<()> {
        let mut state = self.lock()?;
        let stored = state
            .items
            .get_mut(&feed.id)
            .ok_or(StoreError::FeedNotFound(feed.id))?;
        stored.retain(|s| !items.iter().any(|doomed| doomed.id.is_saved() && doomed.id == s.id));
        Ok(())
    }

    fn delete_feed(&self, id: FeedId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.feeds.remove(&id).ok_or(StoreError::FeedNotFound(id))?;
        state.items.remove(&id);
        Ok(())
    }

    fn update_media(&self, item: &FeedItem) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.find_item_mut(item)?.media = item.media.clone();
        Ok(())
    }

    fn update_item_state(&self, item: &FeedItem) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.find_item_mut(item)?.state = item.state;
        Ok(())
    }

    fn record_diagnostic(&self, record: &DiagnosticRecord) -> StoreResult<()> {
        self.lock()?.diagnostics.push(record.clone());
        Ok(())
    }
}
