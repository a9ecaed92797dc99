//! Reconciliation of freshly parsed feeds with stored state
//!
//! A merge runs in six steps:
//! 1. locate the stored feed by id or identifying value
//! 2. first subscribe: mark one episode new and insert
//! 3. update: sort, adopt attributes or just the next page link, adopt
//!    credentials, remember the newest stored publication date
//! 4. per item: skip in-feed duplicates, match by identity, repair
//!    changed identifiers, then update or insert
//! 5. optionally drop stored items the feed no longer lists
//! 6. commit to the store, then notify
//!
//! One merge runs at a time per engine, whatever feed it targets.

use crate::diagnostics::DiagnosticRecord;
use crate::error::{MergeError, MergeResult, StoreError, StoreResult};
use crate::events::{EventSink, FeedListUpdate, ItemEvent};
use crate::matcher::DuplicateMatcher;
use crate::options::MergeOptions;
use crate::store::FeedStore;
use castsync_config::WriteFailurePolicy;
use castsync_core::{Feed, FeedItem, PlayState};
use castsync_sync_engine::{ActionKind, SyncAction, SyncActionSink};
use std::sync::{Arc, Mutex};

/// Everything a merge produced besides its store writes
#[derive(Debug)]
pub struct MergeOutcome {
    /// The authoritative feed after the merge
    pub feed: Feed,
    /// Stored items dropped because the feed no longer lists them
    pub removed_items: Vec<FeedItem>,
    /// Anomalies detected in the incoming feed
    pub diagnostics: Vec<DiagnosticRecord>,
    /// Sync actions handed to the sync sink
    pub sync_actions: Vec<SyncAction>,
    /// Store failures tolerated under [`WriteFailurePolicy::LogAndContinue`]
    pub store_failures: Vec<StoreError>,
}

impl MergeOutcome {
    /// Returns true if every store write succeeded
    pub fn is_fully_persisted(&self) -> bool {
        self.store_failures.is_empty()
    }
}

#[derive(Debug, Default)]
struct Collected {
    diagnostics: Vec<DiagnosticRecord>,
    sync_actions: Vec<SyncAction>,
    store_failures: Vec<StoreError>,
}

/// Merges parsed feeds into the store
pub struct FeedMergeEngine {
    store: Arc<dyn FeedStore>,
    matcher: Arc<dyn DuplicateMatcher>,
    sync_sink: Arc<dyn SyncActionSink>,
    events: Arc<dyn EventSink>,
    options: MergeOptions,
    merge_lock: Mutex<()>,
}

impl FeedMergeEngine {
    /// Creates an engine with default options
    pub fn new(
        store: Arc<dyn FeedStore>,
        matcher: Arc<dyn DuplicateMatcher>,
        sync_sink: Arc<dyn SyncActionSink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            matcher,
            sync_sink,
            events,
            options: MergeOptions::default(),
            merge_lock: Mutex::new(()),
        }
    }

    /// Replaces the engine options
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges `incoming` into the store and returns the resulting feed
    ///
    /// With `remove_unlisted_items` the incoming item list is treated as
    /// exhaustive and stored items missing from it are deleted. Blocks
    /// until every store write has completed.
    pub fn update_feed(
        &self,
        mut incoming: Feed,
        remove_unlisted_items: bool,
    ) -> MergeResult<MergeOutcome> {
        let _guard = self.merge_lock.lock().map_err(|_| MergeError::LockPoisoned)?;
        let mut collected = Collected::default();

        match self.find_saved_feed(&incoming)? {
            None => {
                log::info!(
                    "No stored feed for '{}', adding as new",
                    incoming.title
                );
                mark_most_recent_new(&mut incoming);
                self.insert_new_feed(incoming, collected)
            }
            Some(saved) => {
                log::info!(
                    "Feed '{}' already stored as {}, merging",
                    incoming.title,
                    saved.id
                );
                self.merge_into(saved, incoming, remove_unlisted_items, &mut collected)
                    .and_then(|(feed, removed)| self.commit_update(feed, removed, collected))
            }
        }
    }

    /// Deletes the stored feed downloaded from `download_url`
    ///
    /// Returns false if no such feed is stored.
    pub fn remove_feed_with_download_url(&self, download_url: &str) -> MergeResult<bool> {
        let _guard = self.merge_lock.lock().map_err(|_| MergeError::LockPoisoned)?;

        let feeds = self.store.list_feeds()?;
        let Some(feed) = feeds.into_iter().find(|f| f.download_url == download_url) else {
            log::warn!("No feed with download URL {} to remove", download_url);
            return Ok(false);
        };

        self.store.delete_feed(feed.id)?;
        log::info!("Removed feed '{}' ({})", feed.title, feed.id);
        self.events
            .on_feed_list_changed(FeedListUpdate::Removed(feed.id));
        Ok(true)
    }

    /// Records that the downloaded file of `item` is gone
    ///
    /// Clears the local file state, persists the media and emits an item
    /// event. Items without media are left alone. Waits for a running
    /// merge to finish.
    pub fn notify_missing_media_file(&self, item: &mut FeedItem) -> MergeResult<()> {
        let _guard = self.merge_lock.lock().map_err(|_| MergeError::LockPoisoned)?;

        let Some(media) = item.media.as_mut() else {
            log::warn!("Item '{}' has no media, nothing to clear", item.title);
            return Ok(());
        };

        log::info!("Media file of '{}' is missing", item.title);
        media.clear_local_file();
        self.store.update_media(item)?;
        self.events
            .on_item_changed(ItemEvent::MediaDeleted(item.clone()));
        Ok(())
    }

    fn find_saved_feed(&self, incoming: &Feed) -> MergeResult<Option<Feed>> {
        let found = if incoming.id.is_saved() {
            self.store.find_feed_by_id(incoming.id)?
        } else {
            let identifying_value = incoming.identifying_value();
            self.store
                .list_feeds()?
                .into_iter()
                .find(|feed| feed.identifying_value() == identifying_value)
        };

        match found {
            Some(mut feed) => {
                feed.items = self.store.load_items(&feed)?;
                Ok(Some(feed))
            }
            None => Ok(None),
        }
    }

    fn insert_new_feed(&self, mut feed: Feed, mut collected: Collected) -> MergeResult<MergeOutcome> {
        let inserted = self.store.insert_feed(&mut feed);
        let canonical = match self.tolerate(inserted, "insert feed", &mut collected)? {
            Some(id) => {
                let reread = self.store.find_feed_by_id(id).and_then(|found| match found {
                    Some(mut stored) => {
                        stored.items = self.store.load_items(&stored)?;
                        Ok(Some(stored))
                    }
                    None => Ok(None),
                });
                self.tolerate(reread, "re-read inserted feed", &mut collected)?
                    .flatten()
            }
            None => None,
        };

        match &canonical {
            Some(stored) => self
                .events
                .on_feed_list_changed(FeedListUpdate::Updated(stored.clone())),
            None => self.events.on_feed_list_changed(FeedListUpdate::Empty),
        }

        Ok(MergeOutcome {
            feed: canonical.unwrap_or(feed),
            removed_items: Vec::new(),
            diagnostics: collected.diagnostics,
            sync_actions: collected.sync_actions,
            store_failures: collected.store_failures,
        })
    }

    fn merge_into(
        &self,
        mut saved: Feed,
        mut incoming: Feed,
        remove_unlisted_items: bool,
        collected: &mut Collected,
    ) -> MergeResult<(Feed, Vec<FeedItem>)> {
        incoming.sort_by_date();

        let same_page = incoming.page_nr == saved.page_nr;
        if same_page {
            if saved.has_changed_attributes(&incoming) {
                log::debug!("Feed '{}' has updated attributes", saved.title);
                saved.update_from(&incoming);
            }
        } else {
            log::debug!(
                "Page {} of '{}' is a continuation, only updating next page link",
                incoming.page_nr,
                saved.title
            );
            saved.next_page_link = incoming.next_page_link.clone();
        }

        if saved
            .preferences
            .has_changed_credentials(&incoming.preferences)
        {
            log::debug!("Feed '{}' has updated preferences", saved.title);
            saved.preferences.update_from(&incoming.preferences);
        }

        let prior_most_recent = saved.most_recent_date();

        let mut removed = Vec::new();
        if same_page {
            for idx in 0..incoming.items.len() {
                self.merge_item(&mut saved, &incoming, idx, prior_most_recent, collected)?;
            }

            if remove_unlisted_items {
                let (kept, unlisted): (Vec<_>, Vec<_>) =
                    std::mem::take(&mut saved.items).into_iter().partition(|stored| {
                        incoming
                            .items
                            .iter()
                            .any(|item| item.same_identity(stored))
                    });
                saved.items = kept;
                removed = unlisted;
                if !removed.is_empty() {
                    log::info!(
                        "Removing {} unlisted items from '{}'",
                        removed.len(),
                        saved.title
                    );
                }
            }
        }

        saved.last_update = incoming.last_update;
        saved.feed_type = incoming.feed_type;
        saved.last_update_failed = false;

        Ok((saved, removed))
    }

    fn merge_item(
        &self,
        saved: &mut Feed,
        incoming: &Feed,
        idx: usize,
        prior_most_recent: Option<chrono::DateTime<chrono::Utc>>,
        collected: &mut Collected,
    ) -> MergeResult<()> {
        let item = &incoming.items[idx];

        if !incoming.is_local() {
            let earlier = incoming.items[..idx]
                .iter()
                .find(|kept| self.matcher.seem_duplicates(kept, item));
            if let Some(kept) = earlier {
                log::info!(
                    "Skipping '{}', feed lists it twice (kept '{}')",
                    item.title,
                    kept.title
                );
                let record = DiagnosticRecord::duplicate_in_feed(saved, item, kept);
                return self.record_diagnostic(record, collected);
            }
        }

        let mut position = saved.find_item(item);
        if position.is_none() && !incoming.is_local() && self.options.repair_changed_identifiers {
            position = self.repair_changed_identifier(saved, item, collected)?;
        }

        match position {
            Some(pos) => saved.items[pos].update_from(item),
            None => {
                let mut fresh = item.clone();
                fresh.feed_id = saved.id;
                let is_new = match (fresh.pub_date, prior_most_recent) {
                    (Some(date), Some(prior)) => date >= prior,
                    _ => true,
                };
                if is_new {
                    log::debug!(
                        "Marking '{}' published {:?} new, prior most recent {:?}",
                        fresh.title,
                        fresh.pub_date,
                        prior_most_recent
                    );
                    fresh.set_new();
                }
                let at = idx.min(saved.items.len());
                saved.items.insert(at, fresh);
            }
        }
        Ok(())
    }

    fn repair_changed_identifier(
        &self,
        saved: &mut Feed,
        item: &FeedItem,
        collected: &mut Collected,
    ) -> MergeResult<Option<usize>> {
        let Some(pos) = saved
            .items
            .iter()
            .position(|stored| self.matcher.seem_duplicates(stored, item))
        else {
            return Ok(None);
        };

        log::info!(
            "Repairing changed identifier of '{}': {:?} -> {:?}",
            saved.items[pos].title,
            saved.items[pos].item_identifier,
            item.item_identifier
        );
        let record = DiagnosticRecord::changed_identifier(saved, &saved.items[pos], item);
        self.record_diagnostic(record, collected)?;
        saved.items[pos].item_identifier = item.item_identifier.clone();

        let stored = &saved.items[pos];
        if stored.is_played() {
            if let Some(builder) = SyncAction::for_item(saved, stored, ActionKind::Play) {
                let seconds = stored
                    .media
                    .as_ref()
                    .map_or(0, |media| media.duration.as_seconds()) as i64;
                if seconds == 0 {
                    // decodes back as an unset range
                    log::warn!(
                        "'{}' has no known duration, sending an empty play range",
                        stored.title
                    );
                }
                let action = builder
                    .current_timestamp()
                    .started(seconds)
                    .position(seconds)
                    .total(seconds)
                    .build();
                self.sync_sink.enqueue_if_enabled(action.clone());
                collected.sync_actions.push(action);
            }
        }
        Ok(Some(pos))
    }

    fn commit_update(
        &self,
        mut feed: Feed,
        removed: Vec<FeedItem>,
        mut collected: Collected,
    ) -> MergeResult<MergeOutcome> {
        let updated = self.store.update_feed(&mut feed);
        self.tolerate(updated, "update feed", &mut collected)?;

        if !removed.is_empty() {
            let deleted = self.store.delete_items(&feed, &removed);
            self.tolerate(deleted, "delete unlisted items", &mut collected)?;
        }

        self.events
            .on_feed_list_changed(FeedListUpdate::Updated(feed.clone()));

        Ok(MergeOutcome {
            feed,
            removed_items: removed,
            diagnostics: collected.diagnostics,
            sync_actions: collected.sync_actions,
            store_failures: collected.store_failures,
        })
    }

    fn record_diagnostic(
        &self,
        record: DiagnosticRecord,
        collected: &mut Collected,
    ) -> MergeResult<()> {
        let written = self.store.record_diagnostic(&record);
        self.tolerate(written, "record diagnostic", collected)?;
        collected.diagnostics.push(record);
        Ok(())
    }

    /// Applies the write failure policy to a store write
    ///
    /// Returns `Ok(None)` for a failure that was logged and kept.
    fn tolerate<T>(
        &self,
        result: StoreResult<T>,
        operation: &str,
        collected: &mut Collected,
    ) -> MergeResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => match self.options.write_failure_policy {
                WriteFailurePolicy::Propagate => Err(err.into()),
                WriteFailurePolicy::LogAndContinue => {
                    log::warn!("Store failed to {}, continuing: {}", operation, err);
                    collected.store_failures.push(err);
                    Ok(None)
                }
            },
        }
    }
}

/// Marks the most recent item new and every other item not new
///
/// Falls back to the first item when nothing is dated.
fn mark_most_recent_new(feed: &mut Feed) {
    let newest = feed
        .most_recent_index()
        .or_else(|| (!feed.items.is_empty()).then_some(0));
    for (idx, item) in feed.items.iter_mut().enumerate() {
        if Some(idx) == newest {
            item.set_new();
        } else if item.is_new() {
            item.state = PlayState::Unplayed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dated(title: &str, day: u32) -> FeedItem {
        FeedItem::new(title)
            .with_identifier(title)
            .with_pub_date(Utc.with_ymd_and_hms(2024, 3, day, 6, 0, 0).unwrap())
    }

    #[test]
    fn test_mark_most_recent_new_by_date() {
        let mut feed = Feed::new("http://x/feed", "X");
        feed.add_item(dated("old", 1));
        feed.add_item(dated("newest", 9));
        feed.add_item(dated("mid", 5));
        feed.items[0].set_new();

        mark_most_recent_new(&mut feed);

        let new: Vec<_> = feed.items.iter().filter(|i| i.is_new()).collect();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].title, "newest");
    }

    #[test]
    fn test_mark_most_recent_new_without_dates() {
        let mut feed = Feed::new("http://x/feed", "X");
        feed.add_item(FeedItem::new("first"));
        feed.add_item(FeedItem::new("second"));

        mark_most_recent_new(&mut feed);

        assert!(feed.items[0].is_new());
        assert!(!feed.items[1].is_new());
    }

    #[test]
    fn test_mark_most_recent_new_empty_feed() {
        let mut feed = Feed::new("http://x/feed", "X");
        mark_most_recent_new(&mut feed);
        assert!(feed.items.is_empty());
    }
}
