//! Human readable records of upstream feed anomalies
//!
//! These end up in the "why did my feed do this" log. They never abort a
//! refresh.

use castsync_core::{Feed, FeedId, FeedItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category of a diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The feed listed the same episode twice, or changed an episode's id
    ParserDuplicate,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ParserDuplicate => write!(f, "parser-duplicate"),
        }
    }
}

/// One anomaly detected while merging a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// Unique record id
    pub id: String,
    /// Feed the anomaly was found in
    pub feed_id: FeedId,
    /// Feed title at the time of the merge
    pub feed_title: String,
    /// Title of the affected episode
    pub item_title: String,
    /// Category
    pub kind: DiagnosticKind,
    /// Explanation including both episodes' details
    pub message: String,
    /// When the anomaly was detected
    pub recorded_at: DateTime<Utc>,
}

impl DiagnosticRecord {
    fn new(feed: &Feed, item_title: &str, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            feed_id: feed.id,
            feed_title: feed.title.clone(),
            item_title: item_title.to_string(),
            kind: DiagnosticKind::ParserDuplicate,
            message,
            recorded_at: Utc::now(),
        }
    }

    /// The incoming feed lists `skipped` although `kept` is the same episode
    pub fn duplicate_in_feed(feed: &Feed, skipped: &FeedItem, kept: &FeedItem) -> Self {
        let message = format!(
            "The podcast host appears to have added the same episode twice. \
             The feed was still refreshed and the duplicate was ignored.\
             \n\nIgnored episode:\n{}\n\nEpisode kept from earlier in the feed:\n{}",
            episode_details(skipped),
            episode_details(kept),
        );
        Self::new(feed, &skipped.title, message)
    }

    /// The host changed the identifier of `stored`; it now arrives as `incoming`
    pub fn changed_identifier(feed: &Feed, stored: &FeedItem, incoming: &FeedItem) -> Self {
        let message = format!(
            "The podcast host changed the ID of an existing episode instead of just \
             updating the episode itself. The feed was still refreshed and the episode \
             was repaired.\n\nOriginal episode:\n{}\n\nNow the feed contains:\n{}",
            episode_details(stored),
            episode_details(incoming),
        );
        Self::new(feed, &incoming.title, message)
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} / {}: {}",
            self.kind, self.feed_title, self.item_title, self.message
        )
    }
}

/// Title, identifier and media URL of an episode, one per line
pub fn episode_details(item: &FeedItem) -> String {
    let mut details = format!(
        "Title: {}\nID: {}",
        item.title,
        item.item_identifier.as_deref().unwrap_or("")
    );
    if let Some(url) = item.media_url() {
        details.push_str("\nURL: ");
        details.push_str(url);
    }
    details
}
