//! Feed data structures

use super::common::FeedId;
use super::item::FeedItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Download URL prefix marking a feed built from local files
pub const LOCAL_FEED_PREFIX: &str = "local:";

/// Type of feed format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    /// RSS 2.0 feed
    Rss,
    /// Atom feed
    Atom,
    /// Unknown or unsupported format
    #[default]
    Unknown,
}

/// Per-feed user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPreferences {
    /// Download new episodes automatically
    pub auto_download: bool,
    /// Include this feed in refreshes
    pub keep_updated: bool,
    /// HTTP auth user name
    pub username: Option<String>,
    /// HTTP auth password
    pub password: Option<String>,
}

impl Default for FeedPreferences {
    fn default() -> Self {
        Self {
            auto_download: false,
            keep_updated: true,
            username: None,
            password: None,
        }
    }
}

impl FeedPreferences {
    /// Returns true if `other` carries different credentials
    ///
    /// Only credentials travel with a refresh; everything else is a
    /// purely local choice.
    pub fn has_changed_credentials(&self, other: &FeedPreferences) -> bool {
        self.username != other.username || self.password != other.password
    }

    /// Adopts the credentials of `other`
    pub fn update_from(&mut self, other: &FeedPreferences) {
        self.username = other.username.clone();
        self.password = other.password.clone();
    }
}

/// A subscribed podcast and its episodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    /// Store-assigned id, `FeedId::UNSAVED` before the first commit
    #[serde(default)]
    pub id: FeedId,
    /// URL the feed is fetched from
    pub download_url: String,
    /// Explicit feed identifier, overrides the URL as identity
    #[serde(default)]
    pub feed_identifier: Option<String>,
    /// Feed title
    pub title: String,
    /// Website link
    #[serde(default)]
    pub link: Option<String>,
    /// Feed description
    #[serde(default)]
    pub description: Option<String>,
    /// Feed language
    #[serde(default)]
    pub language: Option<String>,
    /// Feed author
    #[serde(default)]
    pub author: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Episodes, newest first by convention
    #[serde(default)]
    pub items: Vec<FeedItem>,
    /// Page this item list came from (0 for the first page)
    #[serde(default)]
    pub page_nr: u32,
    /// Whether the feed is split across pages
    #[serde(default)]
    pub paged: bool,
    /// Cursor to the next page
    #[serde(default)]
    pub next_page_link: Option<String>,
    /// Time of the last successful refresh
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    /// Set when the last refresh failed
    #[serde(default)]
    pub last_update_failed: bool,
    /// Format of the feed document
    #[serde(default)]
    pub feed_type: FeedType,
    /// User preferences for this feed
    #[serde(default)]
    pub preferences: FeedPreferences,
}

impl Feed {
    /// Creates a new, unsaved feed
    pub fn new(download_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: FeedId::UNSAVED,
            download_url: download_url.into(),
            feed_identifier: None,
            title: title.into(),
            link: None,
            description: None,
            language: None,
            author: None,
            image_url: None,
            items: Vec::new(),
            page_nr: 0,
            paged: false,
            next_page_link: None,
            last_update: None,
            last_update_failed: false,
            feed_type: FeedType::Unknown,
            preferences: FeedPreferences::default(),
        }
    }

    /// Value used to find this feed before it has an id
    pub fn identifying_value(&self) -> &str {
        match self.feed_identifier.as_deref() {
            Some(identifier) if !identifier.is_empty() => identifier,
            _ => &self.download_url,
        }
    }

    /// Returns true for feeds built from local files
    pub fn is_local(&self) -> bool {
        self.download_url.starts_with(LOCAL_FEED_PREFIX)
    }

    /// Returns the number of items in the feed
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the feed has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an item to the feed
    pub fn add_item(&mut self, item: FeedItem) {
        self.items.push(item);
    }

    /// Sorts items by publication date (newest first, undated last)
    ///
    /// The sort is stable, so items sharing a date keep their order.
    /// Undated episodes cannot be placed in time, so a merge inserts them
    /// after every dated episode of the same batch.
    pub fn sort_by_date(&mut self) {
        self.items.sort_by(|a, b| match (&b.pub_date, &a.pub_date) {
            (Some(b_date), Some(a_date)) => b_date.cmp(a_date),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    /// Index of the item with the latest publication date
    ///
    /// The first of several equally recent items wins. `None` when no
    /// item is dated.
    pub fn most_recent_index(&self) -> Option<usize> {
        let mut best: Option<(usize, DateTime<Utc>)> = None;
        for (idx, item) in self.items.iter().enumerate() {
            if let Some(date) = item.pub_date {
                if best.map_or(true, |(_, best_date)| date > best_date) {
                    best = Some((idx, date));
                }
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Publication date of the most recent item
    pub fn most_recent_date(&self) -> Option<DateTime<Utc>> {
        self.most_recent_index()
            .and_then(|idx| self.items[idx].pub_date)
    }

    /// Returns true if `other` carries different feed-level attributes
    pub fn has_changed_attributes(&self, other: &Feed) -> bool {
        self.title != other.title
            || self.feed_identifier != other.feed_identifier
            || self.link != other.link
            || self.description != other.description
            || self.language != other.language
            || self.author != other.author
            || self.image_url != other.image_url
            || (other.paged && !self.paged)
            || self.next_page_link != other.next_page_link
    }

    /// Adopts feed-level attributes from `other`, keeping identity and items
    pub fn update_from(&mut self, other: &Feed) {
        if !other.title.is_empty() {
            self.title = other.title.clone();
        }
        if other.feed_identifier.is_some() {
            self.feed_identifier = other.feed_identifier.clone();
        }
        if other.link.is_some() {
            self.link = other.link.clone();
        }
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        if other.language.is_some() {
            self.language = other.language.clone();
        }
        if other.author.is_some() {
            self.author = other.author.clone();
        }
        if other.image_url.is_some() {
            self.image_url = other.image_url.clone();
        }
        if other.paged {
            self.paged = true;
        }
        self.next_page_link = other.next_page_link.clone();
    }

    /// Finds an item by identity
    pub fn find_item(&self, wanted: &FeedItem) -> Option<usize> {
        self.items.iter().position(|item| item.same_identity(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_feed_creation() {
        let feed = Feed::new("http://example.com/feed", "Test Feed");
        assert_eq!(feed.title, "Test Feed");
        assert_eq!(feed.feed_type, FeedType::Unknown);
        assert!(!feed.id.is_saved());
        assert!(feed.is_empty());
    }

    #[test]
    fn test_identifying_value() {
        let mut feed = Feed::new("http://example.com/feed", "T");
        assert_eq!(feed.identifying_value(), "http://example.com/feed");
        feed.feed_identifier = Some(String::new());
        assert_eq!(feed.identifying_value(), "http://example.com/feed");
        feed.feed_identifier = Some("urn:feed:1".to_string());
        assert_eq!(feed.identifying_value(), "urn:feed:1");
    }

    #[test]
    fn test_is_local() {
        assert!(Feed::new("local:/music", "L").is_local());
        assert!(!Feed::new("https://example.com", "R").is_local());
    }

    #[test]
    fn test_sort_by_date_newest_first_stable() {
        let mut feed = Feed::new("u", "t");
        feed.add_item(FeedItem::new("undated"));
        feed.add_item(FeedItem::new("old").with_pub_date(day(1)));
        feed.add_item(FeedItem::new("tie-a").with_pub_date(day(5)));
        feed.add_item(FeedItem::new("tie-b").with_pub_date(day(5)));
        feed.add_item(FeedItem::new("mid").with_pub_date(day(3)));

        feed.sort_by_date();

        let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["tie-a", "tie-b", "mid", "old", "undated"]);
    }

    #[test]
    fn test_most_recent() {
        let mut feed = Feed::new("u", "t");
        assert_eq!(feed.most_recent_index(), None);

        feed.add_item(FeedItem::new("a").with_pub_date(day(2)));
        feed.add_item(FeedItem::new("b").with_pub_date(day(9)));
        feed.add_item(FeedItem::new("c").with_pub_date(day(9)));
        feed.add_item(FeedItem::new("d"));

        assert_eq!(feed.most_recent_index(), Some(1));
        assert_eq!(feed.most_recent_date(), Some(day(9)));
    }

    #[test]
    fn test_attribute_compare_and_update() {
        let mut stored = Feed::new("u", "Old");
        stored.id = FeedId::new(5);
        let mut incoming = Feed::new("u", "New");
        incoming.description = Some("desc".to_string());

        assert!(stored.has_changed_attributes(&incoming));
        stored.update_from(&incoming);
        assert!(!stored.has_changed_attributes(&incoming));
        assert_eq!(stored.title, "New");
        assert_eq!(stored.id, FeedId::new(5));
    }

    #[test]
    fn test_preferences_compare_credentials_only() {
        let stored = FeedPreferences::default();
        let mut other = FeedPreferences {
            auto_download: true,
            ..FeedPreferences::default()
        };
        assert!(!stored.has_changed_credentials(&other));

        other.username = Some("alice".to_string());
        assert!(stored.has_changed_credentials(&other));

        let mut stored = stored;
        stored.update_from(&other);
        assert_eq!(stored.username.as_deref(), Some("alice"));
        assert!(!stored.auto_download);
    }

    #[test]
    fn test_find_item() {
        let mut feed = Feed::new("u", "t");
        feed.add_item(FeedItem::new("a").with_identifier("g1"));
        feed.add_item(FeedItem::new("b").with_identifier("g2"));
        assert_eq!(feed.find_item(&FeedItem::new("x").with_identifier("g2")), Some(1));
        assert_eq!(feed.find_item(&FeedItem::new("x").with_identifier("g3")), None);
    }
}
