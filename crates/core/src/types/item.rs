//! Feed items (episodes)

use super::common::{FeedId, ItemId};
use super::media::FeedMedia;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local play state of an episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    /// Shown in the "new" inbox
    New,
    /// Known but not played
    #[default]
    Unplayed,
    /// Played (read)
    Played,
}

/// A single episode in a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Store-assigned id
    #[serde(default)]
    pub id: ItemId,
    /// Id of the owning feed
    #[serde(default)]
    pub feed_id: FeedId,
    /// Upstream GUID; feeds sometimes change it
    #[serde(default)]
    pub item_identifier: Option<String>,
    /// Episode title
    pub title: String,
    /// Episode description
    #[serde(default)]
    pub description: Option<String>,
    /// Episode web page
    #[serde(default)]
    pub link: Option<String>,
    /// Episode artwork
    #[serde(default)]
    pub image_url: Option<String>,
    /// Publication date
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    /// Local play state
    #[serde(default)]
    pub state: PlayState,
    /// Linked media
    #[serde(default)]
    pub media: Option<FeedMedia>,
}

impl FeedItem {
    /// Creates an item with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ItemId::UNSAVED,
            feed_id: FeedId::UNSAVED,
            item_identifier: None,
            title: title.into(),
            description: None,
            link: None,
            image_url: None,
            pub_date: None,
            state: PlayState::Unplayed,
            media: None,
        }
    }

    /// Sets the upstream identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.item_identifier = Some(identifier.into());
        self
    }

    /// Sets the publication date
    pub fn with_pub_date(mut self, pub_date: DateTime<Utc>) -> Self {
        self.pub_date = Some(pub_date);
        self
    }

    /// Attaches media
    pub fn with_media(mut self, media: FeedMedia) -> Self {
        self.media = Some(media);
        self
    }

    /// Token used to recognise the same episode across refreshes
    ///
    /// The GUID when present, else the title, else the media URL.
    pub fn identifying_value(&self) -> Option<&str> {
        non_empty(self.item_identifier.as_deref())
            .or_else(|| non_empty(Some(self.title.as_str())))
            .or_else(|| non_empty(self.media.as_ref().map(|m| m.download_url.as_str())))
    }

    /// Returns true if both items carry the same identifying value
    pub fn same_identity(&self, other: &FeedItem) -> bool {
        match (self.identifying_value(), other.identifying_value()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns true if this item is in the "new" inbox
    pub fn is_new(&self) -> bool {
        self.state == PlayState::New
    }

    /// Returns true if this item has been played
    pub fn is_played(&self) -> bool {
        self.state == PlayState::Played
    }

    /// Puts the item into the "new" inbox
    pub fn set_new(&mut self) {
        self.state = PlayState::New;
    }

    /// Returns the media download URL if any
    pub fn media_url(&self) -> Option<&str> {
        self.media.as_ref().map(|m| m.download_url.as_str())
    }

    /// Adopts upstream metadata from `other`
    ///
    /// Identity (`id`, `feed_id`, `item_identifier`) and local state
    /// (`state`, media file/download/position) are left alone.
    pub fn update_from(&mut self, other: &FeedItem) {
        self.title = other.title.clone();
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        if other.link.is_some() {
            self.link = other.link.clone();
        }
        if other.image_url.is_some() {
            self.image_url = other.image_url.clone();
        }
        if other.pub_date.is_some() {
            self.pub_date = other.pub_date;
        }
        match (&mut self.media, &other.media) {
            (Some(mine), Some(theirs)) => mine.update_from(theirs),
            (None, Some(theirs)) => self.media = Some(theirs.upstream_only()),
            _ => {}
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Duration;
    use chrono::TimeZone;

    #[test]
    fn test_identifying_value_prefers_guid() {
        let item = FeedItem::new("Title")
            .with_identifier("guid-1")
            .with_media(FeedMedia::new("http://example.com/1.mp3"));
        assert_eq!(item.identifying_value(), Some("guid-1"));
    }

    #[test]
    fn test_identifying_value_falls_back_to_title_then_url() {
        let item = FeedItem::new("Title").with_identifier("");
        assert_eq!(item.identifying_value(), Some("Title"));

        let item = FeedItem::new("").with_media(FeedMedia::new("http://example.com/1.mp3"));
        assert_eq!(item.identifying_value(), Some("http://example.com/1.mp3"));

        assert_eq!(FeedItem::new("").identifying_value(), None);
    }

    #[test]
    fn test_items_without_identity_never_match() {
        assert!(!FeedItem::new("").same_identity(&FeedItem::new("")));
        assert!(FeedItem::new("a").same_identity(&FeedItem::new("a")));
    }

    #[test]
    fn test_update_from_keeps_local_state() {
        let mut stored = FeedItem::new("Old title")
            .with_identifier("g")
            .with_media(FeedMedia::new("http://example.com/old.mp3"));
        stored.id = ItemId::new(3);
        stored.feed_id = FeedId::new(1);
        stored.state = PlayState::Played;
        if let Some(media) = stored.media.as_mut() {
            media.downloaded = true;
            media.file_url = Some("/data/old.mp3".to_string());
        }

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let incoming = FeedItem::new("New title")
            .with_identifier("g")
            .with_pub_date(date)
            .with_media(
                FeedMedia::new("http://example.com/new.mp3")
                    .with_duration(Duration::from_seconds(120)),
            );

        stored.update_from(&incoming);

        assert_eq!(stored.title, "New title");
        assert_eq!(stored.pub_date, Some(date));
        assert_eq!(stored.id, ItemId::new(3));
        assert_eq!(stored.feed_id, FeedId::new(1));
        assert!(stored.is_played());
        let media = stored.media.as_ref().unwrap();
        assert_eq!(media.download_url, "http://example.com/new.mp3");
        assert!(media.downloaded);
        assert_eq!(media.file_url.as_deref(), Some("/data/old.mp3"));
    }

    #[test]
    fn test_update_from_adopts_media_without_local_state() {
        let mut stored = FeedItem::new("t");
        let mut media = FeedMedia::new("http://example.com/x.mp3");
        media.downloaded = true;
        stored.update_from(&FeedItem::new("t").with_media(media));
        assert!(!stored.media.as_ref().unwrap().downloaded);
    }

    #[test]
    fn test_default_state_is_unplayed() {
        let item = FeedItem::new("t");
        assert_eq!(item.state, PlayState::Unplayed);
        assert!(!item.is_new());
    }
}
