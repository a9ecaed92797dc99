//! Media linked to a feed item

use super::common::{Duration, MediaId};
use serde::{Deserialize, Serialize};

/// Downloadable media file (typically audio) attached to an episode
///
/// `download_url`, `size`, `mime_type` and `duration` come from the feed.
/// `file_url`, `downloaded` and `position` are local state and are never
/// touched when upstream metadata is adopted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMedia {
    /// Store-assigned id
    #[serde(default)]
    pub id: MediaId,
    /// Remote URL of the media file
    pub download_url: String,
    /// MIME type (e.g., "audio/mpeg")
    #[serde(default)]
    pub mime_type: Option<String>,
    /// File size in bytes, 0 if unknown
    #[serde(default)]
    pub size: u64,
    /// Playback length
    #[serde(default)]
    pub duration: Duration,
    /// Path of the downloaded file on this device
    #[serde(default)]
    pub file_url: Option<String>,
    /// Whether the file has been downloaded
    #[serde(default)]
    pub downloaded: bool,
    /// Last playback position
    #[serde(default)]
    pub position: Duration,
}

impl FeedMedia {
    /// Creates media pointing at a remote URL
    pub fn new(download_url: impl Into<String>) -> Self {
        Self {
            id: MediaId::UNSAVED,
            download_url: download_url.into(),
            mime_type: None,
            size: 0,
            duration: Duration::ZERO,
            file_url: None,
            downloaded: false,
            position: Duration::ZERO,
        }
    }

    /// Sets the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns the MIME family ("audio", "video", ...) if known
    pub fn mime_family(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .and_then(|mime| mime.split('/').next())
            .filter(|family| !family.is_empty())
    }

    /// Adopts upstream metadata from `other`, keeping local state
    pub fn update_from(&mut self, other: &FeedMedia) {
        self.download_url = other.download_url.clone();
        if other.size > 0 {
            self.size = other.size;
        }
        if other.mime_type.is_some() {
            self.mime_type = other.mime_type.clone();
        }
        if !other.duration.is_zero() {
            self.duration = other.duration;
        }
    }

    /// Returns a copy carrying only upstream metadata, no local state
    pub fn upstream_only(&self) -> FeedMedia {
        FeedMedia {
            id: MediaId::UNSAVED,
            download_url: self.download_url.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            duration: self.duration,
            file_url: None,
            downloaded: false,
            position: Duration::ZERO,
        }
    }

    /// Forgets the local file, e.g. after it disappeared from disk
    pub fn clear_local_file(&mut self) {
        self.downloaded = false;
        self.file_url = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_family() {
        let media = FeedMedia::new("http://example.com/a.mp3").with_mime_type("audio/mpeg");
        assert_eq!(media.mime_family(), Some("audio"));
        assert_eq!(FeedMedia::new("http://example.com/a").mime_family(), None);
    }

    #[test]
    fn test_update_from_keeps_local_state() {
        let mut stored = FeedMedia::new("http://example.com/old.mp3")
            .with_duration(Duration::from_seconds(60));
        stored.downloaded = true;
        stored.file_url = Some("/data/old.mp3".to_string());
        stored.position = Duration::from_seconds(30);

        let incoming = FeedMedia::new("http://example.com/new.mp3")
            .with_mime_type("audio/mpeg")
            .with_duration(Duration::from_seconds(90));
        stored.update_from(&incoming);

        assert_eq!(stored.download_url, "http://example.com/new.mp3");
        assert_eq!(stored.duration, Duration::from_seconds(90));
        assert_eq!(stored.mime_type.as_deref(), Some("audio/mpeg"));
        assert!(stored.downloaded);
        assert_eq!(stored.file_url.as_deref(), Some("/data/old.mp3"));
        assert_eq!(stored.position, Duration::from_seconds(30));
    }

    #[test]
    fn test_update_from_ignores_unknown_duration() {
        let mut stored = FeedMedia::new("u").with_duration(Duration::from_seconds(60));
        stored.update_from(&FeedMedia::new("u"));
        assert_eq!(stored.duration, Duration::from_seconds(60));
    }

    #[test]
    fn test_clear_local_file() {
        let mut media = FeedMedia::new("u");
        media.downloaded = true;
        media.file_url = Some("/tmp/u".to_string());
        media.clear_local_file();
        assert!(!media.downloaded);
        assert!(media.file_url.is_none());
    }
}
