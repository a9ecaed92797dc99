//! Guessing whether two episodes are the same despite different ids

use castsync_config::MergeConfig;
use castsync_core::{Duration, FeedItem};

/// Decides whether two items are likely the same episode
///
/// Used both to spot an episode listed twice in one refresh and to
/// recognise a stored episode whose identifier was changed upstream.
pub trait DuplicateMatcher: Send + Sync {
    /// Returns true if `a` and `b` probably describe the same episode
    fn seem_duplicates(&self, a: &FeedItem, b: &FeedItem) -> bool;
}

impl<F> DuplicateMatcher for F
where
    F: Fn(&FeedItem, &FeedItem) -> bool + Send + Sync,
{
    fn seem_duplicates(&self, a: &FeedItem, b: &FeedItem) -> bool {
        self(a, b)
    }
}

/// Default heuristic
///
/// Two items are duplicates when they share a non-empty identifier or
/// media URL, or when title, publication date, duration and MIME family
/// all look alike.
#[derive(Debug, Clone)]
pub struct EpisodeDuplicateGuesser {
    date_tolerance: chrono::Duration,
    duration_tolerance: Duration,
}

impl Default for EpisodeDuplicateGuesser {
    fn default() -> Self {
        Self {
            date_tolerance: chrono::Duration::hours(24),
            duration_tolerance: Duration::from_seconds(600),
        }
    }
}

impl EpisodeDuplicateGuesser {
    /// Creates a guesser with explicit tolerances
    pub fn new(date_tolerance: chrono::Duration, duration_tolerance: Duration) -> Self {
        Self {
            date_tolerance,
            duration_tolerance,
        }
    }

    /// Creates a guesser from the `[merge]` config section
    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(
            chrono::Duration::hours(i64::from(config.duplicate_date_tolerance_hours)),
            Duration::from_seconds(config.duplicate_duration_tolerance_secs),
        )
    }

    fn dates_look_similar(&self, a: &FeedItem, b: &FeedItem) -> bool {
        match (a.pub_date, b.pub_date) {
            (Some(x), Some(y)) => (x - y).abs() <= self.date_tolerance,
            _ => false,
        }
    }
}

impl DuplicateMatcher for EpisodeDuplicateGuesser {
    fn seem_duplicates(&self, a: &FeedItem, b: &FeedItem) -> bool {
        if same_and_not_empty(a.item_identifier.as_deref(), b.item_identifier.as_deref()) {
            return true;
        }
        let (Some(media_a), Some(media_b)) = (&a.media, &b.media) else {
            return false;
        };
        if same_and_not_empty(
            Some(media_a.download_url.as_str()),
            Some(media_b.download_url.as_str()),
        ) {
            return true;
        }

        let durations_similar =
            media_a.duration.abs_diff(media_b.duration) < self.duration_tolerance;
        let mime_similar = match (media_a.mime_family(), media_b.mime_family()) {
            (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
            _ => true,
        };

        titles_look_similar(&a.title, &b.title)
            && self.dates_look_similar(a, b)
            && durations_similar
            && mime_similar
    }
}

fn same_and_not_empty(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => !x.is_empty() && x == y,
        _ => false,
    }
}

fn titles_look_similar(a: &str, b: &str) -> bool {
    let canonical = |title: &str| {
        title
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let a = canonical(a);
    !a.is_empty() && a == canonical(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use castsync_core::FeedMedia;
    use chrono::{TimeZone, Utc};

    fn episode(guid: &str, title: &str, url: &str, hour: u32, minutes: u64) -> FeedItem {
        FeedItem::new(title)
            .with_identifier(guid)
            .with_pub_date(Utc.with_ymd_and_hms(2024, 2, 10, hour, 0, 0).unwrap())
            .with_media(
                FeedMedia::new(url)
                    .with_mime_type("audio/mpeg")
                    .with_duration(Duration::from_seconds(minutes * 60)),
            )
    }

    #[test]
    fn test_same_identifier() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = FeedItem::new("One").with_identifier("g");
        let b = FeedItem::new("Two").with_identifier("g");
        assert!(guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_empty_identifiers_do_not_match() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = FeedItem::new("One").with_identifier("");
        let b = FeedItem::new("Two").with_identifier("");
        assert!(!guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_same_media_url() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = episode("a", "One", "http://x/1.mp3", 1, 30);
        let b = episode("b", "Completely different", "http://x/1.mp3", 20, 90);
        assert!(guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_similar_metadata() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = episode("a", "Episode  42: The Answer", "http://x/1.mp3", 8, 60);
        let b = episode("b", "episode 42: the answer", "http://cdn/1.mp3", 9, 62);
        assert!(guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_different_titles() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = episode("a", "Episode 42", "http://x/42.mp3", 8, 60);
        let b = episode("b", "Episode 43", "http://x/43.mp3", 8, 60);
        assert!(!guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_durations_too_far_apart() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = episode("a", "Same", "http://x/1.mp3", 8, 60);
        let b = episode("b", "Same", "http://x/2.mp3", 8, 75);
        assert!(!guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_mime_families_must_agree() {
        let guesser = EpisodeDuplicateGuesser::default();
        let a = episode("a", "Same", "http://x/1.mp3", 8, 60);
        let mut b = episode("b", "Same", "http://x/1.mp4", 8, 60);
        b.media.as_mut().unwrap().mime_type = Some("video/mp4".to_string());
        assert!(!guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_configured_date_tolerance() {
        let strict =
            EpisodeDuplicateGuesser::new(chrono::Duration::zero(), Duration::from_seconds(600));
        let a = episode("a", "Same", "http://x/1.mp3", 8, 60);
        let b = episode("b", "Same", "http://x/2.mp3", 9, 60);
        assert!(!strict.seem_duplicates(&a, &b));
        assert!(EpisodeDuplicateGuesser::default().seem_duplicates(&a, &b));
    }

    #[test]
    fn test_from_config() {
        let config = MergeConfig::default();
        let guesser = EpisodeDuplicateGuesser::from_config(&config);
        let a = episode("a", "Same", "http://x/1.mp3", 8, 60);
        let b = episode("b", "Same", "http://x/2.mp3", 9, 61);
        assert!(guesser.seem_duplicates(&a, &b));
    }

    #[test]
    fn test_closure_matcher() {
        let by_title = |a: &FeedItem, b: &FeedItem| a.title == b.title;
        assert!(by_title.seem_duplicates(&FeedItem::new("x"), &FeedItem::new("x")));
        assert!(!by_title.seem_duplicates(&FeedItem::new("x"), &FeedItem::new("y")));
    }
}
