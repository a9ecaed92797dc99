// crates/sync-engine/src/types.rs
//! Sync action value model

use castsync_core::{Feed, FeedItem};
use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Value of `started`/`position`/`total` when no playback range is known
///
/// Decoding only keeps a range with `position > 0` and `total > 0`, so a
/// PLAY action encoded as 0/0/0 comes back with this value in all three.
pub const UNSET_POSITION: i64 = -1;

/// Kind of episode event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Episode appeared in a feed
    New,
    /// Episode was downloaded
    Download,
    /// Episode was (partially) played
    Play,
    /// Downloaded file was deleted
    Delete,
}

impl ActionKind {
    /// Lower-case wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::New => "new",
            ActionKind::Download => "download",
            ActionKind::Play => "play",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ();

    /// Parses a wire token, ignoring ASCII case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ActionKind::New,
            ActionKind::Download,
            ActionKind::Play,
            ActionKind::Delete,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
        .ok_or(())
    }
}

/// One playback or lifecycle event, exchanged with other devices
///
/// Immutable once built. The playback range (`started`, `position`,
/// `total`, in seconds) only exists for [`ActionKind::Play`]; for every
/// other kind it stays at [`UNSET_POSITION`].
///
/// Equality ignores the action kind. See DESIGN.md before relying on it.
#[derive(Debug, Clone)]
pub struct SyncAction {
    podcast: String,
    episode: String,
    guid: Option<String>,
    kind: ActionKind,
    timestamp: Option<DateTime<Utc>>,
    started: i64,
    position: i64,
    total: i64,
}

impl SyncAction {
    /// Starts building an action
    pub fn builder(
        podcast: impl Into<String>,
        episode: impl Into<String>,
        kind: ActionKind,
    ) -> SyncActionBuilder {
        SyncActionBuilder {
            podcast: podcast.into(),
            episode: episode.into(),
            guid: None,
            kind,
            timestamp: None,
            started: UNSET_POSITION,
            position: UNSET_POSITION,
            total: UNSET_POSITION,
        }
    }

    /// Starts building an action about an episode of `feed`
    ///
    /// Returns `None` when the item has no media, since the episode is
    /// identified by its media URL on the wire.
    pub fn for_item(feed: &Feed, item: &FeedItem, kind: ActionKind) -> Option<SyncActionBuilder> {
        let media = item.media.as_ref()?;
        let mut builder = Self::builder(feed.download_url.clone(), media.download_url.clone(), kind);
        if let Some(guid) = item.item_identifier.as_deref() {
            builder = builder.guid(guid);
        }
        Some(builder)
    }

    /// Feed URL
    pub fn podcast(&self) -> &str {
        &self.podcast
    }

    /// Media URL
    pub fn episode(&self) -> &str {
        &self.episode
    }

    /// Episode GUID, never empty
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Event kind
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// When the event happened (second precision)
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Playback start in seconds, or [`UNSET_POSITION`]
    pub fn started(&self) -> i64 {
        self.started
    }

    /// Playback stop position in seconds, or [`UNSET_POSITION`]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Episode length in seconds, or [`UNSET_POSITION`]
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Returns true if this is a play event carrying a usable range
    pub fn has_playback_range(&self) -> bool {
        self.kind == ActionKind::Play && is_playback_range(self.started, self.position, self.total)
    }
}

/// Validity rule for a playback range read from the wire
pub(crate) fn is_playback_range(started: i64, position: i64, total: i64) -> bool {
    started >= 0 && position > 0 && total > 0
}

impl PartialEq for SyncAction {
    fn eq(&self, other: &Self) -> bool {
        self.podcast == other.podcast
            && self.episode == other.episode
            && self.guid == other.guid
            && self.timestamp == other.timestamp
            && self.started == other.started
            && self.position == other.position
            && self.total == other.total
    }
}

impl Eq for SyncAction {}

impl Hash for SyncAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.podcast.hash(state);
        self.episode.hash(state);
        self.guid.hash(state);
        self.timestamp.hash(state);
        self.started.hash(state);
        self.position.hash(state);
        self.total.hash(state);
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.episode, self.podcast)?;
        if self.has_playback_range() {
            write!(f, " {}..{}/{}s", self.started, self.position, self.total)?;
        }
        Ok(())
    }
}

/// Builder for [`SyncAction`]
#[derive(Debug, Clone)]
pub struct SyncActionBuilder {
    podcast: String,
    episode: String,
    guid: Option<String>,
    kind: ActionKind,
    timestamp: Option<DateTime<Utc>>,
    started: i64,
    position: i64,
    total: i64,
}

impl SyncActionBuilder {
    /// Sets the GUID; empty strings are dropped
    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        let guid = guid.into();
        self.guid = if guid.is_empty() { None } else { Some(guid) };
        self
    }

    /// Sets the timestamp, truncated to whole seconds
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp.trunc_subsecs(0));
        self
    }

    /// Stamps the action with the current time
    pub fn current_timestamp(self) -> Self {
        self.timestamp(Utc::now())
    }

    /// Playback start in seconds; ignored unless this is a play action
    pub fn started(mut self, seconds: i64) -> Self {
        if self.kind == ActionKind::Play {
            self.started = seconds;
        }
        self
    }

    /// Playback stop position in seconds; ignored unless this is a play action
    pub fn position(mut self, seconds: i64) -> Self {
        if self.kind == ActionKind::Play {
            self.position = seconds;
        }
        self
    }

    /// Episode length in seconds; ignored unless this is a play action
    pub fn total(mut self, seconds: i64) -> Self {
        if self.kind == ActionKind::Play {
            self.total = seconds;
        }
        self
    }

    /// Finishes the action
    pub fn build(self) -> SyncAction {
        SyncAction {
            podcast: self.podcast,
            episode: self.episode,
            guid: self.guid,
            kind: self.kind,
            timestamp: self.timestamp,
            started: self.started,
            position: self.position,
            total: self.total,
        }
    }
}
