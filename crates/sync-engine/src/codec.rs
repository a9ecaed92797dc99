// crates/sync-engine/src/codec.rs
//! JSON record format for sync actions
//!
//! ```json
//! {"podcast": "...", "episode": "...", "guid": "...", "action": "play",
//!  "timestamp": "2024-05-12T18:41:20", "started": 0, "position": 60, "total": 60}
//! ```
//!
//! `guid` is omitted when absent; `started`/`position`/`total` only appear
//! for play actions. Timestamps are UTC with second precision.

use crate::error::{SyncError, SyncResult};
use crate::types::{is_playback_range, ActionKind, SyncAction, UNSET_POSITION};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// `yyyy-MM-ddTHH:mm:ss`, always UTC
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Serialize)]
struct SyncActionRecord<'a> {
    podcast: &'a str,
    episode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    guid: Option<&'a str>,
    action: &'static str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    started: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<i64>,
}

/// Encodes an action into its JSON record
///
/// Fails only when the action has no timestamp.
pub fn encode(action: &SyncAction) -> SyncResult<Value> {
    let timestamp = action.timestamp().ok_or(SyncError::MissingTimestamp)?;
    let is_play = action.kind() == ActionKind::Play;
    let play_field = |value: i64| is_play.then_some(value);

    let record = SyncActionRecord {
        podcast: action.podcast(),
        episode: action.episode(),
        guid: action.guid(),
        action: action.kind().as_str(),
        timestamp: format_timestamp(timestamp),
        started: play_field(action.started()),
        position: play_field(action.position()),
        total: play_field(action.total()),
    };
    Ok(serde_json::to_value(record)?)
}

/// Encodes an action into a JSON string
pub fn encode_to_string(action: &SyncAction) -> SyncResult<String> {
    Ok(serde_json::to_string(&encode(action)?)?)
}

/// Decodes a JSON record
///
/// Returns `None` when `podcast`, `episode`, `action` or `timestamp` is
/// missing or malformed. A play record with an unusable range still
/// decodes, just without position data.
pub fn decode(record: &Value) -> Option<SyncAction> {
    let object = record.as_object()?;

    let podcast = non_empty_str(object, "podcast")?;
    let episode = non_empty_str(object, "episode")?;
    let kind: ActionKind = non_empty_str(object, "action")?.parse().ok()?;
    let timestamp = parse_timestamp(non_empty_str(object, "timestamp")?)?;

    let mut builder = SyncAction::builder(podcast, episode, kind).timestamp(timestamp);
    if let Some(guid) = non_empty_str(object, "guid") {
        builder = builder.guid(guid);
    }

    let started = int_or_unset(object, "started");
    let position = int_or_unset(object, "position");
    let total = int_or_unset(object, "total");
    if kind == ActionKind::Play && is_playback_range(started, position, total) {
        builder = builder.started(started).position(position).total(total);
    }

    Some(builder.build())
}

/// Decodes a JSON string; invalid JSON also yields `None`
pub fn decode_str(json: &str) -> Option<SyncAction> {
    let value: Value = serde_json::from_str(json).ok()?;
    decode(&value)
}

/// Formats a timestamp in the wire pattern
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a wire timestamp
///
/// Text after the pattern (fractional seconds, a `Z` suffix) is ignored.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_and_remainder(text, TIMESTAMP_FORMAT)
        .ok()
        .map(|(naive, _)| naive.and_utc())
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn int_or_unset(object: &Map<String, Value>, key: &str) -> i64 {
    match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .unwrap_or(UNSET_POSITION),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(UNSET_POSITION),
        _ => UNSET_POSITION,
    }
}

impl SyncAction {
    /// Encodes this action, see [`encode`]
    pub fn to_json(&self) -> SyncResult<Value> {
        encode(self)
    }

    /// Decodes an action, see [`decode`]
    pub fn from_json(record: &Value) -> Option<SyncAction> {
        decode(record)
    }
}
