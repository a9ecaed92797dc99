// crates/sync-engine/src/protocol.rs
//! Batch payloads exchanged with the sync server

use crate::codec;
use crate::error::{SyncError, SyncResult};
use crate::types::SyncAction;
use serde::Deserialize;
use serde_json::Value;

/// Actions encoded for one upload request (a JSON array of records)
#[derive(Debug, Clone, PartialEq)]
pub struct ActionUpload {
    records: Vec<Value>,
}

impl ActionUpload {
    /// Encodes every action; fails if any action lacks a timestamp
    pub fn new(actions: &[SyncAction]) -> SyncResult<Self> {
        let records = actions
            .iter()
            .map(codec::encode)
            .collect::<SyncResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Number of records in the upload
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there is nothing to upload
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The request body as a JSON value
    pub fn to_json(&self) -> Value {
        Value::Array(self.records.clone())
    }

    /// The request body as a JSON string
    pub fn to_json_string(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(&self.records)?)
    }
}

#[derive(Deserialize)]
struct RawRemoteActions {
    #[serde(default)]
    actions: Vec<Value>,
    timestamp: i64,
}

/// Actions downloaded from the sync server
#[derive(Debug, Clone)]
pub struct RemoteActions {
    /// Successfully decoded actions, in server order
    pub actions: Vec<SyncAction>,
    /// Server timestamp to pass as `since` on the next download
    pub timestamp: i64,
    /// Number of records that could not be decoded
    pub skipped: usize,
}

impl RemoteActions {
    /// Parses a download response `{"actions": [...], "timestamp": N}`
    ///
    /// Undecodable records are skipped and counted, never fatal. Only a
    /// response that is not the expected envelope is an error.
    pub fn parse(json: &str) -> SyncResult<Self> {
        let raw: RawRemoteActions = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidData(format!("episode action response: {}", e)))?;

        let total = raw.actions.len();
        let actions: Vec<SyncAction> = raw.actions.iter().filter_map(codec::decode).collect();
        let skipped = total - actions.len();
        if skipped > 0 {
            log::debug!("Skipped {} of {} undecodable sync records", skipped, total);
        }

        Ok(Self {
            actions,
            timestamp: raw.timestamp,
            skipped,
        })
    }
}
