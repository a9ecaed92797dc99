// crates/sync-engine/src/queue.rs
//! Pending queue for outgoing sync actions

use crate::error::{SyncError, SyncResult};
use crate::types::SyncAction;
use std::sync::{Arc, Mutex};

/// Receives actions produced by the feed merge and playback reporting
///
/// Callers always hand actions over; the sink decides whether
/// synchronization is active and silently drops them otherwise.
pub trait SyncActionSink: Send + Sync {
    /// Queues `action` for upload if synchronization is enabled
    fn enqueue_if_enabled(&self, action: SyncAction);
}

#[derive(Debug, Default)]
struct QueueState {
    enabled: bool,
    actions: Vec<SyncAction>,
}

/// In-memory queue of actions waiting for upload
#[derive(Debug, Clone, Default)]
pub struct SyncQueue {
    state: Arc<Mutex<QueueState>>,
}

impl SyncQueue {
    /// Creates an empty queue
    pub fn new(enabled: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                enabled,
                actions: Vec::new(),
            })),
        }
    }

    /// Returns true if actions are currently accepted
    pub fn is_enabled(&self) -> bool {
        self.state.lock().map(|s| s.enabled).unwrap_or(false)
    }

    /// Turns synchronization on or off
    ///
    /// Turning it off discards whatever is still pending.
    pub fn set_enabled(&self, enabled: bool) -> SyncResult<()> {
        let mut state = self.state.lock().map_err(|_| SyncError::LockPoisoned)?;
        state.enabled = enabled;
        if !enabled {
            state.actions.clear();
        }
        Ok(())
    }

    /// Gets all pending actions in arrival order
    pub fn pending(&self) -> SyncResult<Vec<SyncAction>> {
        let state = self.state.lock().map_err(|_| SyncError::LockPoisoned)?;
        Ok(state.actions.clone())
    }

    /// Removes and returns all pending actions
    pub fn drain(&self) -> SyncResult<Vec<SyncAction>> {
        let mut state = self.state.lock().map_err(|_| SyncError::LockPoisoned)?;
        Ok(std::mem::take(&mut state.actions))
    }

    /// Clears all pending actions
    pub fn clear(&self) -> SyncResult<()> {
        let mut state = self.state.lock().map_err(|_| SyncError::LockPoisoned)?;
        state.actions.clear();
        Ok(())
    }

    /// Returns the number of pending actions
    pub fn pending_count(&self) -> usize {
        self.state.lock().map(|s| s.actions.len()).unwrap_or(0)
    }
}

impl SyncActionSink for SyncQueue {
    fn enqueue_if_enabled(&self, action: SyncAction) {
        match self.state.lock() {
            Ok(mut state) if state.enabled => {
                log::debug!("Queued sync action: {}", action);
                state.actions.push(action);
            }
            Ok(_) => log::debug!("Synchronization disabled, dropping {}", action),
            Err(_) => log::warn!("Sync queue lock poisoned, dropping {}", action),
        }
    }
}
