//! In-process document store for room state.
//!
//! Implements the contract the game core needs from its store: create or
//! overwrite a document by room code, get-once, subscribe for a push stream
//! of full snapshots, and partial-field updates that overwrite only the
//! named fields. Writers race last-writer-wins per field set; there are no
//! transactions and no per-field ownership.

use dashmap::DashMap;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::game::state::{RoomPatch, RoomState};

/// Buffered snapshots per subscriber. Slow readers get `Lagged` and pick up
/// the latest snapshot on the next recv, which is all they need.
const SNAPSHOT_BUFFER: usize = 32;

struct RoomDoc {
    state: RoomState,
    created_at: OffsetDateTime,
    tx: broadcast::Sender<RoomState>,
}

/// Registry of room documents with per-room snapshot fan-out.
#[derive(Default)]
pub struct DocStore {
    docs: DashMap<String, RoomDoc>,
}

/// Lobby listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub code: String,
    pub players: usize,
    pub is_paused: bool,
}

impl DocStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the document at `code`.
    pub fn create(&self, code: &str, state: RoomState) {
        let (tx, _rx) = broadcast::channel(SNAPSHOT_BUFFER);
        self.docs.insert(
            code.to_string(),
            RoomDoc {
                state,
                created_at: OffsetDateTime::now_utc(),
                tx,
            },
        );
    }

    pub fn contains(&self, code: &str) -> bool {
        self.docs.contains_key(code)
    }

    /// Get-once read of the current snapshot.
    pub fn get(&self, code: &str) -> Option<RoomState> {
        self.docs.get(code).map(|doc| doc.state.clone())
    }

    /// Current snapshot plus a stream of every subsequent one.
    pub fn subscribe(
        &self,
        code: &str,
    ) -> Result<(RoomState, broadcast::Receiver<RoomState>), StoreError> {
        let doc = self.docs.get(code).ok_or(StoreError::NotFound)?;
        Ok((doc.state.clone(), doc.tx.subscribe()))
    }

    /// Overwrite the fields named by `patch` and fan the new snapshot out to
    /// all subscribers. Returns the snapshot that was broadcast.
    pub fn update(&self, code: &str, patch: &RoomPatch) -> Result<RoomState, StoreError> {
        let mut doc = self.docs.get_mut(code).ok_or(StoreError::NotFound)?;
        patch.apply_to(&mut doc.state);
        let snapshot = doc.state.clone();
        // no receivers is fine; the next subscriber reads the doc directly
        let _ = doc.tx.send(snapshot.clone());
        Ok(snapshot)
    }

    pub fn list(&self) -> Vec<RoomSummary> {
        self.docs
            .iter()
            .map(|entry| RoomSummary {
                code: entry.key().clone(),
                players: entry.state.players.len(),
                is_paused: entry.state.is_paused,
            })
            .collect()
    }

    /// Drop abandoned rooms. Subscribed sockets observe the closed channel
    /// and hang up.
    pub fn prune_old(&self, max_age: Duration) {
        let now = OffsetDateTime::now_utc();
        self.docs.retain(|_, doc| now - doc.created_at < max_age);
    }
}
