//! The shared room document and the partial-overwrite patch applied to it.
//!
//! `RoomState` is the single mutable record every client of a room sees.
//! The store fans out the full document on every write; actions never send
//! diffs to clients, only full snapshots.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::deck::{self, Card};

/// Root shared document, one per room code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomState {
    /// Ordered join sequence. Names are free-text join tokens, not ids;
    /// uniqueness is not enforced.
    pub players: Vec<String>,
    /// At most one referee, who also sits in `players`.
    pub referee: Option<String>,
    /// Index into `players` of whoever acts next. 0 when the room is empty.
    pub current_turn: usize,
    /// Remaining cards, drawn from the head.
    pub deck: Vec<Card>,
    /// The face-up card, `None` between turns.
    pub current_card: Option<Card>,
    pub thumb_master: Option<String>,
    pub question_master: Option<String>,
    /// Standing house rule, persists across turns until replaced.
    pub current_rule: Option<String>,
    /// Drinking-buddy links. Symmetric when referee-assigned, one-way when
    /// self-assigned.
    pub mates: HashMap<String, String>,
    /// Violation counts assessed by the referee, settled at game end.
    pub penalties: HashMap<String, u32>,
    pub is_paused: bool,
    pub pause_reason: Option<String>,
    /// Transient banner, cleared by a scheduled follow-up write.
    pub penalty_announcement: Option<String>,
}

impl RoomState {
    /// Fresh room: shuffled deck, empty seats, everything else cleared.
    pub fn fresh(rng: &mut impl Rng) -> Self {
        Self {
            deck: deck::fresh_deck(rng),
            ..Self::default()
        }
    }
}

/// The set of fields one action overwrites. Every `Some` is a plain
/// last-writer-wins overwrite of that field; there is no compare-and-set.
/// Nullable fields are double-`Option` so a patch can clear them.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub players: Option<Vec<String>>,
    pub referee: Option<Option<String>>,
    pub current_turn: Option<usize>,
    pub deck: Option<Vec<Card>>,
    pub current_card: Option<Option<Card>>,
    pub thumb_master: Option<Option<String>>,
    pub question_master: Option<Option<String>>,
    pub current_rule: Option<Option<String>>,
    pub mates: Option<HashMap<String, String>>,
    pub penalties: Option<HashMap<String, u32>>,
    pub is_paused: Option<bool>,
    pub pause_reason: Option<Option<String>>,
    pub penalty_announcement: Option<Option<String>>,
}

impl RoomPatch {
    pub fn is_empty(&self) -> bool {
        self.players.is_none()
            && self.referee.is_none()
            && self.current_turn.is_none()
            && self.deck.is_none()
            && self.current_card.is_none()
            && self.thumb_master.is_none()
            && self.question_master.is_none()
            && self.current_rule.is_none()
            && self.mates.is_none()
            && self.penalties.is_none()
            && self.is_paused.is_none()
            && self.pause_reason.is_none()
            && self.penalty_announcement.is_none()
    }

    /// Overwrite the named fields on `state`, leaving the rest untouched.
    pub fn apply_to(&self, state: &mut RoomState) {
        if let Some(v) = &self.players {
            state.players = v.clone();
        }
        if let Some(v) = &self.referee {
            state.referee = v.clone();
        }
        if let Some(v) = self.current_turn {
            state.current_turn = v;
        }
        if let Some(v) = &self.deck {
            state.deck = v.clone();
        }
        if let Some(v) = &self.current_card {
            state.current_card = v.clone();
        }
        if let Some(v) = &self.thumb_master {
            state.thumb_master = v.clone();
        }
        if let Some(v) = &self.question_master {
            state.question_master = v.clone();
        }
        if let Some(v) = &self.current_rule {
            state.current_rule = v.clone();
        }
        if let Some(v) = &self.mates {
            state.mates = v.clone();
        }
        if let Some(v) = &self.penalties {
            state.penalties = v.clone();
        }
        if let Some(v) = self.is_paused {
            state.is_paused = v;
        }
        if let Some(v) = &self.pause_reason {
            state.pause_reason = v.clone();
        }
        if let Some(v) = &self.penalty_announcement {
            state.penalty_announcement = v.clone();
        }
    }
}
