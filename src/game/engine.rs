//! The turn engine: pure reducers from (snapshot, identity, action) to the
//! set of fields to overwrite.
//!
//! Every operation reads the last-observed snapshot and returns a
//! `RoomPatch`; nothing here touches the store or the socket. Writes are
//! optimistic: a stale snapshot can lose a race against another client, and
//! last writer wins per field set. That trade-off is accepted for a party
//! game without a rules authority.

use rand::Rng;

use crate::error::GameError;
use crate::game::deck::{self, CardAction};
use crate::game::state::{RoomPatch, RoomState};
use crate::session::{Identity, Role};

/// A requested state transition, decoupled from whatever dialog or prompt
/// collected its payload.
#[derive(Debug, Clone)]
pub enum Action {
    /// Take a seat (players and referees) or just watch (observers).
    Join,
    Draw,
    /// Standing-rule text entered after drawing a New Rule card.
    SetRule { text: String },
    EndTurn,
    /// Self-assigned mate link, one direction: actor -> target.
    ChooseMate { target: String },
    /// Referee-assigned symmetric pair.
    ConfirmMatePair { first: String, second: String },
    MarkViolation { target: String, reason: String },
    Pause { reason: String },
    Resume,
    RemovePlayer { target: String },
    Leave,
    /// Referee empties the room on the way out.
    CloseRoom,
    ResetRound,
}

/// How the actor picks mates after drawing the mate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MateMode {
    Single,
    Pair,
}

/// Follow-ups the bridge performs after the patch is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Tell the actor to pick mate(s) before the turn can advance.
    MateSelection { mode: MateMode },
    /// A banner was set and should be cleared after the announcement delay.
    AnnouncementPosted { text: String },
}

#[derive(Debug)]
pub struct Outcome {
    pub patch: RoomPatch,
    pub effect: Option<Effect>,
}

impl Outcome {
    fn patch(patch: RoomPatch) -> Self {
        Self { patch, effect: None }
    }
}

/// Compute the fields `action` overwrites, or the precondition it violates.
pub fn apply(
    state: &RoomState,
    who: &Identity,
    action: Action,
    rng: &mut impl Rng,
) -> Result<Outcome, GameError> {
    if who.role == Role::Observer && !matches!(action, Action::Join) {
        return Err(GameError::ObserverCannotAct);
    }
    match action {
        Action::Join => join(state, who),
        Action::Draw => draw(state, who, rng),
        Action::SetRule { text } => set_rule(state, who, text),
        Action::EndTurn => end_turn(state, who),
        Action::ChooseMate { target } => choose_mate(state, who, target),
        Action::ConfirmMatePair { first, second } => confirm_mate_pair(state, who, first, second),
        Action::MarkViolation { target, reason } => mark_violation(state, who, target, reason),
        Action::Pause { reason } => pause(state, who, reason),
        Action::Resume => resume(state, who),
        Action::RemovePlayer { target } => remove_player(state, who, target),
        Action::Leave => leave(state, who),
        Action::CloseRoom => close_room(state, who),
        Action::ResetRound => reset_round(state, who, rng),
    }
}

/// Patch that clears the penalty banner, if it still shows `text`. Used by
/// the scheduled follow-up write; a newer banner wins the race and stays.
pub fn clear_announcement(state: &RoomState, text: &str) -> Option<RoomPatch> {
    if state.penalty_announcement.as_deref() == Some(text) {
        Some(RoomPatch {
            penalty_announcement: Some(None),
            ..Default::default()
        })
    } else {
        None
    }
}

fn is_current(state: &RoomState, name: &str) -> bool {
    state.players.get(state.current_turn).map(String::as_str) == Some(name)
}

fn next_turn(state: &RoomState) -> usize {
    (state.current_turn + 1) % state.players.len()
}

fn require_referee(who: &Identity, state: &RoomState) -> Result<(), GameError> {
    if who.role != Role::Referee || state.referee.as_deref() != Some(who.name.as_str()) {
        return Err(GameError::RefereeOnly);
    }
    Ok(())
}

fn join(state: &RoomState, who: &Identity) -> Result<Outcome, GameError> {
    match who.role {
        // Observers watch; they never enter the turn order.
        Role::Observer => Ok(Outcome::patch(RoomPatch::default())),
        Role::Player => {
            let mut players = state.players.clone();
            players.push(who.name.clone());
            Ok(Outcome::patch(RoomPatch {
                players: Some(players),
                ..Default::default()
            }))
        }
        Role::Referee => {
            // The slot is claimable only when free or already held by the
            // same name. Checked against the last snapshot, not atomically.
            match state.referee.as_deref() {
                Some(existing) if existing != who.name => Err(GameError::RefereeTaken),
                Some(_) => Ok(Outcome::patch(RoomPatch::default())),
                None => {
                    let mut players = state.players.clone();
                    players.push(who.name.clone());
                    Ok(Outcome::patch(RoomPatch {
                        players: Some(players),
                        referee: Some(Some(who.name.clone())),
                        ..Default::default()
                    }))
                }
            }
        }
    }
}

fn draw(state: &RoomState, who: &Identity, rng: &mut impl Rng) -> Result<Outcome, GameError> {
    if state.is_paused {
        return Err(GameError::Paused);
    }
    if !is_current(state, &who.name) {
        return Err(GameError::NotYourTurn);
    }
    let Some(top) = state.deck.first() else {
        return Err(GameError::DeckEmpty);
    };

    let mut card = top.clone();
    card.drawn_by = Some(who.name.clone());
    if who.role == Role::Referee {
        if let Some(prompt) = deck::referee_prompt(card.rank, rng) {
            card.description = prompt.to_string();
        }
    }
    tracing::debug!(card = card.action.label(), by = %who.name, "card drawn");

    let mut patch = RoomPatch {
        deck: Some(state.deck[1..].to_vec()),
        current_card: Some(Some(card.clone())),
        ..Default::default()
    };

    let effect = match card.action {
        CardAction::Mate => {
            let mode = if who.role == Role::Referee {
                MateMode::Pair
            } else {
                MateMode::Single
            };
            Some(Effect::MateSelection { mode })
        }
        CardAction::ThumbMaster => {
            patch.thumb_master = Some(Some(who.name.clone()));
            None
        }
        CardAction::QuestionMaster => {
            patch.question_master = Some(Some(who.name.clone()));
            None
        }
        // New Rule: the client follows up with SetRule once text is entered.
        _ => None,
    };

    Ok(Outcome { patch, effect })
}

fn set_rule(state: &RoomState, who: &Identity, text: String) -> Result<Outcome, GameError> {
    if state.is_paused {
        return Err(GameError::Paused);
    }
    let face_up = state.current_card.as_ref().is_some_and(|c| {
        c.action == CardAction::NewRule && c.drawn_by.as_deref() == Some(who.name.as_str())
    });
    if !face_up {
        return Err(GameError::NoRuleCard);
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(GameError::EmptyRule);
    }
    Ok(Outcome::patch(RoomPatch {
        current_rule: Some(Some(text.to_string())),
        ..Default::default()
    }))
}

fn end_turn(state: &RoomState, who: &Identity) -> Result<Outcome, GameError> {
    if state.is_paused {
        return Err(GameError::Paused);
    }
    if !is_current(state, &who.name) {
        return Err(GameError::NotYourTurn);
    }
    Ok(Outcome::patch(RoomPatch {
        current_card: Some(None),
        current_turn: Some(next_turn(state)),
        penalty_announcement: Some(None),
        ..Default::default()
    }))
}

fn mate_card_face_up(state: &RoomState, name: &str) -> bool {
    state
        .current_card
        .as_ref()
        .is_some_and(|c| c.action == CardAction::Mate && c.drawn_by.as_deref() == Some(name))
}

fn choose_mate(state: &RoomState, who: &Identity, target: String) -> Result<Outcome, GameError> {
    if state.is_paused {
        return Err(GameError::Paused);
    }
    if !mate_card_face_up(state, &who.name) {
        return Err(GameError::NoMateCard);
    }
    if target == who.name {
        return Err(GameError::MateIsSelf);
    }
    if !state.players.contains(&target) {
        return Err(GameError::UnknownPlayer(target));
    }
    let mut mates = state.mates.clone();
    mates.insert(who.name.clone(), target);
    Ok(Outcome::patch(RoomPatch {
        mates: Some(mates),
        current_card: Some(None),
        current_turn: Some(next_turn(state)),
        ..Default::default()
    }))
}

fn confirm_mate_pair(
    state: &RoomState,
    who: &Identity,
    first: String,
    second: String,
) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    if state.is_paused {
        return Err(GameError::Paused);
    }
    if !mate_card_face_up(state, &who.name) {
        return Err(GameError::NoMateCard);
    }
    if first == second {
        return Err(GameError::InvalidMatePair("pick two different players".into()));
    }
    // The referee links two OTHER players; referees have no mates.
    if first == who.name || second == who.name {
        return Err(GameError::InvalidMatePair("the referee cannot be a mate".into()));
    }
    for name in [&first, &second] {
        if !state.players.contains(name) {
            return Err(GameError::UnknownPlayer(name.clone()));
        }
    }
    let mut mates = state.mates.clone();
    mates.insert(first.clone(), second.clone());
    mates.insert(second, first);
    Ok(Outcome::patch(RoomPatch {
        mates: Some(mates),
        current_card: Some(None),
        current_turn: Some(next_turn(state)),
        ..Default::default()
    }))
}

fn mark_violation(
    state: &RoomState,
    who: &Identity,
    target: String,
    reason: String,
) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    if !state.players.contains(&target) {
        return Err(GameError::UnknownPlayer(target));
    }
    let mut penalties = state.penalties.clone();
    *penalties.entry(target.clone()).or_insert(0) += 1;

    let reason = reason.trim();
    let text = if reason.is_empty() {
        format!("{} received a penalty from {}", target, who.name)
    } else {
        format!("{} received a penalty from {}: {}", target, who.name, reason)
    };
    Ok(Outcome {
        patch: RoomPatch {
            penalties: Some(penalties),
            penalty_announcement: Some(Some(text.clone())),
            ..Default::default()
        },
        effect: Some(Effect::AnnouncementPosted { text }),
    })
}

fn pause(state: &RoomState, who: &Identity, reason: String) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    Ok(Outcome::patch(RoomPatch {
        is_paused: Some(true),
        pause_reason: Some(Some(reason)),
        ..Default::default()
    }))
}

fn resume(state: &RoomState, who: &Identity) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    Ok(Outcome::patch(RoomPatch {
        is_paused: Some(false),
        pause_reason: Some(None),
        ..Default::default()
    }))
}

/// Drop the player at `index` and recompute the turn pointer so it stays a
/// valid index. Stale references in mates/penalties/masters are left alone;
/// penalty counts double as the record settled at game end.
fn removal_patch(state: &RoomState, index: usize) -> RoomPatch {
    let mut players = state.players.clone();
    let removed = players.remove(index);

    let current_turn = if players.is_empty() {
        0
    } else if index < state.current_turn {
        state.current_turn - 1
    } else if index == state.current_turn {
        state.current_turn % players.len()
    } else {
        state.current_turn
    };

    let referee = if state.referee.as_deref() == Some(removed.as_str()) {
        Some(None)
    } else {
        None
    };

    RoomPatch {
        players: Some(players),
        current_turn: Some(current_turn),
        referee,
        ..Default::default()
    }
}

fn remove_player(state: &RoomState, who: &Identity, target: String) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    let Some(index) = state.players.iter().position(|p| *p == target) else {
        return Err(GameError::UnknownPlayer(target));
    };
    Ok(Outcome::patch(removal_patch(state, index)))
}

fn leave(state: &RoomState, who: &Identity) -> Result<Outcome, GameError> {
    let Some(index) = state.players.iter().position(|p| *p == who.name) else {
        return Err(GameError::NotInRoom);
    };
    Ok(Outcome::patch(removal_patch(state, index)))
}

fn close_room(state: &RoomState, who: &Identity) -> Result<Outcome, GameError> {
    require_referee(who, state)?;
    Ok(Outcome::patch(RoomPatch {
        players: Some(Vec::new()),
        referee: Some(None),
        current_turn: Some(0),
        ..Default::default()
    }))
}

fn reset_round(state: &RoomState, who: &Identity, rng: &mut impl Rng) -> Result<Outcome, GameError> {
    // The seated referee can reset at will; anyone else only once the
    // round is over (deck exhausted).
    if require_referee(who, state).is_err() {
        if !state.players.contains(&who.name) {
            return Err(GameError::NotInRoom);
        }
        if !state.deck.is_empty() {
            return Err(GameError::RoundNotOver);
        }
    }
    Ok(Outcome::patch(RoomPatch {
        deck: Some(deck::fresh_deck(rng)),
        current_card: Some(None),
        current_turn: Some(0),
        thumb_master: Some(None),
        question_master: Some(None),
        current_rule: Some(None),
        mates: Some(Default::default()),
        penalties: Some(Default::default()),
        is_paused: Some(false),
        pause_reason: Some(None),
        penalty_announcement: Some(None),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::{Rank, DECK_SIZE};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn player(name: &str) -> Identity {
        Identity {
            name: name.to_string(),
            role: Role::Player,
        }
    }

    fn referee(name: &str) -> Identity {
        Identity {
            name: name.to_string(),
            role: Role::Referee,
        }
    }

    /// Room with the given players seated, fresh deck, turn at 0.
    fn room(players: &[&str]) -> RoomState {
        let mut state = RoomState::fresh(&mut rng());
        state.players = players.iter().map(|p| p.to_string()).collect();
        state
    }

    fn room_with_referee(players: &[&str], referee: &str) -> RoomState {
        let mut state = room(players);
        state.referee = Some(referee.to_string());
        state
    }

    /// Force a specific rank to the top of the deck.
    fn stack_top(state: &mut RoomState, rank: Rank) {
        let pos = state.deck.iter().position(|c| c.rank == rank).unwrap();
        let card = state.deck.remove(pos);
        state.deck.insert(0, card);
    }

    fn apply_ok(state: &mut RoomState, who: &Identity, action: Action) -> Outcome {
        let outcome = apply(state, who, action, &mut rng()).unwrap();
        outcome.patch.apply_to(state);
        outcome
    }

    #[test]
    fn two_player_draw_and_end_turn_scenario() {
        let mut state = room(&["A", "B"]);

        // A draws: stamped, deck shrinks by one.
        apply_ok(&mut state, &player("A"), Action::Draw);
        assert_eq!(
            state.current_card.as_ref().unwrap().drawn_by.as_deref(),
            Some("A")
        );
        assert_eq!(state.deck.len(), 51);

        // A ends the turn.
        apply_ok(&mut state, &player("A"), Action::EndTurn);
        assert_eq!(state.current_turn, 1);
        assert!(state.current_card.is_none());

        // B draws a New Rule card and enters text.
        stack_top(&mut state, Rank::King);
        apply_ok(&mut state, &player("B"), Action::Draw);
        assert_eq!(state.deck.len(), 50);
        apply_ok(
            &mut state,
            &player("B"),
            Action::SetRule {
                text: "rule text".into(),
            },
        );
        assert_eq!(state.current_rule.as_deref(), Some("rule text"));
    }

    #[test]
    fn draw_out_of_turn_is_rejected_without_mutation() {
        let state = room(&["A", "B"]);
        let err = apply(&state, &player("B"), Action::Draw, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
    }

    #[test]
    fn draw_on_empty_deck_is_rejected() {
        let mut state = room(&["A", "B"]);
        state.deck.clear();
        let err = apply(&state, &player("A"), Action::Draw, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::DeckEmpty);
    }

    #[test]
    fn draw_and_end_turn_are_rejected_while_paused() {
        let mut state = room_with_referee(&["R", "A"], "R");
        state.is_paused = true;
        assert_eq!(
            apply(&state, &player("R"), Action::Draw, &mut rng()).unwrap_err(),
            GameError::Paused
        );
        assert_eq!(
            apply(&state, &player("R"), Action::EndTurn, &mut rng()).unwrap_err(),
            GameError::Paused
        );
    }

    #[test]
    fn end_turn_by_non_current_player_is_rejected() {
        let state = room(&["A", "B", "C"]);
        let err = apply(&state, &player("C"), Action::EndTurn, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::NotYourTurn);
    }

    #[test]
    fn end_turn_wraps_and_clears_announcement() {
        let mut state = room(&["A", "B"]);
        state.current_turn = 1;
        state.penalty_announcement = Some("B received a penalty".into());
        apply_ok(&mut state, &player("B"), Action::EndTurn);
        assert_eq!(state.current_turn, 0);
        assert!(state.penalty_announcement.is_none());
    }

    #[test]
    fn turn_pointer_stays_valid_after_every_advance() {
        let mut state = room(&["A", "B", "C"]);
        for _ in 0..7 {
            let name = state.players[state.current_turn].clone();
            apply_ok(&mut state, &player(&name), Action::EndTurn);
            assert!(state.current_turn < state.players.len());
        }
    }

    #[test]
    fn thumb_and_question_master_reassign_on_draw() {
        let mut state = room(&["A", "B"]);
        state.thumb_master = Some("B".into());
        stack_top(&mut state, Rank::Seven);
        apply_ok(&mut state, &player("A"), Action::Draw);
        assert_eq!(state.thumb_master.as_deref(), Some("A"));

        apply_ok(&mut state, &player("A"), Action::EndTurn);
        stack_top(&mut state, Rank::Queen);
        apply_ok(&mut state, &player("B"), Action::Draw);
        assert_eq!(state.question_master.as_deref(), Some("B"));
    }

    #[test]
    fn mate_draw_enters_single_selection_for_players() {
        let mut state = room(&["A", "B"]);
        stack_top(&mut state, Rank::Six);
        let outcome = apply_ok(&mut state, &player("A"), Action::Draw);
        assert_eq!(
            outcome.effect,
            Some(Effect::MateSelection {
                mode: MateMode::Single
            })
        );

        apply_ok(
            &mut state,
            &player("A"),
            Action::ChooseMate { target: "B".into() },
        );
        assert_eq!(state.mates.get("A").map(String::as_str), Some("B"));
        // one-way link
        assert!(!state.mates.contains_key("B"));
        assert!(state.current_card.is_none());
        assert_eq!(state.current_turn, 1);
    }

    #[test]
    fn referee_mate_draw_links_a_symmetric_pair() {
        let mut state = room_with_referee(&["R", "P1", "P2"], "R");
        stack_top(&mut state, Rank::Six);
        let outcome = apply_ok(&mut state, &referee("R"), Action::Draw);
        assert_eq!(
            outcome.effect,
            Some(Effect::MateSelection {
                mode: MateMode::Pair
            })
        );

        apply_ok(
            &mut state,
            &referee("R"),
            Action::ConfirmMatePair {
                first: "P1".into(),
                second: "P2".into(),
            },
        );
        assert_eq!(state.mates.get("P1").map(String::as_str), Some("P2"));
        assert_eq!(state.mates.get("P2").map(String::as_str), Some("P1"));
        assert_eq!(state.current_turn, 1);
        assert!(state.current_card.is_none());
    }

    #[test]
    fn degenerate_mate_pair_never_writes() {
        let mut state = room_with_referee(&["R", "P1", "P2"], "R");
        stack_top(&mut state, Rank::Six);
        apply_ok(&mut state, &referee("R"), Action::Draw);

        for (first, second) in [("P1", "P1"), ("R", "P1"), ("P1", "Ghost")] {
            let err = apply(
                &state,
                &referee("R"),
                Action::ConfirmMatePair {
                    first: first.into(),
                    second: second.into(),
                },
                &mut rng(),
            )
            .unwrap_err();
            assert!(matches!(
                err,
                GameError::InvalidMatePair(_) | GameError::UnknownPlayer(_)
            ));
        }
        assert!(state.mates.is_empty());
    }

    #[test]
    fn choose_mate_requires_a_face_up_mate_card() {
        let state = room(&["A", "B"]);
        let err = apply(
            &state,
            &player("A"),
            Action::ChooseMate { target: "B".into() },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, GameError::NoMateCard);
    }

    #[test]
    fn referee_draw_of_drinking_rank_swaps_description() {
        let mut state = room_with_referee(&["R", "A"], "R");
        stack_top(&mut state, Rank::Three);
        apply_ok(&mut state, &referee("R"), Action::Draw);
        let card = state.current_card.as_ref().unwrap();
        assert_ne!(card.description, CardAction::Me.flavor());
        assert!(card.description.starts_with("Referee's call"));
    }

    #[test]
    fn player_draw_keeps_canonical_description() {
        let mut state = room(&["A", "B"]);
        stack_top(&mut state, Rank::Three);
        apply_ok(&mut state, &player("A"), Action::Draw);
        assert_eq!(
            state.current_card.as_ref().unwrap().description,
            CardAction::Me.flavor()
        );
    }

    #[test]
    fn set_rule_rejects_blank_text_and_wrong_card() {
        let mut state = room(&["A", "B"]);
        stack_top(&mut state, Rank::King);
        apply_ok(&mut state, &player("A"), Action::Draw);

        let err = apply(
            &state,
            &player("A"),
            Action::SetRule { text: "   ".into() },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, GameError::EmptyRule);

        // B never drew the card
        let err = apply(
            &state,
            &player("B"),
            Action::SetRule { text: "x".into() },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, GameError::NoRuleCard);
    }

    #[test]
    fn join_appends_players_and_claims_referee_slot() {
        let state = room(&["A"]);
        let outcome = apply(&state, &player("B"), Action::Join, &mut rng()).unwrap();
        assert_eq!(
            outcome.patch.players,
            Some(vec!["A".to_string(), "B".to_string()])
        );

        let outcome = apply(&state, &referee("R"), Action::Join, &mut rng()).unwrap();
        assert_eq!(outcome.patch.referee, Some(Some("R".to_string())));
    }

    #[test]
    fn second_referee_is_rejected_without_mutation() {
        let state = room_with_referee(&["R", "A"], "R");
        let err = apply(&state, &referee("S"), Action::Join, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::RefereeTaken);

        // Same name re-joining the slot is fine and writes nothing.
        let outcome = apply(&state, &referee("R"), Action::Join, &mut rng()).unwrap();
        assert!(outcome.patch.is_empty());
    }

    #[test]
    fn observer_join_is_a_no_op_and_observers_cannot_act() {
        let state = room(&["A"]);
        let obs = Identity {
            name: "O".into(),
            role: Role::Observer,
        };
        let outcome = apply(&state, &obs, Action::Join, &mut rng()).unwrap();
        assert!(outcome.patch.is_empty());
        let err = apply(&state, &obs, Action::Draw, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::ObserverCannotAct);
    }

    #[test]
    fn mark_violation_is_referee_only_and_increments() {
        let mut state = room_with_referee(&["R", "A"], "R");
        let err = apply(
            &state,
            &player("A"),
            Action::MarkViolation {
                target: "R".into(),
                reason: "spilled".into(),
            },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, GameError::RefereeOnly);

        let outcome = apply_ok(
            &mut state,
            &referee("R"),
            Action::MarkViolation {
                target: "A".into(),
                reason: "skipped a drink".into(),
            },
        );
        assert_eq!(state.penalties.get("A"), Some(&1));
        let banner = state.penalty_announcement.clone().unwrap();
        assert!(banner.contains("A") && banner.contains("skipped a drink"));
        assert_eq!(
            outcome.effect,
            Some(Effect::AnnouncementPosted { text: banner })
        );

        apply_ok(
            &mut state,
            &referee("R"),
            Action::MarkViolation {
                target: "A".into(),
                reason: String::new(),
            },
        );
        assert_eq!(state.penalties.get("A"), Some(&2));
    }

    #[test]
    fn clear_announcement_only_when_text_still_matches() {
        let mut state = room(&["A"]);
        state.penalty_announcement = Some("old banner".into());
        assert!(clear_announcement(&state, "different banner").is_none());
        let patch = clear_announcement(&state, "old banner").unwrap();
        patch.apply_to(&mut state);
        assert!(state.penalty_announcement.is_none());
    }

    #[test]
    fn pause_and_resume_are_referee_gated() {
        let mut state = room_with_referee(&["R", "A"], "R");
        let err = apply(
            &state,
            &player("A"),
            Action::Pause {
                reason: "break".into(),
            },
            &mut rng(),
        )
        .unwrap_err();
        assert_eq!(err, GameError::RefereeOnly);

        apply_ok(
            &mut state,
            &referee("R"),
            Action::Pause {
                reason: "pizza break".into(),
            },
        );
        assert!(state.is_paused);
        assert_eq!(state.pause_reason.as_deref(), Some("pizza break"));

        // Admin actions still work while paused.
        apply_ok(
            &mut state,
            &referee("R"),
            Action::MarkViolation {
                target: "A".into(),
                reason: String::new(),
            },
        );

        apply_ok(&mut state, &referee("R"), Action::Resume);
        assert!(!state.is_paused);
        assert!(state.pause_reason.is_none());
    }

    #[test]
    fn a_claimed_referee_role_without_the_slot_has_no_powers() {
        // Client-side role claims are trusted for identity, not for the
        // slot: the snapshot's referee field is what grants admin rights.
        let state = room_with_referee(&["R", "A"], "R");
        let err = apply(&state, &referee("A"), Action::Resume, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::RefereeOnly);
    }

    #[test]
    fn removing_earlier_player_decrements_turn_pointer() {
        let mut state = room_with_referee(&["R", "A", "B"], "R");
        state.current_turn = 2;
        apply_ok(
            &mut state,
            &referee("R"),
            Action::RemovePlayer { target: "A".into() },
        );
        assert_eq!(state.players, vec!["R".to_string(), "B".to_string()]);
        assert_eq!(state.current_turn, 1);
    }

    #[test]
    fn removing_the_current_player_wraps_modulo_new_length() {
        // players=["R","A","B"], current_turn=1, remove "A":
        // 1 mod 2 = 1, now pointing at what was index 2.
        let mut state = room_with_referee(&["R", "A", "B"], "R");
        state.current_turn = 1;
        apply_ok(
            &mut state,
            &referee("R"),
            Action::RemovePlayer { target: "A".into() },
        );
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.players[state.current_turn], "B");
    }

    #[test]
    fn removal_keeps_stale_mate_and_penalty_entries() {
        let mut state = room_with_referee(&["R", "A", "B"], "R");
        state.mates.insert("A".into(), "B".into());
        state.penalties.insert("A".into(), 3);
        state.thumb_master = Some("A".into());
        apply_ok(
            &mut state,
            &referee("R"),
            Action::RemovePlayer { target: "A".into() },
        );
        // Historical record survives the player.
        assert_eq!(state.mates.get("A").map(String::as_str), Some("B"));
        assert_eq!(state.penalties.get("A"), Some(&3));
        assert_eq!(state.thumb_master.as_deref(), Some("A"));
    }

    #[test]
    fn leaving_referee_clears_the_slot() {
        let mut state = room_with_referee(&["R", "A"], "R");
        apply_ok(&mut state, &referee("R"), Action::Leave);
        assert_eq!(state.players, vec!["A".to_string()]);
        assert!(state.referee.is_none());
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn leave_by_unknown_name_is_rejected() {
        let state = room(&["A"]);
        let err = apply(&state, &player("Ghost"), Action::Leave, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::NotInRoom);
    }

    #[test]
    fn last_player_leaving_resets_turn_pointer() {
        let mut state = room(&["A"]);
        state.current_turn = 0;
        apply_ok(&mut state, &player("A"), Action::Leave);
        assert!(state.players.is_empty());
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn close_room_empties_the_player_list() {
        let mut state = room_with_referee(&["R", "A", "B"], "R");
        apply_ok(&mut state, &referee("R"), Action::CloseRoom);
        assert!(state.players.is_empty());
        assert!(state.referee.is_none());
    }

    #[test]
    fn reset_round_restores_a_full_deck_and_keeps_players() {
        let mut state = room_with_referee(&["R", "A"], "R");
        apply_ok(&mut state, &referee("R"), Action::Draw);
        state.mates.insert("A".into(), "R".into());
        state.penalties.insert("A".into(), 2);
        state.current_rule = Some("rule".into());
        state.thumb_master = Some("A".into());
        state.is_paused = true;

        apply_ok(&mut state, &referee("R"), Action::ResetRound);
        assert_eq!(state.deck.len(), DECK_SIZE);
        assert!(state.current_card.is_none());
        assert_eq!(state.current_turn, 0);
        assert!(state.mates.is_empty());
        assert!(state.penalties.is_empty());
        assert!(state.current_rule.is_none());
        assert!(state.thumb_master.is_none());
        assert!(!state.is_paused);
        assert_eq!(state.players, vec!["R".to_string(), "A".to_string()]);
    }

    #[test]
    fn players_reset_only_after_the_deck_runs_out() {
        let mut state = room(&["A", "B"]);
        let err = apply(&state, &player("A"), Action::ResetRound, &mut rng()).unwrap_err();
        assert_eq!(err, GameError::RoundNotOver);

        state.deck.clear();
        let outcome = apply(&state, &player("A"), Action::ResetRound, &mut rng()).unwrap();
        assert_eq!(outcome.patch.deck.as_ref().map(Vec::len), Some(DECK_SIZE));
    }

    #[test]
    fn live_cards_partition_the_52_card_set() {
        let mut state = room(&["A", "B"]);
        let mut drawn = 0usize;
        for _ in 0..5 {
            let name = state.players[state.current_turn].clone();
            apply_ok(&mut state, &player(&name), Action::Draw);
            drawn += 1;
            // live cards + discarded cards always cover the full set
            let live = state.deck.len() + state.current_card.iter().count();
            assert_eq!(live + (drawn - 1), DECK_SIZE);
            apply_ok(&mut state, &player(&name), Action::EndTurn);
        }
        assert_eq!(state.deck.len(), DECK_SIZE - drawn);
    }

    #[test]
    fn duplicate_draws_from_one_card() {
        // Drawing never invents cards: deck after the draw is exactly the
        // old deck minus its head.
        let mut state = room(&["A"]);
        let head = state.deck[0].clone();
        let rest = state.deck[1..].to_vec();
        apply_ok(&mut state, &player("A"), Action::Draw);
        let mut drawn = state.current_card.clone().unwrap();
        drawn.drawn_by = None;
        drawn.description = head.description.clone();
        assert_eq!(drawn.rank, head.rank);
        assert_eq!(drawn.suit, head.suit);
        assert_eq!(state.deck, rest);
    }
}
