//! Error types for room and store operations.

use thiserror::Error;

/// Precondition violations raised by the turn engine. None of these mutate
/// state; the bridge reports them back to the acting client as a notice.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("the deck is empty")]
    DeckEmpty,

    #[error("the game is paused")]
    Paused,

    #[error("referee already assigned")]
    RefereeTaken,

    #[error("only the referee can do that")]
    RefereeOnly,

    #[error("observers cannot play")]
    ObserverCannotAct,

    #[error("you are not in this room")]
    NotInRoom,

    #[error("no such player: {0}")]
    UnknownPlayer(String),

    #[error("no new-rule card is face up for you")]
    NoRuleCard,

    #[error("rule text is empty")]
    EmptyRule,

    #[error("no mate card is face up for you")]
    NoMateCard,

    #[error("invalid mate pair: {0}")]
    InvalidMatePair(String),

    #[error("you cannot be your own mate")]
    MateIsSelf,

    #[error("the round is not over yet")]
    RoundNotOver,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room not found")]
    NotFound,
}
