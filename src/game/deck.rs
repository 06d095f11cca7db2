//! Deck generation: 13 ranks x 4 suits, each rank bound to a rule action.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 52;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Rule action bound to this rank. Six is always the mate card.
    pub fn action(self) -> CardAction {
        match self {
            Rank::Ace => CardAction::Waterfall,
            Rank::Two => CardAction::You,
            Rank::Three => CardAction::Me,
            Rank::Four => CardAction::Floor,
            Rank::Five => CardAction::Guys,
            Rank::Six => CardAction::Mate,
            Rank::Seven => CardAction::ThumbMaster,
            Rank::Eight => CardAction::Ladies,
            Rank::Nine => CardAction::Rhyme,
            Rank::Ten => CardAction::Categories,
            Rank::Jack => CardAction::NeverHaveIEver,
            Rank::Queen => CardAction::QuestionMaster,
            Rank::King => CardAction::NewRule,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardAction {
    Waterfall,
    You,
    Me,
    Floor,
    Guys,
    Mate,
    ThumbMaster,
    Ladies,
    Rhyme,
    Categories,
    NeverHaveIEver,
    QuestionMaster,
    NewRule,
}

impl CardAction {
    pub fn label(self) -> &'static str {
        match self {
            CardAction::Waterfall => "Waterfall",
            CardAction::You => "You",
            CardAction::Me => "Me",
            CardAction::Floor => "Floor",
            CardAction::Guys => "Guys",
            CardAction::Mate => "Mate",
            CardAction::ThumbMaster => "Thumb",
            CardAction::Ladies => "Ladies",
            CardAction::Rhyme => "Rhyme",
            CardAction::Categories => "Categories",
            CardAction::NeverHaveIEver => "Never Have I Ever",
            CardAction::QuestionMaster => "Question Master",
            CardAction::NewRule => "New Rule",
        }
    }

    pub fn flavor(self) -> &'static str {
        match self {
            CardAction::Waterfall => "Everyone drinks in turn order. Nobody stops before the player ahead of them.",
            CardAction::You => "Pick someone. They drink.",
            CardAction::Me => "Bad luck. You drink.",
            CardAction::Floor => "Last hand to touch the floor drinks.",
            CardAction::Guys => "All the guys drink.",
            CardAction::Mate => "Choose a mate. While the link holds, your drinks are their drinks.",
            CardAction::ThumbMaster => "You are the Thumb Master. Thumb on the table, last to copy drinks.",
            CardAction::Ladies => "All the ladies drink.",
            CardAction::Rhyme => "Say a word. Around the circle everyone rhymes it. First to stall drinks.",
            CardAction::Categories => "Name a category. Around the circle everyone adds to it. First to stall drinks.",
            CardAction::NeverHaveIEver => "Never have I ever. Three fingers up, first one down drinks.",
            CardAction::QuestionMaster => "You are the Question Master. Anyone who answers your questions drinks.",
            CardAction::NewRule => "Make a rule. It stands until the next king replaces it.",
        }
    }
}

/// One card of the round. Immutable once created except for the `drawn_by`
/// stamp set at draw time and the description swap on referee draws.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub action: CardAction,
    pub description: String,
    pub drawn_by: Option<String>,
}

/// Build a freshly shuffled 52-card deck. Unbiased Fisher-Yates via
/// `SliceRandom::shuffle`.
pub fn fresh_deck(rng: &mut impl Rng) -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            let action = rank.action();
            deck.push(Card {
                rank,
                suit,
                action,
                description: action.flavor().to_string(),
                drawn_by: None,
            });
        }
    }
    deck.shuffle(rng);
    deck
}

// Nomination prompts shown when the referee draws a "drawer drinks" rank.
// Referees never drink; they hand the forfeit to someone else.
const PROMPTS_TWO: [&str; 3] = [
    "Referee's call: pick two players, they both drink.",
    "Referee's call: the quietest player drinks.",
    "Referee's call: whoever last checked their phone drinks.",
];
const PROMPTS_THREE: [&str; 3] = [
    "Referee's call: nominate a stand-in to drink for you.",
    "Referee's call: the player to your left drinks.",
    "Referee's call: the last player who laughed drinks.",
];
const PROMPTS_FIVE: [&str; 3] = [
    "Referee's call: every player who is standing drinks.",
    "Referee's call: the tallest player drinks.",
    "Referee's call: everyone who has drawn a card this round drinks.",
];
const PROMPTS_EIGHT: [&str; 3] = [
    "Referee's call: the player with the most penalties drinks.",
    "Referee's call: anyone without a mate drinks.",
    "Referee's call: the newest player in the room drinks.",
];

/// Replacement description for referee draws, or `None` when the rank keeps
/// its normal text.
pub fn referee_prompt(rank: Rank, rng: &mut impl Rng) -> Option<&'static str> {
    let table: &[&'static str] = match rank {
        Rank::Two => &PROMPTS_TWO,
        Rank::Three => &PROMPTS_THREE,
        Rank::Five => &PROMPTS_FIVE,
        Rank::Eight => &PROMPTS_EIGHT,
        _ => return None,
    };
    table.choose(rng).copied()
}
