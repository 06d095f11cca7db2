//! Kings Cup game core: deck generation, the shared room document, and the
//! pure turn engine that turns player actions into field overwrites.

pub mod deck;
pub mod engine;
pub mod state;
