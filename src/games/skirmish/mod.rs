//! Skirmish: a compact minion battler for training and testing the learner.
//!
//! - Each side starts at 30 health with a 30-card deck
//! - Turn start: gain a mana crystal (max 10), refill mana, draw a card,
//!   ready every minion on board
//! - Minions need a turn before attacking unless they have charge
//! - Taunt minions must be attacked before anything else
//! - Drawing from an empty deck deals increasing fatigue damage
//! - A side at 0 health or less loses; both at once is a draw

mod decks;
mod game;

pub use decks::Archetype;
pub use game::Skirmish;
