//! Core data model: sides, cards, game state, actions and deterministic RNG.
//!
//! Everything here is plain data with no game rules attached. Simulators
//! (see [`crate::rules`]) give these types meaning; the learner only reads
//! them through the encoder and the action space.

pub mod action;
pub mod card;
pub mod rng;
pub mod side;
pub mod state;

pub use action::{
    Action, ActionKind, RawAction, ACTION_SPACE_SIZE, ATTACK_FACE_BASE, ATTACK_MINION_BASE,
    END_TURN_INDEX,
};
pub use card::{Card, CardId, CardKind, Deck, Minion, SpellEffect};
pub use rng::{GameRng, GameRngState};
pub use side::{Side, SideMap};
pub use state::{
    Board, GameState, Hand, PlayerState, DECK_SIZE, MAX_BOARD_SIZE, MAX_HAND_SIZE, MAX_HEALTH,
    MAX_MANA,
};
