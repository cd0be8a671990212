//! Game state as seen by the learner.
//!
//! ## PlayerState
//!
//! One seat's hero, resources, hand, board and remaining deck.
//!
//! ## GameState
//!
//! Both seats plus whose turn it is and the turn counter. The state is a
//! plain value: simulators produce a new one per action and the trainer keeps
//! the previous one around for reward shaping, so cloning must stay cheap.
//! Decks use `im::Vector` (O(1) clone); hands and boards are bounded and live
//! inline in `SmallVec`s.

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::{Card, Minion};
use super::side::{Side, SideMap};

/// Maximum cards held in hand.
pub const MAX_HAND_SIZE: usize = 10;

/// Maximum minions on one side of the board.
pub const MAX_BOARD_SIZE: usize = 7;

/// Starting (and maximum) hero health.
pub const MAX_HEALTH: i32 = 30;

/// Mana crystal cap.
pub const MAX_MANA: i32 = 10;

/// Nominal deck size, used to normalise remaining-deck ratios.
pub const DECK_SIZE: usize = 30;

pub type Hand = SmallVec<[Card; MAX_HAND_SIZE]>;
pub type Board = SmallVec<[Minion; MAX_BOARD_SIZE]>;

/// One seat's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub health: i32,
    /// Mana available right now.
    pub mana: i32,
    /// Mana crystals (refill target at turn start).
    pub max_mana: i32,
    pub hand: Hand,
    pub board: Board,
    /// Remaining deck; the next draw is the front.
    pub deck: Vector<Card>,
    /// Damage dealt by the next draw from an empty deck.
    pub fatigue: i32,
}

impl PlayerState {
    /// A fresh seat holding `deck`, with nothing drawn yet.
    pub fn new(deck: impl IntoIterator<Item = Card>) -> Self {
        Self {
            health: MAX_HEALTH,
            mana: 0,
            max_mana: 0,
            hand: Hand::new(),
            board: Board::new(),
            deck: deck.into_iter().collect(),
            fatigue: 0,
        }
    }

    /// Σ(attack + current health) over the board.
    #[must_use]
    pub fn board_strength(&self) -> i32 {
        self.board.iter().map(Minion::strength).sum()
    }

    #[must_use]
    pub fn board_has_space(&self) -> bool {
        self.board.len() < MAX_BOARD_SIZE
    }

    /// Does this seat control a minion that must be attacked first?
    #[must_use]
    pub fn has_taunt(&self) -> bool {
        self.board.iter().any(Minion::forces_attacks)
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

/// Complete state of a two-seat game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub players: SideMap<PlayerState>,
    /// Side whose turn it is.
    pub active: Side,
    /// Player-turn counter, starting at 1 and bumped on every end of turn.
    pub turn: u32,
}

impl GameState {
    /// Create a state from two seats with `First` to act on turn 1.
    pub fn new(first: PlayerState, second: PlayerState) -> Self {
        Self {
            players: SideMap::new(first, second),
            active: Side::First,
            turn: 1,
        }
    }

    /// The seat `side` itself.
    #[must_use]
    pub fn own(&self, side: Side) -> &PlayerState {
        &self.players[side]
    }

    /// The seat across from `side`.
    #[must_use]
    pub fn opponent(&self, side: Side) -> &PlayerState {
        &self.players[side.opponent()]
    }

    pub fn own_mut(&mut self, side: Side) -> &mut PlayerState {
        &mut self.players[side]
    }

    pub fn opponent_mut(&mut self, side: Side) -> &mut PlayerState {
        &mut self.players[side.opponent()]
    }

    #[must_use]
    pub fn is_turn_of(&self, side: Side) -> bool {
        self.active == side
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(PlayerState::default(), PlayerState::default())
    }
}
