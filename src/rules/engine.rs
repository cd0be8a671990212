//! Simulator trait for game implementations.
//!
//! The learner never resolves combat, spells or card draw itself. A game
//! implements `Simulator` to define:
//! - How a game is set up from two decks
//! - How an action transforms a state
//! - When the game is over and who won

use serde::{Deserialize, Serialize};

use crate::core::{Action, Deck, GameState, Side};
use crate::error::SimulationError;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(Side),
    /// Both heroes died together.
    Draw,
}

impl GameResult {
    /// The result from one side's point of view.
    #[must_use]
    pub fn outcome_for(&self, side: Side) -> Outcome {
        match self {
            GameResult::Winner(winner) if *winner == side => Outcome::Win,
            GameResult::Winner(_) => Outcome::Loss,
            GameResult::Draw => Outcome::Draw,
        }
    }
}

/// How an episode ended for the learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    /// Simultaneous death or the turn ceiling was reached.
    Draw,
}

impl Outcome {
    #[must_use]
    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Loss => write!(f, "loss"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Parameters for building the opening position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSetup {
    /// Cards each side draws before the first turn.
    pub opening_hand: usize,
    /// Mana crystals the first side has on its first turn.
    pub starting_mana: i32,
}

impl Default for GameSetup {
    fn default() -> Self {
        Self {
            opening_hand: 3,
            starting_mana: 1,
        }
    }
}

impl GameSetup {
    /// Set the opening hand size.
    #[must_use]
    pub fn with_opening_hand(mut self, cards: usize) -> Self {
        self.opening_hand = cards;
        self
    }

    /// Set the first-turn mana.
    #[must_use]
    pub fn with_starting_mana(mut self, mana: i32) -> Self {
        self.starting_mana = mana;
        self
    }
}

/// Game simulator.
///
/// ## Implementation Notes
///
/// - `initial_state`: `First` acts first; the returned state is ready for a
///   decision (first turn already begun)
/// - `apply`: returns a new state and leaves the input untouched. Internal
///   randomness (shuffles, random targets) is allowed and drawn from the
///   simulator's own seeded RNG
/// - `apply` rejects illegal actions with `SimulationError::IllegalAction`
/// - `is_terminal`: return `None` while the game continues
pub trait Simulator {
    /// Build the opening position for `first` versus `second`.
    fn initial_state(&mut self, first: &Deck, second: &Deck, setup: &GameSetup) -> GameState;

    /// Apply `action` taken by `side`.
    fn apply(
        &mut self,
        state: &GameState,
        action: &Action,
        side: Side,
    ) -> Result<GameState, SimulationError>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &GameState) -> Option<GameResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for() {
        let result = GameResult::Winner(Side::First);
        assert_eq!(result.outcome_for(Side::First), Outcome::Win);
        assert_eq!(result.outcome_for(Side::Second), Outcome::Loss);
        assert_eq!(GameResult::Draw.outcome_for(Side::First), Outcome::Draw);
        assert!(Outcome::Win.is_win());
        assert!(!Outcome::Draw.is_win());
    }

    #[test]
    fn test_setup_builders() {
        let setup = GameSetup::default()
            .with_opening_hand(4)
            .with_starting_mana(2);
        assert_eq!(setup.opening_hand, 4);
        assert_eq!(setup.starting_mana, 2);
    }
}
