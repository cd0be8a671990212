//! Game rules seen from the learner's side.
//!
//! - `engine`: the `Simulator` trait a game implements, plus game results
//! - `action_space`: the legality oracle over the 68 action indices
//!
//! The learner calls into `Simulator` but never resolves game effects
//! itself.

pub mod action_space;
pub mod engine;

pub use action_space::ActionSpace;
pub use engine::{GameResult, GameSetup, Outcome, Simulator};
