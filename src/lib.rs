//! # ccg-learner
//!
//! Self-play Deep Q-Network training for a two-player collectible card game.
//!
//! ## Design Principles
//!
//! 1. **Fixed Action Space**: Every decision is one of 68 indices. Play card
//!    `0..=9`, minion attacks `10..=59`, face attacks `60..=66`, end turn `67`.
//!
//! 2. **Perspective Encoding**: States are encoded from the acting side, so a
//!    single network plays both seats.
//!
//! 3. **Simulator Boundary**: Game rules live behind the [`Simulator`] trait.
//!    The learner only sees states, legality and results.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: decks are `im` vectors, so per-decision
//!   state clones stay cheap.
//!
//! - **Deterministic RNG**: shuffles, exploration and replay sampling all draw
//!   from seeded ChaCha8 streams.
//!
//! ## Modules
//!
//! - `core`: sides, cards, game state, actions, RNG
//! - `rules`: simulator trait, results and action legality
//! - `nn`: state encoder and Q-value approximators
//! - `training`: agent, replay, reward shaping, episode loop, checkpoints
//! - `games`: the reference `skirmish` simulator and its decks
//! - `config`: TOML configuration

pub mod config;
pub mod core;
pub mod error;
pub mod games;
pub mod nn;
pub mod rules;
pub mod training;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionKind, Card, Deck, GameRng, GameState, PlayerState, RawAction, Side, SideMap,
    ACTION_SPACE_SIZE,
};

pub use crate::rules::{ActionSpace, GameResult, GameSetup, Outcome, Simulator};

pub use crate::nn::{CardGameEncoder, EncodedState, MlpConfig, MlpQNetwork, QNetwork, StateEncoder};

pub use crate::training::{
    AgentConfig, CheckpointStore, DqnAgent, RewardConfig, Trainer, TrainerConfig,
};

pub use crate::config::LearnerConfig;
pub use crate::error::{
    ActionError, ConfigError, PersistenceError, SimulationError, TrainingError,
};
