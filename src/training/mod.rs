//! DQN training: agent, replay, reward shaping, episode loop and checkpoints.
//!
//! ## Overview
//!
//! - **DqnAgent**: online and target networks, ε-greedy selection, replay
//! - **ReplayBuffer**: fixed-capacity ring of transitions
//! - **calculate_reward**: shaped per-decision reward
//! - **Trainer**: runs episodes against a simulator and feeds the agent
//! - **run_training**: interleaves episodes over every deck matchup
//! - **CheckpointStore**: resumable on-disk state
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ccg_learner::games::skirmish::{Archetype, Skirmish};
//! use ccg_learner::nn::{MlpConfig, MlpQNetwork};
//! use ccg_learner::training::{
//!     AgentConfig, CheckpointStore, DqnAgent, RewardConfig, Trainer, TrainerConfig,
//! };
//!
//! let network = MlpQNetwork::new(&MlpConfig::default());
//! let mut agent = DqnAgent::new(network, AgentConfig::default());
//! let mut trainer = Trainer::new(Skirmish::new(7), TrainerConfig::default(), RewardConfig::default());
//! let store = CheckpointStore::new("checkpoints");
//!
//! let deck = Archetype::Midrange.deck();
//! let progress = trainer
//!     .train(&mut agent, &store, &deck, &deck, 1000, |report| println!("{report}"))
//!     .unwrap();
//! println!("{}", progress.tally);
//! ```

pub mod agent;
pub mod checkpoint;
pub mod replay;
pub mod reward;
pub mod schedule;
pub mod stats;
pub mod trainer;

pub use agent::{AgentConfig, DqnAgent, GAMMA};
pub use checkpoint::{AgentArtifacts, CheckpointStore, TrainingProgress};
pub use replay::{ReplayBuffer, ReplaySnapshot, Transition};
pub use reward::{calculate_reward, RewardConfig};
pub use schedule::{matchups, run_schedule, run_training, Matchup, RunConfig};
pub use stats::{RollingWindow, Tally, TrainingStats};
pub use trainer::{EpisodeLog, EpisodeResult, OpponentMode, ProgressReport, Trainer, TrainerConfig};
