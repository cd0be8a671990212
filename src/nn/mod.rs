//! Function approximation for the learner.
//!
//! ## Overview
//!
//! - **Traits**: `QNetwork` (predict, fit, parameter snapshot)
//! - **Encoding**: `StateEncoder` trait and the 121-feature `CardGameEncoder`
//! - **Networks**: `MlpQNetwork` dense `burn` baseline, `TabularQ` for testing
//!
//! ## Usage
//!
//! ```rust
//! use ccg_learner::core::{GameState, Side};
//! use ccg_learner::nn::{CardGameEncoder, MlpConfig, MlpQNetwork, QNetwork, StateEncoder};
//!
//! let encoder = CardGameEncoder::new();
//! let network = MlpQNetwork::new(&MlpConfig::default());
//!
//! let encoded = encoder.encode(&GameState::default(), Side::First);
//! let q_values = network.predict(&encoded);
//! assert_eq!(q_values.len(), 68);
//! ```

pub mod encoder;
pub mod mlp;
pub mod traits;

pub use encoder::{CardGameEncoder, StateEncoder, STATE_SIZE};
pub use mlp::{MlpConfig, MlpQNetwork};
pub use traits::{EncodedState, QNetwork, QTarget, TabularQ};
