use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{ACTION_SPACE_SIZE, MAX_HAND_SIZE};
use crate::error::ConfigError;
use crate::nn::{MlpConfig, STATE_SIZE};
use crate::training::{AgentConfig, RewardConfig, RunConfig, TrainerConfig};

/// Checkpoint location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub dir: PathBuf,
    /// Start from scratch even if a checkpoint exists.
    pub fresh: bool,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        CheckpointConfig {
            dir: PathBuf::from("checkpoints"),
            fresh: false,
        }
    }
}

/// Top-level configuration, loadable from TOML.
///
/// Every section and field is optional; missing values take their defaults.
///
/// ```toml
/// [agent]
/// epsilon_decay = 0.999
///
/// [reward]
/// win_reward = 20.0
///
/// [run]
/// decks = ["aggro", "control"]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub agent: AgentConfig,
    pub network: MlpConfig,
    pub reward: RewardConfig,
    pub trainer: TrainerConfig,
    pub run: RunConfig,
    pub checkpoint: CheckpointConfig,
}

impl LearnerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: LearnerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if !(0.0..=1.0).contains(&agent.epsilon_start) {
            return Err(invalid("agent.epsilon_start must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&agent.epsilon_end) {
            return Err(invalid("agent.epsilon_end must be in [0, 1]"));
        }
        if agent.epsilon_end > agent.epsilon_start {
            return Err(invalid("agent.epsilon_end must be <= agent.epsilon_start"));
        }
        if !(agent.epsilon_decay > 0.0 && agent.epsilon_decay <= 1.0) {
            return Err(invalid("agent.epsilon_decay must be in (0, 1]"));
        }
        if agent.batch_size == 0 {
            return Err(invalid("agent.batch_size must be > 0"));
        }
        if agent.buffer_capacity < agent.batch_size {
            return Err(invalid("agent.buffer_capacity must be >= agent.batch_size"));
        }
        if agent.min_experiences < agent.batch_size {
            return Err(invalid("agent.min_experiences must be >= agent.batch_size"));
        }

        let network = &self.network;
        if network.learning_rate <= 0.0 {
            return Err(invalid("network.learning_rate must be > 0"));
        }
        if network.input_size != STATE_SIZE {
            return Err(ConfigError::Validation(format!(
                "network.input_size must be {STATE_SIZE}"
            )));
        }
        if network.output_size != ACTION_SPACE_SIZE {
            return Err(ConfigError::Validation(format!(
                "network.output_size must be {ACTION_SPACE_SIZE}"
            )));
        }
        if network.hidden_layers.iter().any(|&width| width == 0) {
            return Err(invalid("network.hidden_layers widths must be > 0"));
        }

        let trainer = &self.trainer;
        if trainer.max_turns == 0 {
            return Err(invalid("trainer.max_turns must be > 0"));
        }
        if trainer.stall_limit <= MAX_HAND_SIZE {
            return Err(ConfigError::Validation(format!(
                "trainer.stall_limit must be > {MAX_HAND_SIZE}"
            )));
        }
        if trainer.checkpoint_name.is_empty() {
            return Err(invalid("trainer.checkpoint_name must not be empty"));
        }

        let run = &self.run;
        if run.decks.is_empty() {
            return Err(invalid("run.decks must name at least one archetype"));
        }
        if run.batch_size == 0 {
            return Err(invalid("run.batch_size must be > 0"));
        }
        if run.episodes_per_matchup == 0 {
            return Err(invalid("run.episodes_per_matchup must be > 0"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}
