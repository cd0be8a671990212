//! Error types.

use std::path::PathBuf;

use crate::core::{Action, ActionKind, Side};

/// Errors converting between action indices and structured actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("action index {0} is outside [0, 67]")]
    InvalidIndex(usize),

    #[error("action is missing required field `{field}` (kind: {kind:?})")]
    MissingField {
        kind: Option<ActionKind>,
        field: &'static str,
    },

    #[error("{field} = {value} is outside [0, {limit})")]
    FieldOutOfRange {
        field: &'static str,
        value: usize,
        limit: usize,
    },
}

/// Errors from the experience replay buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot sample from an empty replay buffer")]
    EmptyBuffer,
}

/// Errors from a Q-value network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("expected {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },
}

/// Errors raised by a simulator when applying an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("{side} tried to act during {active}'s turn")]
    NotYourTurn { side: Side, active: Side },

    #[error("illegal action {0:?}")]
    IllegalAction(Action),

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Errors saving or loading checkpoints.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("checkpoint '{name}' has weights but no {missing}")]
    Incomplete { name: String, missing: &'static str },

    #[error("stored weights do not fit the network: {0}")]
    Network(#[from] NetworkError),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("checkpoint error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
