//! Epsilon-greedy DQN agent.
//!
//! The agent owns an online network, a lagged target network, the replay
//! buffer and its counters. The trainer drives it through four calls:
//!
//! 1. `select_action`: pick an index for the side to act
//! 2. `store_experience`: record the outcome of a learner decision
//! 3. `train`: one batched fit, when enough experience has accumulated
//! 4. `save` / `load`: persist under a checkpoint name
//!
//! Bellman targets use the target network with a fixed discount of
//! [`GAMMA`]; the target is refreshed from the online network every
//! `target_update_freq` training steps.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{GameRng, GameRngState, GameState, Side, ACTION_SPACE_SIZE};
use crate::error::{PersistenceError, TrainingError};
use crate::nn::{CardGameEncoder, EncodedState, QNetwork, QTarget, StateEncoder};
use crate::rules::Outcome;
use crate::training::checkpoint::{AgentArtifacts, CheckpointStore};
use crate::training::replay::{ReplayBuffer, Transition};
use crate::training::stats::{RollingWindow, TrainingStats};

/// Discount factor for future value.
pub const GAMMA: f32 = 0.99;

/// Configuration for [`DqnAgent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub epsilon_start: f64,
    /// Exploration floor.
    pub epsilon_end: f64,
    /// Multiplier applied after every training step.
    pub epsilon_decay: f64,
    pub batch_size: usize,
    /// Training steps between target-network syncs.
    pub target_update_freq: u64,
    /// Buffer size required before `train` does anything.
    pub min_experiences: usize,
    pub buffer_capacity: usize,
    /// Most recent transitions kept in a checkpoint.
    pub persisted_transitions: usize,
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.995,
            batch_size: 32,
            target_update_freq: 100,
            min_experiences: 1000,
            buffer_capacity: 10_000,
            persisted_transitions: 1000,
            seed: 0,
        }
    }
}

impl AgentConfig {
    /// Set starting exploration and its floor.
    #[must_use]
    pub fn with_epsilon(mut self, start: f64, end: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self
    }

    /// Set the per-step exploration decay.
    #[must_use]
    pub fn with_epsilon_decay(mut self, decay: f64) -> Self {
        self.epsilon_decay = decay;
        self
    }

    /// Set the training batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the target-network sync interval.
    #[must_use]
    pub fn with_target_update_freq(mut self, steps: u64) -> Self {
        self.target_update_freq = steps;
        self
    }

    /// Set the minimum buffer size before training.
    #[must_use]
    pub fn with_min_experiences(mut self, min: usize) -> Self {
        self.min_experiences = min;
        self
    }

    /// Set the replay capacity.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set how many transitions a checkpoint keeps.
    #[must_use]
    pub fn with_persisted_transitions(mut self, count: usize) -> Self {
        self.persisted_transitions = count;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Scalar agent state stored in `agent.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct AgentState {
    config: AgentConfig,
    epsilon: f64,
    episodes: u64,
    wins: u64,
    train_steps: u64,
    episode_reward: f32,
    rewards: RollingWindow,
    losses: RollingWindow,
    rng: GameRngState,
}

/// DQN learner with experience replay and a target network.
pub struct DqnAgent<N: QNetwork + Clone> {
    config: AgentConfig,
    encoder: Box<dyn StateEncoder>,
    online: N,
    target: N,
    buffer: ReplayBuffer,
    rng: GameRng,

    epsilon: f64,
    /// Finished episodes (terminal transitions stored).
    episodes: u64,
    wins: u64,
    train_steps: u64,
    /// Reward accumulated in the current episode.
    episode_reward: f32,
    rewards: RollingWindow,
    losses: RollingWindow,
}

impl<N: QNetwork + Clone> DqnAgent<N> {
    /// Create a fresh agent around `network`, encoding with [`CardGameEncoder`].
    pub fn new(network: N, config: AgentConfig) -> Self {
        Self::with_encoder(network, Box::new(CardGameEncoder::new()), config)
    }

    /// Create a fresh agent with a custom encoder.
    pub fn with_encoder(network: N, encoder: Box<dyn StateEncoder>, config: AgentConfig) -> Self {
        debug_assert_eq!(network.output_size(), ACTION_SPACE_SIZE);
        Self {
            encoder,
            target: network.clone(),
            online: network,
            buffer: ReplayBuffer::new(config.buffer_capacity),
            rng: GameRng::new(config.seed),
            epsilon: config.epsilon_start,
            episodes: 0,
            wins: 0,
            train_steps: 0,
            episode_reward: 0.0,
            rewards: RollingWindow::new(),
            losses: RollingWindow::new(),
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the exploration rate, clamped to `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn online(&self) -> &N {
        &self.online
    }

    pub fn target(&self) -> &N {
        &self.target
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Encode `state` as seen by `side`.
    pub fn encode(&self, state: &GameState, side: Side) -> EncodedState {
        self.encoder.encode(state, side)
    }

    /// Online-network action values for `side` in `state`.
    pub fn q_values(&self, state: &GameState, side: Side) -> Vec<f32> {
        self.online.predict(&self.encode(state, side))
    }

    /// Pick an action index for the side to act.
    ///
    /// When `exploring`, with probability ε the index is uniform over all 68
    /// slots, legal or not. Otherwise it is the arg-max of the online
    /// network's values, lowest index on ties.
    pub fn select_action(&mut self, state: &GameState, exploring: bool) -> usize {
        if exploring && self.rng.unit() < self.epsilon {
            return self.rng.index(ACTION_SPACE_SIZE);
        }
        argmax(&self.q_values(state, state.active))
    }

    /// Record one learner decision.
    ///
    /// Both states are encoded from the side acting in `state`. `terminal` is
    /// that side's outcome if the episode ended; it closes the episode's
    /// reward accumulator and counts a win only for [`Outcome::Win`].
    pub fn store_experience(
        &mut self,
        state: &GameState,
        action: usize,
        reward: f32,
        next_state: &GameState,
        terminal: Option<Outcome>,
    ) {
        let side = state.active;
        let transition = Transition::new(
            self.encode(state, side),
            action,
            reward,
            self.encode(next_state, side),
            terminal.is_some(),
        );
        self.buffer.add(transition);
        self.episode_reward += reward;

        if let Some(outcome) = terminal {
            self.rewards.push(self.episode_reward);
            self.episode_reward = 0.0;
            self.episodes += 1;
            if outcome.is_win() {
                self.wins += 1;
            }
        }
    }

    /// One training step. `Ok(None)` until the buffer holds
    /// `min_experiences` transitions; otherwise the batch loss.
    pub fn train(&mut self) -> Result<Option<f32>, TrainingError> {
        if !self.buffer.can_sample(self.config.min_experiences.max(1)) {
            return Ok(None);
        }

        let batch = self.buffer.sample(self.config.batch_size, &mut self.rng)?;
        let next_inputs: Vec<&EncodedState> = batch.iter().map(|t| &t.next_state).collect();
        let next_values = self.target.predict_batch(&next_inputs);

        let targets: Vec<QTarget<'_>> = batch
            .iter()
            .zip(&next_values)
            .map(|(transition, next)| QTarget {
                input: &transition.state,
                action: transition.action,
                target: if transition.done {
                    transition.reward
                } else {
                    transition.reward + GAMMA * max_value(next)
                },
            })
            .collect();
        let loss = self.online.fit(&targets);

        self.losses.push(loss);
        self.train_steps += 1;
        if self.config.target_update_freq > 0
            && self.train_steps % self.config.target_update_freq == 0
        {
            self.sync_target()?;
            log::debug!("synced target network at step {}", self.train_steps);
        }
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_end);

        Ok(Some(loss))
    }

    /// Copy online parameters into the target network.
    pub fn sync_target(&mut self) -> Result<(), TrainingError> {
        self.target.load_parameters(&self.online.parameters())?;
        Ok(())
    }

    pub fn stats(&self) -> TrainingStats {
        TrainingStats {
            epsilon: self.epsilon,
            avg_loss: self.losses.mean(),
            avg_reward: self.rewards.mean(),
            win_rate: if self.episodes == 0 {
                0.0
            } else {
                self.wins as f32 / self.episodes as f32
            },
            buffer_len: self.buffer.len(),
            buffer_capacity: self.buffer.capacity(),
            train_steps: self.train_steps,
            episodes: self.episodes,
        }
    }

    /// Save weights, the most recent replay slice and scalar state.
    pub fn save(&self, store: &CheckpointStore, name: &str) -> Result<PathBuf, PersistenceError> {
        let artifacts = AgentArtifacts {
            weights: self.online.parameters(),
            replay: self.buffer.snapshot(self.config.persisted_transitions),
            state: AgentState {
                config: self.config.clone(),
                epsilon: self.epsilon,
                episodes: self.episodes,
                wins: self.wins,
                train_steps: self.train_steps,
                episode_reward: self.episode_reward,
                rewards: self.rewards.clone(),
                losses: self.losses.clone(),
                rng: self.rng.state(),
            },
        };
        store.save_agent(name, &artifacts)
    }

    /// Restore a checkpoint saved with [`DqnAgent::save`].
    ///
    /// `Ok(false)` if nothing is saved under `name`. On any error the agent is
    /// left exactly as it was.
    pub fn load(&mut self, store: &CheckpointStore, name: &str) -> Result<bool, PersistenceError> {
        let Some(artifacts) = store.load_agent::<AgentState>(name)? else {
            return Ok(false);
        };

        let mut online = self.online.clone();
        online.load_parameters(&artifacts.weights)?;
        let target = online.clone();
        let state = artifacts.state;

        self.online = online;
        self.target = target;
        self.buffer = ReplayBuffer::from_snapshot(artifacts.replay);
        self.rng = GameRng::from_state(&state.rng);
        self.config = state.config;
        self.epsilon = state.epsilon;
        self.episodes = state.episodes;
        self.wins = state.wins;
        self.train_steps = state.train_steps;
        self.episode_reward = state.episode_reward;
        self.rewards = state.rewards;
        self.losses = state.losses;

        log::info!(
            "loaded agent '{}': eps={:.3}, {} steps, {} episodes, {} transitions",
            name,
            self.epsilon,
            self.train_steps,
            self.episodes,
            self.buffer.len()
        );
        Ok(true)
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = index;
        }
    }
    best
}

fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().reduce(f32::max).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{MlpConfig, MlpQNetwork, TabularQ, STATE_SIZE};
    use tempfile::TempDir;

    fn tabular(values: Vec<f32>) -> TabularQ {
        let mut full = vec![0.0; ACTION_SPACE_SIZE];
        for (slot, value) in full.iter_mut().zip(values) {
            *slot = value;
        }
        TabularQ::new(STATE_SIZE, full)
    }

    fn fill(agent: &mut DqnAgent<impl QNetwork + Clone>, count: usize) {
        let state = GameState::default();
        for i in 0..count {
            agent.store_experience(&state, i % ACTION_SPACE_SIZE, 0.1, &state, None);
        }
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.0, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax(&[-1.0, -1.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_greedy_selection() {
        let mut values = vec![0.0; ACTION_SPACE_SIZE];
        values[42] = 3.0;
        values[67] = 3.0;
        let mut agent = DqnAgent::new(TabularQ::new(STATE_SIZE, values), AgentConfig::default());
        agent.set_epsilon(0.0);
        assert_eq!(agent.select_action(&GameState::default(), true), 42);
        agent.set_epsilon(1.0);
        assert_eq!(agent.select_action(&GameState::default(), false), 42);
    }

    #[test]
    fn test_full_exploration_is_uniform_over_all_indices() {
        let mut values = vec![0.0; ACTION_SPACE_SIZE];
        values[5] = 100.0;
        let mut agent = DqnAgent::new(TabularQ::new(STATE_SIZE, values), AgentConfig::default());
        let state = GameState::default();

        let picks: Vec<usize> = (0..500).map(|_| agent.select_action(&state, true)).collect();
        assert!(picks.iter().all(|&i| i < ACTION_SPACE_SIZE));
        let non_greedy = picks.iter().filter(|&&i| i != 5).count();
        assert!(non_greedy > 450, "epsilon 1.0 should ignore the network");
    }

    #[test]
    fn test_train_is_noop_below_min_experiences() {
        let config = AgentConfig::default().with_min_experiences(10);
        let mut agent = DqnAgent::new(tabular(vec![]), config);
        fill(&mut agent, 9);

        assert_eq!(agent.train().unwrap(), None);
        assert_eq!(agent.train_steps(), 0);
        assert_eq!(agent.epsilon(), 1.0);
    }

    #[test]
    fn test_epsilon_decays_to_floor() {
        let config = AgentConfig::default()
            .with_min_experiences(1)
            .with_epsilon(1.0, 0.5)
            .with_epsilon_decay(0.9);
        let mut agent = DqnAgent::new(tabular(vec![]), config);
        fill(&mut agent, 4);

        let mut previous = agent.epsilon();
        for _ in 0..50 {
            agent.train().unwrap();
            assert!(agent.epsilon() <= previous);
            assert!(agent.epsilon() >= 0.5);
            previous = agent.epsilon();
        }
        assert_eq!(agent.epsilon(), 0.5);
    }

    #[test]
    fn test_terminal_target_is_reward() {
        let config = AgentConfig::default()
            .with_min_experiences(1)
            .with_batch_size(1)
            .with_target_update_freq(1000);
        let mut agent = DqnAgent::new(tabular(vec![]).with_step(1.0), config);
        let mut values = vec![0.0; ACTION_SPACE_SIZE];
        values[0] = 50.0;
        agent.target = TabularQ::new(STATE_SIZE, values);

        let state = GameState::default();
        agent.store_experience(&state, 3, 2.0, &state, Some(Outcome::Loss));
        agent.train().unwrap();
        assert_eq!(agent.online().parameters()[3], 2.0);
    }

    #[test]
    fn test_bootstrap_target_uses_target_network() {
        let config = AgentConfig::default()
            .with_min_experiences(1)
            .with_batch_size(1)
            .with_target_update_freq(1000);
        let mut agent = DqnAgent::new(tabular(vec![]).with_step(1.0), config);
        let mut values = vec![0.0; ACTION_SPACE_SIZE];
        values[9] = 10.0;
        agent.target = TabularQ::new(STATE_SIZE, values);

        let state = GameState::default();
        agent.store_experience(&state, 3, 1.0, &state, None);
        agent.train().unwrap();
        let learned = agent.online().parameters()[3];
        assert!((learned - (1.0 + GAMMA * 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_target_syncs_after_update_freq() {
        let config = AgentConfig::default()
            .with_min_experiences(4)
            .with_batch_size(4)
            .with_target_update_freq(3)
            .with_seed(5);
        let network = MlpQNetwork::new(&MlpConfig::default().with_hidden_layers(vec![16]));
        let mut agent = DqnAgent::new(network, config);
        fill(&mut agent, 8);
        let encoded = agent.encode(&GameState::default(), Side::First);

        agent.train().unwrap();
        agent.train().unwrap();
        assert_ne!(agent.online().predict(&encoded), agent.target().predict(&encoded));

        agent.train().unwrap();
        assert_eq!(agent.online().predict(&encoded), agent.target().predict(&encoded));
    }

    #[test]
    fn test_terminal_bookkeeping() {
        let mut agent = DqnAgent::new(tabular(vec![]), AgentConfig::default());
        let state = GameState::default();

        agent.store_experience(&state, 0, 1.0, &state, None);
        agent.store_experience(&state, 0, 10.0, &state, Some(Outcome::Win));
        agent.store_experience(&state, 0, -10.0, &state, Some(Outcome::Draw));

        let stats = agent.stats();
        assert_eq!(stats.episodes, 2);
        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.avg_reward, (11.0 - 10.0) / 2.0);
        assert_eq!(stats.buffer_len, 3);
        assert!(agent.buffer().iter_chronological().last().unwrap().done);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = CheckpointStore::new(tmp.path());
        let config = AgentConfig::default()
            .with_min_experiences(2)
            .with_batch_size(2)
            .with_persisted_transitions(3);
        let network = MlpQNetwork::new(&MlpConfig::default().with_hidden_layers(vec![8]));

        let mut agent = DqnAgent::new(network.clone(), config.clone());
        fill(&mut agent, 5);
        agent.train().unwrap();
        agent.save(&store, "dqn").unwrap();

        let mut restored = DqnAgent::new(network, AgentConfig::default());
        assert!(restored.load(&store, "dqn").unwrap());
        assert_eq!(restored.epsilon(), agent.epsilon());
        assert_eq!(restored.train_steps(), 1);
        assert_eq!(restored.buffer().len(), 3);
        assert_eq!(restored.config(), &config);
        assert_eq!(restored.online().parameters(), agent.online().parameters());
        assert_eq!(restored.target().parameters(), agent.online().parameters());
    }

    #[test]
    fn test_load_missing_leaves_fresh_agent() {
        let tmp = TempDir::new().unwrap();
        let store = CheckpointStore::new(tmp.path());
        let mut agent = DqnAgent::new(tabular(vec![1.0]), AgentConfig::default());

        assert!(!agent.load(&store, "nothing").unwrap());
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.online().parameters()[0], 1.0);
    }

    #[test]
    fn test_load_mismatched_weights_leaves_agent_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = CheckpointStore::new(tmp.path());
        let small = DqnAgent::new(TabularQ::zeros(STATE_SIZE, 68), AgentConfig::default());
        small.save(&store, "dqn").unwrap();

        let network = MlpQNetwork::new(&MlpConfig::default().with_hidden_layers(vec![4]));
        let mut agent = DqnAgent::new(network, AgentConfig::default());
        agent.set_epsilon(0.7);
        let before = agent.online().parameters();

        assert!(matches!(
            agent.load(&store, "dqn"),
            Err(PersistenceError::Network(_))
        ));
        assert_eq!(agent.epsilon(), 0.7);
        assert_eq!(agent.online().parameters(), before);
    }
}
