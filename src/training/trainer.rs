//! Episode runner and sequential training loop.
//!
//! One episode goes through three stages:
//!
//! 1. **Setup**: the simulator deals the opening position from two decks
//! 2. **Decisions**: until the game ends or the turn ceiling is reached. The
//!    learner picks epsilon-greedy, illegal picks are replaced by a random
//!    legal action, and each decision is scored and stored. The opponent is
//!    either the same agent (self-play) or uniformly random
//! 3. **Terminal**: the learner's last decision is stored with the terminal
//!    reward, and the episode is classified as a win, loss or draw
//!
//! A learner decision is stored when the learner next gets to act, so its
//! `next_state` includes the opponent's reply. The decision that precedes
//! the end of the game is stored with the terminal reward.

use serde::{Deserialize, Serialize};

use crate::core::{Action, Deck, GameRng, GameState, Side, END_TURN_INDEX};
use crate::error::{SimulationError, TrainingError};
use crate::nn::QNetwork;
use crate::rules::{ActionSpace, GameSetup, Outcome, Simulator};
use crate::training::agent::DqnAgent;
use crate::training::checkpoint::{CheckpointStore, TrainingProgress};
use crate::training::reward::{calculate_reward, RewardConfig};
use crate::training::stats::{RollingWindow, Tally, TrainingStats};

/// Who plays the other seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentMode {
    /// The learning agent itself, acting from the other side.
    #[default]
    SelfPlay,
    /// Uniform choice among legal actions.
    Random,
}

impl OpponentMode {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "selfplay" | "self-play" => Some(OpponentMode::SelfPlay),
            "random" => Some(OpponentMode::Random),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpponentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpponentMode::SelfPlay => write!(f, "selfplay"),
            OpponentMode::Random => write!(f, "random"),
        }
    }
}

/// Configuration for [`Trainer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Episodes past this turn number end in a draw.
    pub max_turns: u32,
    /// Consecutive decisions one side may make before the episode is
    /// force-ended as a learner loss.
    pub stall_limit: usize,
    /// Call `train()` every this many learner decisions.
    pub train_every: usize,
    pub opponent: OpponentMode,
    /// Episodes between progress reports.
    pub report_every: u64,
    /// Episodes between agent saves.
    pub save_every: u64,
    /// Learner plays second on odd episodes.
    pub alternate_sides: bool,
    pub setup: GameSetup,
    /// Checkpoint name used with the store.
    pub checkpoint_name: String,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_turns: 100,
            stall_limit: 60,
            train_every: 1,
            opponent: OpponentMode::SelfPlay,
            report_every: 100,
            save_every: 500,
            alternate_sides: true,
            setup: GameSetup::default(),
            checkpoint_name: "dqn".to_string(),
            seed: 0,
        }
    }
}

impl TrainerConfig {
    /// Set the turn ceiling.
    #[must_use]
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Set the stall guard limit.
    #[must_use]
    pub fn with_stall_limit(mut self, decisions: usize) -> Self {
        self.stall_limit = decisions;
        self
    }

    /// Set the training cadence.
    #[must_use]
    pub fn with_train_every(mut self, decisions: usize) -> Self {
        self.train_every = decisions;
        self
    }

    /// Set the opponent.
    #[must_use]
    pub fn with_opponent(mut self, opponent: OpponentMode) -> Self {
        self.opponent = opponent;
        self
    }

    /// Set the report cadence.
    #[must_use]
    pub fn with_report_every(mut self, episodes: u64) -> Self {
        self.report_every = episodes;
        self
    }

    /// Set the save cadence.
    #[must_use]
    pub fn with_save_every(mut self, episodes: u64) -> Self {
        self.save_every = episodes;
        self
    }

    /// Alternate the learner's seat between episodes.
    #[must_use]
    pub fn with_alternate_sides(mut self, alternate: bool) -> Self {
        self.alternate_sides = alternate;
        self
    }

    /// Set the opening position parameters.
    #[must_use]
    pub fn with_setup(mut self, setup: GameSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Set the checkpoint name.
    #[must_use]
    pub fn with_checkpoint_name(mut self, name: impl Into<String>) -> Self {
        self.checkpoint_name = name.into();
        self
    }

    /// Set the RNG seed for the random opponent and fallbacks.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Learner seat for an episode index.
    #[must_use]
    pub fn learner_side(&self, episode: u64) -> Side {
        if self.alternate_sides && episode % 2 == 1 {
            Side::Second
        } else {
            Side::First
        }
    }
}

/// Summary of one episode from the learner's point of view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub outcome: Outcome,
    pub learner: Side,
    /// Turn counter when the episode ended.
    pub turns: u32,
    /// Sum of rewards stored for the learner.
    pub total_reward: f32,
    /// Learner picks replaced by the legality fallback.
    pub illegal_actions: u32,
    /// Learner decisions made.
    pub decisions: u32,
    /// Ended by the stall guard.
    pub stalled: bool,
}

/// Progress callback payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Episodes completed so far, including earlier runs.
    pub episodes: u64,
    pub tally: Tally,
    /// Win rate over the last 100 episodes.
    pub rolling_win_rate: f32,
    pub avg_reward: f32,
    pub avg_turns: f32,
    pub epsilon: f64,
    pub stats: TrainingStats,
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "episode {} | {} | win(100)={:.1}% reward={:.2} turns={:.1} | {}",
            self.episodes,
            self.tally,
            self.rolling_win_rate * 100.0,
            self.avg_reward,
            self.avg_turns,
            self.stats,
        )
    }
}

/// Rolling per-episode telemetry for reports.
#[derive(Clone, Debug, Default)]
pub struct EpisodeLog {
    wins: RollingWindow,
    rewards: RollingWindow,
    turns: RollingWindow,
}

impl EpisodeLog {
    pub fn record(&mut self, result: &EpisodeResult) {
        self.wins.push(if result.outcome.is_win() { 1.0 } else { 0.0 });
        self.rewards.push(result.total_reward);
        self.turns.push(result.turns as f32);
    }

    pub fn report<N: QNetwork + Clone>(
        &self,
        progress: &TrainingProgress,
        agent: &DqnAgent<N>,
    ) -> ProgressReport {
        ProgressReport {
            episodes: progress.next_episode,
            tally: progress.tally,
            rolling_win_rate: self.wins.mean(),
            avg_reward: self.rewards.mean(),
            avg_turns: self.turns.mean(),
            epsilon: agent.epsilon(),
            stats: agent.stats(),
        }
    }
}

/// A learner decision waiting for its next state.
struct Pending {
    state: GameState,
    action: Action,
    index: usize,
    reward: f32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Learn,
    Evaluate,
}

/// Runs episodes against a simulator and feeds a [`DqnAgent`].
pub struct Trainer<S: Simulator> {
    sim: S,
    config: TrainerConfig,
    reward: RewardConfig,
    rng: GameRng,
}

impl<S: Simulator> Trainer<S> {
    pub fn new(sim: S, config: TrainerConfig, reward: RewardConfig) -> Self {
        Self {
            rng: GameRng::new(config.seed),
            sim,
            config,
            reward,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    /// Play one learning episode with the learner in seat `learner`.
    ///
    /// `learner_deck` is always the learner's deck, whichever seat it takes.
    pub fn run_episode<N: QNetwork + Clone>(
        &mut self,
        agent: &mut DqnAgent<N>,
        learner_deck: &Deck,
        opponent_deck: &Deck,
        learner: Side,
    ) -> Result<EpisodeResult, TrainingError> {
        self.play(agent, learner_deck, opponent_deck, learner, Mode::Learn)
    }

    /// Greedy games against a random opponent. Nothing is stored or trained
    /// and ε is left unchanged.
    pub fn evaluate<N: QNetwork + Clone>(
        &mut self,
        agent: &mut DqnAgent<N>,
        learner_deck: &Deck,
        opponent_deck: &Deck,
        games: u64,
    ) -> Result<Tally, TrainingError> {
        let mut tally = Tally::default();
        for game in 0..games {
            let learner = self.config.learner_side(game);
            let result = self.play(agent, learner_deck, opponent_deck, learner, Mode::Evaluate)?;
            tally.record(result.outcome);
        }
        log::info!(
            "evaluation {} vs {}: {} ({:.1}% wins)",
            learner_deck.name,
            opponent_deck.name,
            tally,
            tally.win_rate() * 100.0
        );
        Ok(tally)
    }

    fn play<N: QNetwork + Clone>(
        &mut self,
        agent: &mut DqnAgent<N>,
        learner_deck: &Deck,
        opponent_deck: &Deck,
        learner: Side,
        mode: Mode,
    ) -> Result<EpisodeResult, TrainingError> {
        let (first, second) = match learner {
            Side::First => (learner_deck, opponent_deck),
            Side::Second => (opponent_deck, learner_deck),
        };
        let mut state = self.sim.initial_state(first, second, &self.config.setup);

        let mut result = EpisodeResult {
            outcome: Outcome::Draw,
            learner,
            turns: 0,
            total_reward: 0.0,
            illegal_actions: 0,
            decisions: 0,
            stalled: false,
        };
        let mut pending: Option<Pending> = None;
        let mut last_actor = state.active;
        let mut streak = 0usize;

        let outcome = loop {
            if let Some(game) = self.sim.is_terminal(&state) {
                break game.outcome_for(learner);
            }
            if state.turn > self.config.max_turns {
                log::debug!("turn ceiling {} reached, scoring a draw", self.config.max_turns);
                break Outcome::Draw;
            }

            let actor = state.active;
            if actor == last_actor {
                streak += 1;
            } else {
                last_actor = actor;
                streak = 1;
            }
            if streak > self.config.stall_limit {
                log::warn!(
                    "stall guard: {} made {} consecutive decisions on turn {}, forcing a learner loss",
                    actor,
                    self.config.stall_limit,
                    state.turn
                );
                result.stalled = true;
                break Outcome::Loss;
            }

            if actor == learner {
                if let Some(previous) = pending.take() {
                    agent.store_experience(
                        &previous.state,
                        previous.index,
                        previous.reward,
                        &state,
                        None,
                    );
                    result.total_reward += previous.reward;
                }

                let exploring = mode == Mode::Learn;
                let chosen = agent.select_action(&state, exploring);
                let (index, action, substituted) = self.legalize(chosen, &state, actor)?;
                if substituted {
                    result.illegal_actions += 1;
                }
                result.decisions += 1;

                let next = self.sim.apply(&state, &action, actor)?;
                if mode == Mode::Learn {
                    let terminal = self.sim.is_terminal(&next).map(|r| r.outcome_for(learner));
                    let reward =
                        calculate_reward(&state, &action, &next, actor, terminal, &self.reward);
                    pending = Some(Pending {
                        state,
                        action,
                        index,
                        reward,
                    });

                    if self.config.train_every > 0
                        && result.decisions as usize % self.config.train_every == 0
                    {
                        agent.train()?;
                    }
                }
                state = next;
            } else {
                let index = match self.config.opponent {
                    OpponentMode::SelfPlay if mode == Mode::Learn => {
                        agent.select_action(&state, true)
                    }
                    _ => self.random_legal(&state, actor),
                };
                let (_, action, _) = self.legalize(index, &state, actor)?;
                state = self.sim.apply(&state, &action, actor)?;
            }
        };

        if let Some(previous) = pending.take() {
            let reward = calculate_reward(
                &previous.state,
                &previous.action,
                &state,
                learner,
                Some(outcome),
                &self.reward,
            );
            agent.store_experience(&previous.state, previous.index, reward, &state, Some(outcome));
            result.total_reward += reward;
        }

        result.outcome = outcome;
        result.turns = state.turn;
        Ok(result)
    }

    /// Run learning episodes until `episodes` have been played in total.
    ///
    /// Resumes from saved progress under the configured checkpoint name.
    /// Progress is persisted after every episode and the agent is saved every
    /// `save_every` episodes and at the end. On error the agent is saved once
    /// more, best effort, before the error is returned.
    pub fn train<N, F>(
        &mut self,
        agent: &mut DqnAgent<N>,
        store: &CheckpointStore,
        learner_deck: &Deck,
        opponent_deck: &Deck,
        episodes: u64,
        mut on_progress: F,
    ) -> Result<TrainingProgress, TrainingError>
    where
        N: QNetwork + Clone,
        F: FnMut(&ProgressReport),
    {
        let name = self.config.checkpoint_name.clone();
        match self.train_inner(agent, store, learner_deck, opponent_deck, episodes, &mut on_progress)
        {
            Ok(progress) => Ok(progress),
            Err(err) => {
                log::error!("training failed: {err}; saving '{name}' before exiting");
                if let Err(save_err) = agent.save(store, &name) {
                    log::error!("emergency save of '{name}' failed: {save_err}");
                }
                Err(err)
            }
        }
    }

    fn train_inner<N, F>(
        &mut self,
        agent: &mut DqnAgent<N>,
        store: &CheckpointStore,
        learner_deck: &Deck,
        opponent_deck: &Deck,
        episodes: u64,
        on_progress: &mut F,
    ) -> Result<TrainingProgress, TrainingError>
    where
        N: QNetwork + Clone,
        F: FnMut(&ProgressReport),
    {
        let name = self.config.checkpoint_name.clone();
        let mut progress = store.load_progress(&name)?.unwrap_or_default();
        if progress.next_episode > 0 {
            log::info!(
                "resuming '{}' at episode {} ({})",
                name,
                progress.next_episode,
                progress.tally
            );
        }

        let mut recent = EpisodeLog::default();
        for episode in progress.next_episode..episodes {
            let learner = self.config.learner_side(episode);
            let result = self.run_episode(agent, learner_deck, opponent_deck, learner)?;
            log::trace!(
                "episode {}: {} as {} in {} turns, reward {:.2}",
                episode,
                result.outcome,
                learner,
                result.turns,
                result.total_reward
            );

            recent.record(&result);
            progress.tally.record(result.outcome);
            progress.next_episode = episode + 1;
            store.save_progress(&name, &progress)?;

            let done = progress.next_episode;
            if self.config.report_every > 0 && done % self.config.report_every == 0 {
                let report = recent.report(&progress, agent);
                log::info!("{report}");
                on_progress(&report);
            }
            if self.config.save_every > 0 && done % self.config.save_every == 0 {
                agent.save(store, &name)?;
            }
        }

        agent.save(store, &name)?;
        log::info!("finished '{}': {}", name, progress.tally);
        Ok(progress)
    }

    /// Keep a legal pick; otherwise substitute a random legal action.
    fn legalize(
        &mut self,
        index: usize,
        state: &GameState,
        side: Side,
    ) -> Result<(usize, Action, bool), TrainingError> {
        if let Ok(action) = Action::decode(index) {
            if ActionSpace::is_legal(&action, state, side) {
                return Ok((index, action, false));
            }
        }
        let fallback = self.random_legal(state, side);
        let action = Action::decode(fallback).map_err(SimulationError::from)?;
        Ok((fallback, action, true))
    }

    fn random_legal(&mut self, state: &GameState, side: Side) -> usize {
        let legal = ActionSpace::legal_actions(state, side);
        self.rng.choose(&legal).copied().unwrap_or(END_TURN_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ACTION_SPACE_SIZE;
    use crate::games::skirmish::{Archetype, Skirmish};
    use crate::nn::{TabularQ, STATE_SIZE};
    use crate::training::agent::AgentConfig;
    use tempfile::TempDir;

    fn agent(config: AgentConfig) -> DqnAgent<TabularQ> {
        DqnAgent::new(TabularQ::zeros(STATE_SIZE, ACTION_SPACE_SIZE), config)
    }

    fn trainer(config: TrainerConfig) -> Trainer<Skirmish> {
        Trainer::new(Skirmish::new(3), config, RewardConfig::default())
    }

    #[test]
    fn test_episode_stores_one_transition_per_learner_decision() {
        let mut agent = agent(AgentConfig::default().with_min_experiences(usize::MAX));
        let mut trainer = trainer(TrainerConfig::default());
        let deck = Archetype::Aggro.deck();

        let result = trainer
            .run_episode(&mut agent, &deck, &deck, Side::First)
            .unwrap();

        assert!(result.decisions > 0);
        assert_eq!(agent.buffer().len(), result.decisions as usize);
        assert_eq!(agent.episodes(), 1);
        assert!(result.illegal_actions <= result.decisions);
    }

    #[test]
    fn test_last_stored_transition_is_terminal() {
        let mut agent = agent(AgentConfig::default().with_min_experiences(usize::MAX));
        let mut trainer = trainer(TrainerConfig::default().with_opponent(OpponentMode::Random));
        let deck = Archetype::Midrange.deck();

        trainer
            .run_episode(&mut agent, &deck, &deck, Side::Second)
            .unwrap();

        let stored: Vec<_> = agent.buffer().iter_chronological().collect();
        let last = stored.last().unwrap();
        assert!(last.done);
        assert!(stored[..stored.len() - 1].iter().all(|t| !t.done));
    }

    #[test]
    fn test_turn_ceiling_scores_draw() {
        let mut agent = agent(AgentConfig::default().with_min_experiences(usize::MAX));
        let mut trainer = trainer(TrainerConfig::default().with_max_turns(2));
        let deck = Archetype::Control.deck();

        let result = trainer
            .run_episode(&mut agent, &deck, &deck, Side::First)
            .unwrap();
        assert_eq!(result.outcome, Outcome::Draw);
        assert_eq!(result.turns, 3);
    }

    #[test]
    fn test_greedy_illegal_pick_uses_fallback() {
        // A zero table always picks index 0, which never ends the turn, so
        // every learner turn ends through at least one substitution.
        let mut agent = agent(
            AgentConfig::default()
                .with_epsilon(0.0, 0.0)
                .with_min_experiences(usize::MAX),
        );
        let mut trainer = trainer(TrainerConfig::default().with_max_turns(20));
        let deck = Archetype::Aggro.deck();

        let result = trainer
            .run_episode(&mut agent, &deck, &deck, Side::First)
            .unwrap();
        assert!(result.illegal_actions > 0);
        assert!(!result.stalled);
        assert_eq!(agent.buffer().len(), result.decisions as usize);
    }

    #[test]
    fn test_evaluate_leaves_epsilon_and_buffer() {
        let mut agent = agent(AgentConfig::default());
        let mut trainer = trainer(TrainerConfig::default().with_max_turns(10));
        let deck = Archetype::Aggro.deck();

        trainer.evaluate(&mut agent, &deck, &deck, 3).unwrap();
        assert_eq!(agent.epsilon(), 1.0);
        assert!(agent.buffer().is_empty());
        assert_eq!(agent.train_steps(), 0);
    }

    #[test]
    fn test_train_persists_progress_and_resumes() {
        let tmp = TempDir::new().unwrap();
        let store = CheckpointStore::new(tmp.path());
        let deck = Archetype::Aggro.deck();
        let config = TrainerConfig::default()
            .with_max_turns(12)
            .with_report_every(2)
            .with_checkpoint_name("unit");

        let mut agent = agent(AgentConfig::default().with_min_experiences(8).with_batch_size(4));
        let mut reports = Vec::new();
        let progress = trainer(config.clone())
            .train(&mut agent, &store, &deck, &deck, 4, |r| reports.push(r.episodes))
            .unwrap();
        assert_eq!(progress.next_episode, 4);
        assert_eq!(progress.tally.total(), 4);
        assert_eq!(reports, vec![2, 4]);
        assert!(store.exists("unit"));

        let progress = trainer(config)
            .train(&mut agent, &store, &deck, &deck, 6, |_| {})
            .unwrap();
        assert_eq!(progress.next_episode, 6);
        assert_eq!(progress.tally.total(), 6);
    }

    #[test]
    fn test_learner_side_alternates() {
        let config = TrainerConfig::default();
        assert_eq!(config.learner_side(0), Side::First);
        assert_eq!(config.learner_side(1), Side::Second);
        let fixed = config.with_alternate_sides(false);
        assert_eq!(fixed.learner_side(1), Side::First);
    }

    #[test]
    fn test_opponent_mode_names() {
        assert_eq!(OpponentMode::from_name("random"), Some(OpponentMode::Random));
        assert_eq!(OpponentMode::from_name("self-play"), Some(OpponentMode::SelfPlay));
        assert_eq!(OpponentMode::from_name("mcts"), None);
        assert_eq!(OpponentMode::SelfPlay.to_string(), "selfplay");
    }
}
