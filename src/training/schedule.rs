//! Interleaved multi-matchup training.
//!
//! Every ordered pair of decks is a matchup. Training proceeds in rounds: each
//! round plays a small batch of episodes for every matchup in turn, so no
//! single matchup dominates a stretch of the replay buffer. Progress is
//! saved after every episode together with the position inside the current
//! round, so a resumed run continues with the first unplayed episode.

use serde::{Deserialize, Serialize};

use crate::core::Deck;
use crate::error::TrainingError;
use crate::games::skirmish::Archetype;
use crate::nn::QNetwork;
use crate::rules::Simulator;
use crate::training::agent::DqnAgent;
use crate::training::checkpoint::{CheckpointStore, TrainingProgress};
use crate::training::trainer::{EpisodeLog, ProgressReport, Trainer};

/// Learner deck against opponent deck.
#[derive(Clone, Debug, PartialEq)]
pub struct Matchup {
    pub learner: Deck,
    pub opponent: Deck,
}

impl Matchup {
    /// `"<learner>-vs-<opponent>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-vs-{}", self.learner.name, self.opponent.name)
    }
}

/// Every ordered pair of `decks`, mirror matches included.
#[must_use]
pub fn matchups(decks: &[Deck]) -> Vec<Matchup> {
    decks
        .iter()
        .flat_map(|learner| {
            decks.iter().map(move |opponent| Matchup {
                learner: learner.clone(),
                opponent: opponent.clone(),
            })
        })
        .collect()
}

/// Multi-matchup run parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total episodes per matchup.
    pub episodes_per_matchup: u64,
    pub decks: Vec<Archetype>,
    /// Episodes per matchup per round.
    pub batch_size: u64,
    /// Rounds between agent checkpoints.
    pub checkpoint_every_rounds: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            episodes_per_matchup: 1000,
            decks: Archetype::ALL.to_vec(),
            batch_size: 10,
            checkpoint_every_rounds: 5,
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn with_episodes_per_matchup(mut self, episodes: u64) -> Self {
        self.episodes_per_matchup = episodes;
        self
    }

    #[must_use]
    pub fn with_decks(mut self, decks: Vec<Archetype>) -> Self {
        self.decks = decks;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_checkpoint_every_rounds(mut self, rounds: u64) -> Self {
        self.checkpoint_every_rounds = rounds;
        self
    }

    /// Number of rounds needed to reach `episodes_per_matchup`.
    #[must_use]
    pub fn rounds(&self) -> u64 {
        let batch = self.batch_size.max(1);
        self.episodes_per_matchup.div_ceil(batch)
    }

    /// Episodes each matchup plays in `round`; the last round may be short.
    #[must_use]
    pub fn batch_for_round(&self, round: u64) -> u64 {
        let batch = self.batch_size.max(1);
        let played = round * batch;
        batch.min(self.episodes_per_matchup.saturating_sub(played))
    }
}

/// Train over every matchup of the configured decks.
pub fn run_training<S, N, F>(
    run: &RunConfig,
    trainer: &mut Trainer<S>,
    agent: &mut DqnAgent<N>,
    store: &CheckpointStore,
    on_progress: F,
) -> Result<TrainingProgress, TrainingError>
where
    S: Simulator,
    N: QNetwork + Clone,
    F: FnMut(&ProgressReport),
{
    let decks: Vec<Deck> = run.decks.iter().map(|a| a.deck()).collect();
    run_schedule(run, &matchups(&decks), trainer, agent, store, on_progress)
}

/// Train over an explicit matchup list.
///
/// Resumes from the saved position under the trainer's checkpoint name. On
/// error the agent and progress are saved best effort before the error is
/// returned.
pub fn run_schedule<S, N, F>(
    run: &RunConfig,
    matchups: &[Matchup],
    trainer: &mut Trainer<S>,
    agent: &mut DqnAgent<N>,
    store: &CheckpointStore,
    mut on_progress: F,
) -> Result<TrainingProgress, TrainingError>
where
    S: Simulator,
    N: QNetwork + Clone,
    F: FnMut(&ProgressReport),
{
    let name = trainer.config().checkpoint_name.clone();
    let mut progress = store.load_progress(&name)?.unwrap_or_default();
    match schedule_inner(run, matchups, trainer, agent, store, &name, &mut progress, &mut on_progress) {
        Ok(()) => Ok(progress),
        Err(err) => {
            log::error!("scheduled training failed: {err}; saving '{name}' before exiting");
            if let Err(save_err) = agent.save(store, &name) {
                log::error!("emergency save of '{name}' failed: {save_err}");
            }
            if let Err(save_err) = store.save_progress(&name, &progress) {
                log::error!("emergency progress save of '{name}' failed: {save_err}");
            }
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn schedule_inner<S, N, F>(
    run: &RunConfig,
    matchups: &[Matchup],
    trainer: &mut Trainer<S>,
    agent: &mut DqnAgent<N>,
    store: &CheckpointStore,
    name: &str,
    progress: &mut TrainingProgress,
    on_progress: &mut F,
) -> Result<(), TrainingError>
where
    S: Simulator,
    N: QNetwork + Clone,
    F: FnMut(&ProgressReport),
{
    let rounds = run.rounds();
    if progress.next_round > 0 || progress.round_episodes > 0 {
        log::info!(
            "resuming '{}' at round {}/{}, episode {} of the round ({})",
            name,
            progress.next_round,
            rounds,
            progress.round_episodes,
            progress.tally
        );
    }
    log::info!(
        "{} matchups, {} episodes each, batches of {}",
        matchups.len(),
        run.episodes_per_matchup,
        run.batch_size
    );

    let mut recent = EpisodeLog::default();
    for round in progress.next_round..rounds {
        let batch = run.batch_for_round(round);

        let mut position = 0u64;
        for matchup in matchups {
            let label = matchup.label();
            for _ in 0..batch {
                position += 1;
                if position <= progress.round_episodes {
                    continue;
                }
                let learner = trainer.config().learner_side(progress.next_episode);
                let result =
                    trainer.run_episode(agent, &matchup.learner, &matchup.opponent, learner)?;
                recent.record(&result);
                progress.tally.record(result.outcome);
                progress.matchups.entry(label.clone()).or_default().record(result.outcome);
                progress.next_episode += 1;
                progress.round_episodes = position;
                store.save_progress(name, progress)?;
            }
        }

        progress.next_round = round + 1;
        progress.round_episodes = 0;
        store.save_progress(name, progress)?;

        let report = recent.report(progress, agent);
        log::info!("round {}/{} | {}", round + 1, rounds, report);
        on_progress(&report);

        let every = run.checkpoint_every_rounds.max(1);
        if progress.next_round % every == 0 {
            agent.save(store, name)?;
        }
    }

    agent.save(store, name)?;
    store.save_progress(name, progress)?;

    let mut labels: Vec<_> = progress.matchups.iter().collect();
    labels.sort_by(|a, b| a.0.cmp(b.0));
    for (label, tally) in labels {
        log::info!("  {:<24} {} ({:.1}%)", label, tally, tally.win_rate() * 100.0);
    }
    Ok(())
}
