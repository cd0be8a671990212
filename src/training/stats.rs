use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::rules::Outcome;

/// Default window length for rolling statistics.
pub const WINDOW: usize = 100;

/// Bounded window of recent values; the oldest is evicted past capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollingWindow {
    values: VecDeque<f32>,
    capacity: usize,
}

impl RollingWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        RollingWindow {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(WINDOW)
    }

    pub fn push(&mut self, value: f32) {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Mean of the window, 0 when empty.
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Telemetry snapshot of an agent. Derived data only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub epsilon: f64,
    /// Mean loss over the last 100 training steps.
    pub avg_loss: f32,
    /// Mean episode reward over the last 100 finished episodes.
    pub avg_reward: f32,
    /// Lifetime wins / games.
    pub win_rate: f32,
    pub buffer_len: usize,
    pub buffer_capacity: usize,
    pub train_steps: u64,
    pub episodes: u64,
}

impl std::fmt::Display for TrainingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "eps={:.3} loss={:.4} reward={:.2} win_rate={:.1}% buffer={}/{} steps={}",
            self.epsilon,
            self.avg_loss,
            self.avg_reward,
            self.win_rate * 100.0,
            self.buffer_len,
            self.buffer_capacity,
            self.train_steps,
        )
    }
}

/// Cumulative win/loss/draw counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.draws
    }

    /// Wins over all games, 0 when none were played.
    #[must_use]
    pub fn win_rate(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => self.wins as f32 / total as f32,
        }
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}W/{}L/{}D", self.wins, self.losses, self.draws)
    }
}
