//! Experience replay buffer.
//!
//! A fixed-capacity circular buffer of transitions. While below capacity new
//! transitions are appended; once full, each insert overwrites the oldest
//! entry at a cursor that wraps around.
//!
//! ```
//! use ccg_learner::core::GameRng;
//! use ccg_learner::nn::EncodedState;
//! use ccg_learner::training::{ReplayBuffer, Transition};
//!
//! let mut buffer = ReplayBuffer::new(2);
//! for reward in [1.0, 2.0, 3.0] {
//!     let s = EncodedState::zeros(vec![1]);
//!     buffer.add(Transition::new(s.clone(), 0, reward, s, false));
//! }
//!
//! let rewards: Vec<f32> = buffer.iter_chronological().map(|t| t.reward).collect();
//! assert_eq!(rewards, vec![2.0, 3.0]);
//!
//! let batch = buffer.sample(8, &mut GameRng::new(0)).unwrap();
//! assert_eq!(batch.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::GameRng;
use crate::error::ReplayError;
use crate::nn::EncodedState;

/// One step of experience.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State before the action, encoded from the acting side.
    pub state: EncodedState,
    /// Action index taken.
    pub action: usize,
    pub reward: f32,
    /// State after the action, encoded from the same side.
    pub next_state: EncodedState,
    /// Did the episode end with this transition?
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: EncodedState,
        action: usize,
        reward: f32,
        next_state: EncodedState,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Bounded circular transition store with uniform sampling.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    items: Vec<Transition>,
    capacity: usize,
    /// Slot the next insert writes once the buffer is full.
    cursor: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Vec::with_capacity(capacity.min(4096)),
            capacity,
            cursor: 0,
        }
    }

    /// Insert a transition, evicting the oldest one if full.
    pub fn add(&mut self, transition: Transition) {
        if self.items.len() < self.capacity {
            self.items.push(transition);
        } else {
            self.items[self.cursor] = transition;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Sample `min(batch_size, len)` distinct transitions uniformly.
    ///
    /// Partial Fisher-Yates over the slot indices: no transition appears twice
    /// in one batch.
    pub fn sample(
        &self,
        batch_size: usize,
        rng: &mut GameRng,
    ) -> Result<Vec<&Transition>, ReplayError> {
        if self.items.is_empty() {
            return Err(ReplayError::EmptyBuffer);
        }

        let n = self.items.len();
        let limit = batch_size.min(n);
        let mut indices: Vec<usize> = (0..n).collect();
        for i in 0..limit {
            let j = i + rng.index(n - i);
            indices.swap(i, j);
        }

        Ok(indices[..limit].iter().map(|&i| &self.items[i]).collect())
    }

    /// Are there at least `min` transitions?
    #[must_use]
    pub fn can_sample(&self, min: usize) -> bool {
        self.items.len() >= min
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.is_full() { self.cursor } else { 0 };
        let (older, newer) = self.items.split_at(split);
        newer.iter().chain(older.iter())
    }

    /// Remove everything, keeping the capacity.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// The most recent `keep` transitions in chronological order.
    #[must_use]
    pub fn snapshot(&self, keep: usize) -> ReplaySnapshot {
        let skip = self.items.len().saturating_sub(keep);
        ReplaySnapshot {
            capacity: self.capacity,
            transitions: self.iter_chronological().skip(skip).cloned().collect(),
        }
    }

    /// Rebuild a buffer from a snapshot. If the snapshot holds more than its
    /// capacity, only the newest entries are kept.
    #[must_use]
    pub fn from_snapshot(snapshot: ReplaySnapshot) -> Self {
        let mut buffer = Self::new(snapshot.capacity);
        let skip = snapshot.transitions.len().saturating_sub(buffer.capacity);
        buffer.items = snapshot.transitions.into_iter().skip(skip).collect();
        buffer.cursor = buffer.items.len() % buffer.capacity;
        buffer
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Persisted slice of a replay buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplaySnapshot {
    pub capacity: usize,
    /// Oldest first.
    pub transitions: Vec<Transition>,
}
