//! Network traits for action-value prediction.
//!
//! These traits define the interface between the learner and whatever
//! function approximator estimates Q-values. The learner only needs a forward
//! pass, a fit toward supplied targets, and a flat parameter snapshot for
//! target-network sync and checkpointing.

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Encoded game state as a flat tensor for network input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor (`[features]` for flat encoders).
    pub shape: Vec<usize>,
}

impl EncodedState {
    /// Create a new encoded state.
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Create a zero-filled encoded state with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    /// Check if the tensor is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

/// One regression target: "Q(input, action) should be `target`".
#[derive(Clone, Copy, Debug)]
pub struct QTarget<'a> {
    pub input: &'a EncodedState,
    pub action: usize,
    pub target: f32,
}

/// Action-value network.
///
/// Given an encoded state, returns one value estimate per action index.
///
/// ## Implementation Notes
///
/// - `predict` output length equals `output_size()`
/// - `fit` only moves the estimate for each target's own action
/// - `parameters` / `load_parameters` round-trip exactly; two networks with
///   the same parameters produce the same predictions
pub trait QNetwork {
    /// Input feature count.
    fn input_size(&self) -> usize;

    /// Number of action values produced.
    fn output_size(&self) -> usize;

    /// Predict action values for a state.
    fn predict(&self, input: &EncodedState) -> Vec<f32>;

    /// Batch prediction for multiple states (optional optimization).
    fn predict_batch(&self, inputs: &[&EncodedState]) -> Vec<Vec<f32>> {
        inputs.iter().map(|input| self.predict(input)).collect()
    }

    /// Take one optimisation step toward `batch`. Returns the mean squared
    /// error measured before the step.
    fn fit(&mut self, batch: &[QTarget<'_>]) -> f32;

    /// Flat parameter snapshot.
    fn parameters(&self) -> Vec<f32>;

    /// Replace all parameters with a snapshot of the same length.
    fn load_parameters(&mut self, parameters: &[f32]) -> Result<(), NetworkError>;
}

/// Fixed per-action values (baseline for testing).
///
/// `fit` nudges the value of each target's action toward the target by
/// `step`, which is enough to observe learning and sync in tests without a
/// real network.
#[derive(Clone, Debug, PartialEq)]
pub struct TabularQ {
    input_size: usize,
    values: Vec<f32>,
    step: f32,
}

impl TabularQ {
    /// Create a baseline producing `values` for every state.
    pub fn new(input_size: usize, values: Vec<f32>) -> Self {
        Self {
            input_size,
            values,
            step: 0.5,
        }
    }

    /// All-zero values.
    pub fn zeros(input_size: usize, output_size: usize) -> Self {
        Self::new(input_size, vec![0.0; output_size])
    }

    /// Set the fraction of the error removed by each `fit`.
    #[must_use]
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }
}

impl QNetwork for TabularQ {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.values.len()
    }

    fn predict(&self, _input: &EncodedState) -> Vec<f32> {
        self.values.clone()
    }

    fn fit(&mut self, batch: &[QTarget<'_>]) -> f32 {
        if batch.is_empty() {
            return 0.0;
        }
        let mut loss = 0.0;
        for sample in batch {
            if let Some(value) = self.values.get_mut(sample.action) {
                let error = sample.target - *value;
                loss += error * error;
                *value += self.step * error;
            }
        }
        loss / batch.len() as f32
    }

    fn parameters(&self) -> Vec<f32> {
        self.values.clone()
    }

    fn load_parameters(&mut self, parameters: &[f32]) -> Result<(), NetworkError> {
        if parameters.len() != self.values.len() {
            return Err(NetworkError::ParameterCount {
                expected: self.values.len(),
                actual: parameters.len(),
            });
        }
        self.values.copy_from_slice(parameters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_state_new() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        assert_eq!(state.len(), 4);
        assert_eq!(state.shape, vec![2, 2]);
        assert_eq!(state.tensor[3], 4.0);
    }

    #[test]
    fn test_encoded_state_zeros() {
        let state = EncodedState::zeros(vec![3, 4]);
        assert_eq!(state.len(), 12);
        assert!(state.tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_tabular_predict_ignores_input() {
        let network = TabularQ::new(4, vec![0.1, 0.7, 0.2]);
        let a = EncodedState::zeros(vec![4]);
        let b = EncodedState::new(vec![1.0; 4], vec![4]);
        assert_eq!(network.predict(&a), network.predict(&b));
        assert_eq!(network.output_size(), 3);
    }

    #[test]
    fn test_tabular_fit_moves_toward_target() {
        let mut network = TabularQ::zeros(2, 3).with_step(0.5);
        let input = EncodedState::zeros(vec![2]);
        let loss = network.fit(&[QTarget {
            input: &input,
            action: 1,
            target: 2.0,
        }]);

        assert_eq!(loss, 4.0);
        assert_eq!(network.predict(&input), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_tabular_parameter_round_trip() {
        let source = TabularQ::new(2, vec![1.0, -1.0]);
        let mut copy = TabularQ::zeros(2, 2);
        copy.load_parameters(&source.parameters()).unwrap();
        assert_eq!(copy, source);

        assert_eq!(
            copy.load_parameters(&[1.0]),
            Err(NetworkError::ParameterCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_predict_batch() {
        let network = TabularQ::new(1, vec![3.0]);
        let input = EncodedState::zeros(vec![1]);
        let batch = network.predict_batch(&[&input, &input]);
        assert_eq!(batch, vec![vec![3.0], vec![3.0]]);
    }

    #[test]
    fn test_serialization() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0], vec![3]);
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: EncodedState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
