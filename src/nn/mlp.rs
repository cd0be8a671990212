//! Baseline dense Q-network on `burn`.
//!
//! A fully-connected ReLU network trained with Adam on the clipped TD error.
//! Training runs on the autodiff `NdArray` backend; predictions go through
//! the inner backend via [`AutodiffModule::valid`].

use burn::backend::{Autodiff, NdArray};
use burn::module::{AutodiffModule, Param};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use serde::{Deserialize, Serialize};

use crate::core::{GameRng, ACTION_SPACE_SIZE};
use crate::error::NetworkError;
use crate::nn::encoder::STATE_SIZE;
use crate::nn::traits::{EncodedState, QNetwork, QTarget};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;
type AdamOptimizer =
    burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, QModel<TrainBackend>, TrainBackend>;

/// Configuration for [`MlpQNetwork`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    pub input_size: usize,
    pub hidden_layers: Vec<usize>,
    pub output_size: usize,
    pub learning_rate: f32,
    /// TD errors are clipped to `[-td_clip, td_clip]` before backprop.
    pub td_clip: f32,
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_size: STATE_SIZE,
            hidden_layers: vec![128, 64],
            output_size: ACTION_SPACE_SIZE,
            learning_rate: 1e-3,
            td_clip: 1.0,
            seed: 0,
        }
    }
}

impl MlpConfig {
    /// Set the hidden layer widths.
    #[must_use]
    pub fn with_hidden_layers(mut self, layers: Vec<usize>) -> Self {
        self.hidden_layers = layers;
        self
    }

    /// Set the Adam step size.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the initialisation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Input, hidden and output widths in order.
    fn widths(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.hidden_layers.len() + 2);
        widths.push(self.input_size);
        widths.extend_from_slice(&self.hidden_layers);
        widths.push(self.output_size);
        widths
    }
}

/// Stack of linear layers with ReLU between them.
#[derive(Module, Debug)]
struct QModel<B: Backend> {
    layers: Vec<Linear<B>>,
    relu: Relu,
}

impl<B: Backend> QModel<B> {
    /// `[batch, input] -> [batch, output]`.
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = input;
        for (index, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if index < last {
                x = self.relu.forward(x);
            }
        }
        x
    }
}

/// Replace a layer's weight (`[fan_in, fan_out]`, row-major) and bias.
fn assign<B: Backend>(layer: &mut Linear<B>, weights: Vec<f32>, biases: Vec<f32>, device: &B::Device) {
    let [fan_in, fan_out] = layer.weight.val().dims();
    let weight = Tensor::<B, 2>::from_data(TensorData::new(weights, [fan_in, fan_out]), device);
    let bias = Tensor::<B, 1>::from_data(TensorData::new(biases, [fan_out]), device);
    layer.weight = Param::from_tensor(weight);
    layer.bias = Some(Param::from_tensor(bias));
}

fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap_or_default()
}

/// Dense ReLU network mapping an encoded state to one value per action.
pub struct MlpQNetwork {
    model: QModel<TrainBackend>,
    optimizer: AdamOptimizer,
    device: <TrainBackend as Backend>::Device,
    config: MlpConfig,
}

impl MlpQNetwork {
    /// Build a freshly initialised network.
    ///
    /// Weights are Xavier-uniform from a [`GameRng`] seeded with
    /// `config.seed`, biases start at zero.
    pub fn new(config: &MlpConfig) -> Self {
        let device = Default::default();
        let mut rng = GameRng::new(config.seed);

        let layers = config
            .widths()
            .windows(2)
            .map(|pair| {
                let (fan_in, fan_out) = (pair[0], pair[1]);
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                let weights = (0..fan_in * fan_out)
                    .map(|_| rng.uniform_f32(-limit, limit))
                    .collect();
                let mut layer = LinearConfig::new(fan_in, fan_out).init(&device);
                assign(&mut layer, weights, vec![0.0; fan_out], &device);
                layer
            })
            .collect();

        Self {
            model: QModel {
                layers,
                relu: Relu::new(),
            },
            optimizer: AdamConfig::new().init(),
            device,
            config: config.clone(),
        }
    }

    /// Total number of weights and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.config
            .widths()
            .windows(2)
            .map(|pair| pair[0] * pair[1] + pair[1])
            .sum()
    }

    fn batch_tensor<B: Backend>(&self, inputs: &[&EncodedState], device: &B::Device) -> Tensor<B, 2> {
        let features = self.config.input_size;
        let flat: Vec<f32> = inputs
            .iter()
            .flat_map(|input| input.tensor.iter().copied())
            .collect();
        Tensor::from_data(TensorData::new(flat, [inputs.len(), features]), device)
    }
}

/// A clone shares the weights but starts with fresh Adam moments.
impl Clone for MlpQNetwork {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            optimizer: AdamConfig::new().init(),
            device: self.device.clone(),
            config: self.config.clone(),
        }
    }
}

impl std::fmt::Debug for MlpQNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpQNetwork")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QNetwork for MlpQNetwork {
    fn input_size(&self) -> usize {
        self.config.input_size
    }

    fn output_size(&self) -> usize {
        self.config.output_size
    }

    fn predict(&self, input: &EncodedState) -> Vec<f32> {
        self.predict_batch(&[input]).pop().unwrap_or_default()
    }

    fn predict_batch(&self, inputs: &[&EncodedState]) -> Vec<Vec<f32>> {
        if inputs.is_empty() {
            return Vec::new();
        }
        debug_assert!(inputs.iter().all(|input| input.len() == self.input_size()));
        let model = self.model.valid();
        let x = self.batch_tensor::<InferBackend>(inputs, &self.device);
        let q = to_vec(model.forward(x));
        q.chunks_exact(self.output_size().max(1))
            .map(<[f32]>::to_vec)
            .collect()
    }

    fn fit(&mut self, batch: &[QTarget<'_>]) -> f32 {
        if batch.is_empty() {
            return 0.0;
        }
        let rows = batch.len();
        let outputs = self.output_size();

        let inputs: Vec<&EncodedState> = batch.iter().map(|sample| sample.input).collect();
        let x = self.batch_tensor::<TrainBackend>(&inputs, &self.device);

        let mut mask = vec![0.0f32; rows * outputs];
        for (row, sample) in batch.iter().enumerate() {
            if sample.action < outputs {
                mask[row * outputs + sample.action] = 1.0;
            }
        }
        let mask = Tensor::<TrainBackend, 2>::from_data(TensorData::new(mask, [rows, outputs]), &self.device);
        let targets: Vec<f32> = batch.iter().map(|sample| sample.target).collect();
        let targets = Tensor::<TrainBackend, 1>::from_data(TensorData::new(targets, [rows]), &self.device);

        let taken = (self.model.forward(x) * mask).sum_dim(1).reshape([rows]);

        let errors = to_vec(taken.clone().detach() - targets.clone());
        let mse = errors.iter().map(|e| e * e).sum::<f32>() / rows as f32;

        // Regressing toward a target at most `td_clip` away clips the gradient.
        let clip = self.config.td_clip;
        let fixed = taken.clone().detach();
        let clipped = fixed.clone() + (targets - fixed).clamp(-clip, clip);
        let diff = taken - clipped;
        let loss = (diff.clone() * diff).mean();

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .optimizer
            .step(f64::from(self.config.learning_rate), self.model.clone(), grads);

        mse
    }

    fn parameters(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.parameter_count());
        for layer in &self.model.layers {
            flat.extend(to_vec(layer.weight.val()));
            if let Some(bias) = &layer.bias {
                flat.extend(to_vec(bias.val()));
            }
        }
        flat
    }

    fn load_parameters(&mut self, parameters: &[f32]) -> Result<(), NetworkError> {
        let expected = self.parameter_count();
        if parameters.len() != expected {
            return Err(NetworkError::ParameterCount {
                expected,
                actual: parameters.len(),
            });
        }
        let widths = self.config.widths();
        let mut rest = parameters;
        for (layer, pair) in self.model.layers.iter_mut().zip(widths.windows(2)) {
            let (weights, tail) = rest.split_at(pair[0] * pair[1]);
            let (biases, tail) = tail.split_at(pair[1]);
            assign(layer, weights.to_vec(), biases.to_vec(), &self.device);
            rest = tail;
        }
        Ok(())
    }
}
