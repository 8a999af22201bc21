//! MLP regression network
//!
//! Architecture: Input(24) → Hidden1 → ReLU → Dropout
//!                        → Hidden2 → ReLU → Dropout → score(1)

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::BaseStats;

/// Configuration for the score network
#[derive(Debug, Clone)]
pub struct ScoreNetConfig {
    /// Input dimension (base statistics + vs-opponent deltas)
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [64, 32] for two layers)
    pub hidden_dims: Vec<usize>,
    /// Dropout rate
    pub dropout: f64,
}

impl Default for ScoreNetConfig {
    fn default() -> Self {
        ScoreNetConfig {
            input_dim: BaseStats::DIM * 2,
            hidden_dims: vec![64, 32],
            dropout: 0.1,
        }
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Multi-layer perceptron with a single continuous score head
#[derive(Module, Debug)]
pub struct ScoreNet<B: Backend> {
    hidden1: HiddenBlock<B>,
    hidden2: Option<HiddenBlock<B>>,
    score_head: Linear<B>,
}

impl<B: Backend> ScoreNet<B> {
    pub fn new(device: &B::Device, config: &ScoreNetConfig) -> Self {
        let first_dim = config.hidden_dims.first().copied().unwrap_or(64);
        let hidden1 = HiddenBlock::new(device, config.input_dim, first_dim, config.dropout);

        let (hidden2, head_input_dim) = if config.hidden_dims.len() > 1 {
            let h2 = HiddenBlock::new(
                device,
                config.hidden_dims[0],
                config.hidden_dims[1],
                config.dropout,
            );
            (Some(h2), config.hidden_dims[1])
        } else {
            (None, first_dim)
        };

        ScoreNet {
            hidden1,
            hidden2,
            score_head: LinearConfig::new(head_input_dim, 1).init(device),
        }
    }

    /// Forward pass: features [batch, input_dim] → scores [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden1.forward(features);
        let x = if let Some(h2) = &self.hidden2 {
            h2.forward(x)
        } else {
            x
        };
        self.score_head.forward(x)
    }
}
