//! Seeded MLP regressor
//!
//! Wraps `ScoreNet` in the estimator contract: z-score feature normalization
//! and score normalization computed from the training split, full-batch Adam
//! on MSE, and a single holdout MAE as the validation signal.

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

use crate::model::estimator::{FeatureMatrix, FitReport, ScoreEstimator};
use crate::model::net::{ScoreNet, ScoreNetConfig};
use crate::model::validation::{holdout_split, mean_absolute_error};
use crate::{GridironError, ModelConfig, Result};

/// Per-column z-score parameters computed from the training split
#[derive(Debug, Clone)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    pub fn from_matrix(x: &FeatureMatrix) -> Self {
        let cols = x.cols();
        let mut sum = vec![0.0f32; cols];
        let mut sum_sq = vec![0.0f32; cols];

        for i in 0..x.rows() {
            for (j, v) in x.row(i).iter().enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = x.rows().max(1) as f32;
        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| ((sq / n - m * m).max(0.0).sqrt()).max(0.001))
            .collect();

        FeatureNormalization { mean, std }
    }

    /// Z-score normalize: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);
        (features - mean) / std
    }
}

/// Target normalization so the net trains on roughly unit-scale scores
#[derive(Debug, Clone, Copy)]
pub struct ScoreNormalization {
    pub mean: f32,
    pub std: f32,
}

impl ScoreNormalization {
    pub fn from_scores(scores: &[f32]) -> Self {
        let n = scores.len().max(1) as f32;
        let mean = scores.iter().sum::<f32>() / n;
        let var = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / n;
        ScoreNormalization {
            mean,
            std: var.sqrt().max(0.001),
        }
    }

    pub fn normalize(&self, score: f32) -> f32 {
        (score - self.mean) / self.std
    }

    pub fn denormalize(&self, normalized: f32) -> f32 {
        normalized * self.std + self.mean
    }
}

/// Trained state: network on the inference backend plus its normalizations
struct FittedState<B: AutodiffBackend> {
    net: ScoreNet<B::InnerBackend>,
    feature_norm: FeatureNormalization,
    score_norm: ScoreNormalization,
}

/// MLP score regressor with a fixed seed for reproducible fits
pub struct MlpRegressor<B: AutodiffBackend> {
    config: ModelConfig,
    device: B::Device,
    fitted: Option<FittedState<B>>,
}

impl<B: AutodiffBackend> MlpRegressor<B> {
    pub fn new(device: B::Device, config: ModelConfig) -> Self {
        MlpRegressor {
            config,
            device,
            fitted: None,
        }
    }

    fn tensor_2d<BX: Backend>(x: &FeatureMatrix, device: &BX::Device) -> Tensor<BX, 2> {
        Tensor::<BX, 1>::from_floats(x.as_slice(), device).reshape([x.rows(), x.cols()])
    }
}

impl<B: AutodiffBackend> ScoreEstimator for MlpRegressor<B> {
    fn fit(&mut self, x: &FeatureMatrix, y: &[f32]) -> Result<FitReport> {
        if x.rows() != y.len() {
            return Err(GridironError::Estimator(format!(
                "feature rows ({}) do not match targets ({})",
                x.rows(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(GridironError::Estimator(
                "cannot fit on an empty feature matrix".to_string(),
            ));
        }

        B::seed(self.config.seed);

        let split = holdout_split(x.rows(), self.config.holdout_fraction, self.config.seed);
        let x_train = x.select(&split.train);
        let y_train: Vec<f32> = split.train.iter().map(|&i| y[i]).collect();
        let x_holdout = x.select(&split.holdout);
        let y_holdout: Vec<f32> = split.holdout.iter().map(|&i| y[i]).collect();

        let feature_norm = FeatureNormalization::from_matrix(&x_train);
        let score_norm = ScoreNormalization::from_scores(&y_train);

        let net_config = ScoreNetConfig {
            input_dim: x.cols(),
            hidden_dims: self.config.hidden_dims.clone(),
            ..ScoreNetConfig::default()
        };
        let mut net = ScoreNet::<B>::new(&self.device, &net_config);
        let mut optimizer = AdamConfig::new().init();

        let features = feature_norm.normalize(Self::tensor_2d::<B>(&x_train, &self.device));
        let target_vec: Vec<f32> = y_train.iter().map(|s| score_norm.normalize(*s)).collect();
        let targets = Tensor::<B, 1>::from_floats(target_vec.as_slice(), &self.device)
            .reshape([y_train.len(), 1]);

        log::info!(
            "Training score regressor: {} rows, {} features, {} epochs",
            x_train.rows(),
            x_train.cols(),
            self.config.epochs
        );

        for epoch in 0..self.config.epochs {
            let preds = net.forward(features.clone());
            let loss = (preds - targets.clone()).powf_scalar(2.0).mean();

            if epoch % 50 == 0 || epoch + 1 == self.config.epochs {
                let loss_val: f32 = loss.clone().into_scalar().elem();
                log::debug!(
                    "Epoch {}/{}: mse={:.4}",
                    epoch + 1,
                    self.config.epochs,
                    loss_val
                );
            }

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &net);
            net = optimizer.step(self.config.learning_rate, net, grads_params);
        }

        self.fitted = Some(FittedState {
            net: net.valid(),
            feature_norm,
            score_norm,
        });

        let holdout_mae = if y_holdout.is_empty() {
            log::warn!("No holdout rows; MAE not measured");
            0.0
        } else {
            let preds = self.predict(&x_holdout)?;
            mean_absolute_error(&preds, &y_holdout)
        };

        Ok(FitReport {
            holdout_mae,
            train_rows: x_train.rows(),
            holdout_rows: y_holdout.len(),
        })
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f32>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| GridironError::Estimator("predict called before fit".to_string()))?;

        if x.is_empty() {
            return Ok(Vec::new());
        }
        if x.cols() != fitted.feature_norm.mean.len() {
            return Err(GridironError::Estimator(format!(
                "feature width {} does not match fitted width {}",
                x.cols(),
                fitted.feature_norm.mean.len()
            )));
        }

        let features = fitted
            .feature_norm
            .normalize(Self::tensor_2d::<B::InnerBackend>(x, &self.device));
        let preds = fitted.net.forward(features);
        let data = preds.into_data();
        let raw: &[f32] = data
            .as_slice()
            .map_err(|_| GridironError::Estimator("failed to read prediction tensor".to_string()))?;

        Ok(raw
            .iter()
            .map(|p| fitted.score_norm.denormalize(*p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn test_config() -> ModelConfig {
        ModelConfig {
            hidden_dims: vec![8],
            epochs: 25,
            learning_rate: 1e-2,
            seed: 42,
            holdout_fraction: 0.2,
        }
    }

    fn toy_data() -> (FeatureMatrix, Vec<f32>) {
        let mut x = FeatureMatrix::new(2);
        let mut y = Vec::new();
        for i in 0..20 {
            let a = i as f32;
            x.push_row(&[a, 40.0 - a]);
            y.push(14.0 + a);
        }
        (x, y)
    }

    #[test]
    fn test_fit_then_predict() {
        let (x, y) = toy_data();
        let mut regressor = MlpRegressor::<TestBackend>::new(Default::default(), test_config());

        let report = regressor.fit(&x, &y).unwrap();
        assert_eq!(report.train_rows + report.holdout_rows, 20);
        assert!(report.holdout_mae.is_finite());

        let preds = regressor.predict(&x).unwrap();
        assert_eq!(preds.len(), 20);
        assert!(preds.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let regressor = MlpRegressor::<TestBackend>::new(Default::default(), test_config());
        let mut x = FeatureMatrix::new(2);
        x.push_row(&[1.0, 2.0]);
        assert!(regressor.predict(&x).is_err());
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = toy_data();

        let mut a = MlpRegressor::<TestBackend>::new(Default::default(), test_config());
        a.fit(&x, &y).unwrap();
        let preds_a = a.predict(&x).unwrap();

        let mut b = MlpRegressor::<TestBackend>::new(Default::default(), test_config());
        b.fit(&x, &y).unwrap();
        let preds_b = b.predict(&x).unwrap();

        assert_eq!(preds_a, preds_b);
    }

    #[test]
    fn test_width_mismatch_errors() {
        let (x, y) = toy_data();
        let mut regressor = MlpRegressor::<TestBackend>::new(Default::default(), test_config());
        regressor.fit(&x, &y).unwrap();

        let mut wide = FeatureMatrix::new(3);
        wide.push_row(&[1.0, 2.0, 3.0]);
        assert!(regressor.predict(&wide).is_err());
    }
}
