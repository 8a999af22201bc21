//! Estimator contract
//!
//! The pipeline only needs fit and predict; anything honoring this trait can
//! replace the bundled MLP (tests substitute a stub).

use crate::Result;

/// Row-major feature matrix with a fixed column count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    cols: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(cols: usize) -> Self {
        FeatureMatrix {
            cols,
            data: Vec::new(),
        }
    }

    /// Append one row. Panics if the row width does not match.
    pub fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.cols, "feature row width mismatch");
        self.data.extend_from_slice(row);
    }

    pub fn rows(&self) -> usize {
        if self.cols == 0 {
            0
        } else {
            self.data.len() / self.cols
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// New matrix holding the given rows, in order
    pub fn select(&self, indices: &[usize]) -> FeatureMatrix {
        let mut out = FeatureMatrix::new(self.cols);
        for &i in indices {
            out.push_row(self.row(i));
        }
        out
    }
}

/// Fit summary: the holdout MAE is the pipeline's only validation signal
#[derive(Debug, Clone, Copy)]
pub struct FitReport {
    pub holdout_mae: f32,
    pub train_rows: usize,
    pub holdout_rows: usize,
}

/// A trainable score regressor
pub trait ScoreEstimator {
    /// Train on historical (features, final score) pairs
    fn fit(&mut self, x: &FeatureMatrix, y: &[f32]) -> Result<FitReport>;

    /// Raw predicted score per feature row
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_rows() {
        let mut x = FeatureMatrix::new(2);
        x.push_row(&[1.0, 2.0]);
        x.push_row(&[3.0, 4.0]);

        assert_eq!(x.rows(), 2);
        assert_eq!(x.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_select() {
        let mut x = FeatureMatrix::new(1);
        for i in 0..5 {
            x.push_row(&[i as f32]);
        }
        let picked = x.select(&[4, 0]);
        assert_eq!(picked.rows(), 2);
        assert_eq!(picked.row(0), &[4.0]);
        assert_eq!(picked.row(1), &[0.0]);
    }

    #[test]
    #[should_panic]
    fn test_width_mismatch_panics() {
        let mut x = FeatureMatrix::new(2);
        x.push_row(&[1.0]);
    }
}
