//! Holdout split and error metrics

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices for a seeded random train/holdout split
#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub holdout: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and carve off a holdout fraction.
///
/// At least one row always stays in the training set; the holdout may be
/// empty for tiny inputs.
pub fn holdout_split(n: usize, fraction: f32, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let holdout_n = ((n as f32) * fraction).round() as usize;
    let holdout_n = holdout_n.min(n.saturating_sub(1));

    SplitIndices {
        holdout: indices[..holdout_n].to_vec(),
        train: indices[holdout_n..].to_vec(),
    }
}

/// Mean absolute error; zero for empty input
pub fn mean_absolute_error(predicted: &[f32], actual: &[f32]) -> f32 {
    if predicted.is_empty() {
        return 0.0;
    }
    let total: f32 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();
    total / predicted.len() as f32
}
