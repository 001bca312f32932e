//! Seeded train/test partitioning

use crate::data::{FeatureMatrix, TargetVector};
use crate::error::{BenchError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Disjoint train/test row partitions covering `0..n_samples` exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `0..n_samples` with a ChaCha8 generator seeded from `seed` and
    /// take the first `ceil(n_samples * test_fraction)` indices as the test
    /// partition. The test size is clamped so both partitions are non-empty.
    pub fn new(n_samples: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(BenchError::invalid_param(
                "test_fraction",
                test_fraction,
                "must be strictly between 0 and 1",
            ));
        }
        if n_samples < 2 {
            return Err(BenchError::DataError(format!(
                "need at least 2 rows to split, got {}",
                n_samples
            )));
        }

        let n_test = ((n_samples as f64 * test_fraction).ceil() as usize).clamp(1, n_samples - 1);

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train_indices = indices.split_off(n_test);
        Ok(Self {
            train_indices,
            test_indices: indices,
        })
    }

    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }

    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Feature and target partitions produced by [`train_test_split`]
#[derive(Debug, Clone)]
pub struct SplitData {
    pub train_features: FeatureMatrix,
    pub test_features: FeatureMatrix,
    pub train_target: TargetVector,
    pub test_target: TargetVector,
    pub split: TrainTestSplit,
}

/// Partition aligned features and target into train and test subsets
pub fn train_test_split(
    features: &FeatureMatrix,
    target: &TargetVector,
    test_fraction: f64,
    seed: u64,
) -> Result<SplitData> {
    if features.n_rows() != target.len() {
        return Err(BenchError::ShapeMismatch {
            expected: format!("target length = {}", features.n_rows()),
            actual: format!("target length = {}", target.len()),
        });
    }

    let split = TrainTestSplit::new(features.n_rows(), test_fraction, seed)?;

    Ok(SplitData {
        train_features: features.select_rows(split.train_indices()),
        test_features: features.select_rows(split.test_indices()),
        train_target: target.select(split.train_indices()),
        test_target: target.select(split.test_indices()),
        split,
    })
}
