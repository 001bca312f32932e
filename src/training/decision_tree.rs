//! CART regression tree

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Nodes with fewer samples than this scan their features sequentially
const PARALLEL_SCAN_MIN_SAMPLES: usize = 512;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Best split found for one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree grown greedily on squared error.
///
/// Split search sorts each candidate feature once per node and sweeps
/// running sums, so a node costs `O(n log n)` per feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled per node; `None` considers all of them
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn validate(&self, n_samples: usize) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(BenchError::invalid_param(
                "min_samples_split",
                self.min_samples_split,
                "must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(BenchError::invalid_param("min_samples_leaf", 0, "must be at least 1"));
        }
        if self.max_features == Some(0) {
            return Err(BenchError::invalid_param("max_features", 0, "must be at least 1"));
        }
        if n_samples < self.min_samples_split {
            return Err(BenchError::ValidationError(format!(
                "need at least {} samples, got {}",
                self.min_samples_split, n_samples
            )));
        }
        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (mean, impurity) = node_stats(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON * mean.abs().max(1.0);

        if should_stop {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        let features = self.candidate_features(x.ncols(), rng);
        let best = match self.find_best_split(x, y, indices, &features, impurity) {
            Some(best) => best,
            None => return TreeNode::Leaf { value: mean, n_samples },
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn candidate_features(&self, n_features: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < n_features => {
                let mut chosen = sample(rng, n_features, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..n_features).collect(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let scan = |&feature_idx: &usize| {
            self.best_split_for_feature(x.column(feature_idx), y, indices, feature_idx, parent_impurity)
        };

        let candidates: Vec<SplitCandidate> = if indices.len() >= PARALLEL_SCAN_MIN_SAMPLES {
            features.par_iter().filter_map(scan).collect()
        } else {
            features.iter().filter_map(scan).collect()
        };

        // First feature wins ties so results do not depend on scan order
        candidates.into_iter().fold(None, |best: Option<SplitCandidate>, c| match best {
            Some(b) if b.gain >= c.gain => Some(b),
            _ => Some(c),
        })
    }

    fn best_split_for_feature(
        &self,
        column: ArrayView1<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (column[i], y[i])).collect();
        pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        // Centered targets keep the running sums well conditioned
        let shift = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
        pairs.iter_mut().for_each(|p| p.1 -= shift);
        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n - 1 {
            let (xi, yi) = pairs[i];
            left_sum += yi;
            left_sq += yi * yi;

            let next_x = pairs[i + 1].0;
            if xi == next_x {
                continue;
            }

            let left_count = i + 1;
            let right_count = n - left_count;
            if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                continue;
            }

            let left_impurity = variance(left_count, left_sum, left_sq);
            let right_impurity = variance(right_count, total_sum - left_sum, total_sq - left_sq);
            let weighted =
                (left_count as f64 * left_impurity + right_count as f64 * right_impurity) / n as f64;
            let gain = parent_impurity - weighted;

            if gain > best.map_or(0.0, |b| b.gain) {
                // Midpoint can round onto next_x for adjacent floats
                let mid = xi + (next_x - xi) / 2.0;
                let threshold = if mid < next_x { mid } else { xi };
                best = Some(SplitCandidate { feature_idx, threshold, gain });
            }
        }

        best
    }

    fn predict_row(node: &TreeNode, row: ArrayView1<f64>) -> f64 {
        let mut node = node;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Impurity-decrease importances normalized to sum to one
    pub fn importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Longest root-to-leaf path counted in splits
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.validate(x.nrows())?;

        let n_features = x.ncols();
        self.n_features = n_features;

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BenchError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;

        Ok(x.outer_iter().map(|row| Self::predict_row(root, row)).collect())
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

/// Mean and population variance of `y` over `indices`
fn node_stats(y: &Array1<f64>, indices: &[usize]) -> (f64, f64) {
    let n = indices.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;
    let var = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / n as f64;
    (mean, var)
}

fn variance(count: usize, sum: f64, sq_sum: f64) -> f64 {
    let n = count as f64;
    // Clamp the cancellation error of E[X^2] - E[X]^2
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let preds = tree.predict(&x).unwrap();
        assert_eq!(preds, y);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_threshold_between_values() {
        let x = array![[1.0], [3.0]];
        let y = array![0.0, 10.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let preds = tree.predict(&array![[1.9], [2.1]]).unwrap();
        assert_eq!(preds[0], 0.0);
        assert_eq!(preds[1], 10.0);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 0.0, 100.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();
        // The outlier cannot be isolated in its own leaf
        let preds = tree.predict(&array![[4.0]]).unwrap();
        assert!(preds[0] < 100.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 0.0]];
        let y = array![7.0, 7.0, 7.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 1);
        let imp = tree.importances().unwrap();
        assert!(imp.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_feature_importances_favor_signal() {
        let x = array![
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0],
            [4.0, 0.0],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_seeded_feature_sampling_is_deterministic() {
        let x = Array2::from_shape_fn((60, 4), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y = Array1::from_shape_fn(60, |i| (i % 7) as f64);

        let mut a = DecisionTree::new().with_max_features(2).with_random_state(9);
        let mut b = DecisionTree::new().with_max_features(2).with_random_state(9);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_too_few_samples() {
        let mut tree = DecisionTree::new().with_min_samples_split(10);
        let result = tree.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]);
        assert!(matches!(result, Err(BenchError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_min_samples_split() {
        let mut tree = DecisionTree::new().with_min_samples_split(1);
        let result = tree.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]);
        assert!(matches!(result, Err(BenchError::InvalidParameter { .. })));
    }
}
