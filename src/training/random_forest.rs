//! Random forest regression

use super::decision_tree::DecisionTree;
use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of features each split may consider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    /// Fraction of the feature count, rounded up
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    /// Resolve against a concrete feature count, never below one
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Bagged ensemble of regression trees averaged at prediction time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    /// Forest of `n_estimators` trees that consider every feature at each split
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
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

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn build_tree(&self, x: &Array2<f64>, y: &Array1<f64>, seed: u64, max_features: usize) -> Result<DecisionTree> {
        let n_samples = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut tree = DecisionTree::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(max_features)
            .with_random_state(rng.gen());
        if let Some(d) = self.max_depth {
            tree = tree.with_max_depth(d);
        }

        if self.bootstrap {
            let sample_indices: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let x_boot = x.select(Axis(0), &sample_indices);
            let y_boot = y.select(Axis(0), &sample_indices);
            tree.fit(&x_boot, &y_boot)?;
        } else {
            tree.fit(x, y)?;
        }

        Ok(tree)
    }

    /// Mean of the per-tree importances, renormalized
    fn compute_feature_importances(&self) -> Array1<f64> {
        let mut total = Array1::<f64>::zeros(self.n_features);
        for tree in &self.trees {
            if let Some(imp) = tree.importances() {
                total += imp;
            }
        }

        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        total
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.n_estimators == 0 {
            return Err(BenchError::invalid_param("n_estimators", 0, "must be at least 1"));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(BenchError::invalid_param("max_features", f, "fraction must be in (0, 1]"));
            }
        }

        self.n_features = x.ncols();
        let max_features = self.max_features.resolve(self.n_features);
        let base_seed = match self.random_state {
            Some(seed) => seed,
            None => rand::thread_rng().gen(),
        };

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| self.build_tree(x, y, base_seed.wrapping_add(tree_idx as u64), max_features))
            .collect::<Result<_>>()?;

        self.trees = trees;
        self.feature_importances = Some(self.compute_feature_importances());

        debug!(n_trees = self.trees.len(), max_features, "Random forest fitted");
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(BenchError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for preds in &per_tree {
            sum += preds;
        }
        Ok(sum / per_tree.len() as f64)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();
        assert_eq!(rf.n_trees(), 10);

        let predictions = rf.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 2.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let x = Array2::from_shape_fn((40, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = Array1::from_shape_fn(40, |i| (i % 5) as f64 * 1.5);

        let mut a = RandomForest::new(8).with_random_state(3).with_max_features(MaxFeatures::Sqrt);
        let mut b = RandomForest::new(8).with_random_state(3).with_max_features(MaxFeatures::Sqrt);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] >= importances[1]);
        assert!(importances.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let mut rf = RandomForest::new(0);
        let result = rf.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]);
        assert!(matches!(result, Err(BenchError::InvalidParameter { .. })));
        assert!(!rf.is_fitted());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 4);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5), 3);
        assert_eq!(MaxFeatures::Fixed(20).resolve(5), 5);
        assert_eq!(MaxFeatures::All.resolve(5), 5);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
    }
}
