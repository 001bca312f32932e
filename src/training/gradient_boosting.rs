//! Gradient boosted regression trees
//!
//! Squared-error boosting: every stage fits a shallow tree to the current
//! residuals and adds a shrunken copy of its output to the ensemble.
//! Optional row and column subsampling make it stochastic gradient boosting.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::DecisionTree;
use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{BenchError, Result};

/// Gradient boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to each stage
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn without replacement per stage
    pub subsample: f64,
    /// Fraction of columns drawn per stage
    pub colsample_bytree: f64,
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

impl GradientBoostingConfig {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(BenchError::invalid_param("n_estimators", 0, "must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(BenchError::invalid_param(
                "learning_rate",
                self.learning_rate,
                "must be positive",
            ));
        }
        for (name, value) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(BenchError::invalid_param(name, value, "must be in (0, 1]"));
            }
        }
        Ok(())
    }
}

/// Gradient boosting regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
            feature_importances: None,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }

    /// Sorted random subset holding `ceil(n * fraction)` of `0..n`
    fn sample_indices(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        if fraction >= 1.0 {
            return (0..n).collect();
        }
        let size = ((n as f64) * fraction).ceil().max(1.0) as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(size);
        indices.sort_unstable();
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        self.n_features = n_features;
        self.trees.clear();
        self.col_indices_per_tree.clear();

        self.initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut importances = Array1::<f64>::zeros(n_features);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let row_indices = Self::sample_indices(n_samples, self.config.subsample, &mut rng);
            let col_indices = Self::sample_indices(n_features, self.config.colsample_bytree, &mut rng);

            let x_cols = x.select(Axis(1), &col_indices);
            let x_sub = x_cols.select(Axis(0), &row_indices);
            let r_sub = residuals.select(Axis(0), &row_indices);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_sub, &r_sub)?;

            // Every row moves, including the ones left out of this stage's sample
            let stage = tree.predict(&x_cols)?;
            predictions.scaled_add(self.config.learning_rate, &stage);

            if let Some(tree_importance) = tree.importances() {
                for (j, &col_idx) in col_indices.iter().enumerate() {
                    importances[col_idx] += tree_importance[j];
                }
            }

            self.trees.push(tree);
            self.col_indices_per_tree.push(col_indices);
        }

        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }
        self.feature_importances = Some(importances);

        debug!(stages = self.trees.len(), "Gradient boosting fitted");
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(BenchError::ModelNotFitted);
        }
        check_predict_input(x, self.n_features)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, col_indices) in self.trees.iter().zip(&self.col_indices_per_tree) {
            let x_sub = x.select(Axis(1), col_indices);
            predictions.scaled_add(self.config.learning_rate, &tree.predict(&x_sub)?);
        }

        Ok(predictions)
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

    fn make_regression_data() -> (Array2<f64>, Array1<f64>) {
        let n = 100;
        let x = Array2::from_shape_fn((n, 3), |(i, j)| (i * (j + 1)) as f64 / n as f64);
        let y = Array1::from_shape_fn(n, |i| {
            let row = x.row(i);
            2.0 * row[0] + 3.0 * row[1] - row[2] + 0.1
        });
        (x, y)
    }

    #[test]
    fn test_gb_regressor_fits() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            n_estimators: 50,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_stages(), 50);

        let preds = model.predict(&x).unwrap();
        let mse: f64 = (&preds - &y).mapv(|v| v * v).mean().unwrap();
        let var = y.var(0.0);
        assert!(mse < 0.05 * var, "mse {} vs variance {}", mse, var);
    }

    #[test]
    fn test_subsampling_is_seeded() {
        let (x, y) = make_regression_data();
        let config = GradientBoostingConfig {
            n_estimators: 20,
            subsample: 0.7,
            colsample_bytree: 0.67,
            random_state: Some(5),
            ..Default::default()
        };

        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = make_regression_data();
        let mut model = GradientBoostingRegressor::default();
        model.fit(&x, &y).unwrap();

        let imp = model.feature_importances().unwrap();
        assert_eq!(imp.len(), 3);
        assert!((imp.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            learning_rate: 0.0,
            ..Default::default()
        });
        let result = model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]);
        assert!(matches!(result, Err(BenchError::InvalidParameter { .. })));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = GradientBoostingRegressor::default();
        assert!(matches!(model.predict(&array![[1.0]]), Err(BenchError::ModelNotFitted)));
    }
}
