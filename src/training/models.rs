//! Model capability trait and the closed set of candidate estimators

use super::decision_tree::DecisionTree;
use super::gradient_boosting::GradientBoostingRegressor;
use super::linear_models::LinearRegression;
use super::random_forest::RandomForest;
use super::svm::SVMRegressor;
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared fit/predict surface of every regression model
pub trait Regressor {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Per-feature importance weights aligned with the training columns,
    /// for models that expose them
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    fn is_fitted(&self) -> bool;
}

/// Validate a training pair before any model touches it
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(BenchError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(BenchError::ValidationError(format!(
            "cannot fit on an empty {}x{} matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(BenchError::ValidationError(
            "training data contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Validate the prediction input width against the fitted width
pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(BenchError::ShapeMismatch {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Algorithm family of an estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Linear,
    DecisionTree,
    RandomForest,
    Svr,
    GradientBoosting,
}

impl ModelKind {
    /// Whether this family exposes per-feature importance weights
    pub fn has_importances(&self) -> bool {
        matches!(self, ModelKind::RandomForest | ModelKind::GradientBoosting)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelKind::Linear => "linear",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::RandomForest => "random_forest",
            ModelKind::Svr => "svr",
            ModelKind::GradientBoosting => "gradient_boosting",
        };
        f.write_str(s)
    }
}

/// A regression estimator from the fixed candidate set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    Linear(LinearRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    Svr(SVMRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Estimator {
    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::Linear(_) => ModelKind::Linear,
            Estimator::DecisionTree(_) => ModelKind::DecisionTree,
            Estimator::RandomForest(_) => ModelKind::RandomForest,
            Estimator::Svr(_) => ModelKind::Svr,
            Estimator::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::Linear(m) => m.fit(x, y),
            Estimator::DecisionTree(m) => m.fit(x, y),
            Estimator::RandomForest(m) => m.fit(x, y),
            Estimator::Svr(m) => m.fit(x, y),
            Estimator::GradientBoosting(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::Linear(m) => m.predict(x),
            Estimator::DecisionTree(m) => m.predict(x),
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::Svr(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
        }
    }

    /// Only the ensemble models report importances; a single tree could but
    /// is not part of the importance contract.
    fn feature_importances(&self) -> Option<Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.feature_importances(),
            Estimator::GradientBoosting(m) => m.feature_importances(),
            Estimator::Linear(_) | Estimator::DecisionTree(_) | Estimator::Svr(_) => None,
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Estimator::Linear(m) => m.is_fitted(),
            Estimator::DecisionTree(m) => m.is_fitted(),
            Estimator::RandomForest(m) => m.is_fitted(),
            Estimator::Svr(m) => m.is_fitted(),
            Estimator::GradientBoosting(m) => m.is_fitted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_check_fit_input() {
        let x = array![[1.0], [2.0]];
        assert!(check_fit_input(&x, &array![1.0, 2.0]).is_ok());
        assert!(matches!(
            check_fit_input(&x, &array![1.0]),
            Err(BenchError::ShapeMismatch { .. })
        ));
        assert!(check_fit_input(&array![[f64::NAN], [2.0]], &array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_importance_capability() {
        assert!(ModelKind::RandomForest.has_importances());
        assert!(ModelKind::GradientBoosting.has_importances());
        assert!(!ModelKind::DecisionTree.has_importances());
        assert!(!ModelKind::Linear.has_importances());
    }

    #[test]
    fn test_linear_estimator_has_no_importances() {
        let x = array![[1.0, 0.5], [2.0, 0.1], [3.0, 0.9], [4.0, 0.3]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut est = Estimator::Linear(LinearRegression::new());
        est.fit(&x, &y).unwrap();
        assert!(est.is_fitted());
        assert!(est.feature_importances().is_none());
        assert_eq!(est.kind(), ModelKind::Linear);
    }
}
