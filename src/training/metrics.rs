//! Regression error metrics

use crate::error::{BenchError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Error metrics of one set of predictions against the actual values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute MAE, MSE, RMSE and R² from the same prediction/actual pair.
    ///
    /// R² uses the mean of `y_true` as the baseline. When `y_true` is constant
    /// R² is 1.0 for an exact prediction and 0.0 otherwise. Non-finite
    /// predictions are rejected.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(BenchError::ValidationError(
                "cannot score an empty prediction set".to_string(),
            ));
        }
        if let Some(pos) = y_pred.iter().position(|p| !p.is_finite()) {
            return Err(BenchError::ComputationError(format!(
                "prediction {} is not finite ({})",
                pos, y_pred[pos]
            )));
        }

        let n = y_true.len() as f64;
        let errors = y_true - y_pred;

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();

        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2,
            n_samples: y_true.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_known_values() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();

        assert!((m.mae - 0.5).abs() < 1e-12);
        assert!((m.mse - 0.375).abs() < 1e-12);
        assert_eq!(m.rmse, m.mse.sqrt());
        // Matches the reference value 0.9486...
        assert!((m.r2 - 0.948_608_137_044_967_9).abs() < 1e-12);
        assert_eq!(m.n_samples, 4);
    }

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.mae, 0.0);
    }

    #[test]
    fn test_constant_target() {
        let y = array![4.0, 4.0, 4.0];
        let exact = RegressionMetrics::compute(&y, &array![4.0, 4.0, 4.0]).unwrap();
        assert_eq!(exact.r2, 1.0);

        let off = RegressionMetrics::compute(&y, &array![4.0, 5.0, 4.0]).unwrap();
        assert_eq!(off.r2, 0.0);
    }

    #[test]
    fn test_mean_prediction_scores_zero() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &array![2.0, 2.0, 2.0]).unwrap();
        assert!(m.r2.abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_prediction_rejected() {
        let result = RegressionMetrics::compute(&array![1.0, 2.0], &array![1.0, f64::NAN]);
        assert!(matches!(result, Err(BenchError::ComputationError(_))));
    }

    #[test]
    fn test_length_mismatch() {
        let result = RegressionMetrics::compute(&array![1.0, 2.0], &array![1.0]);
        assert!(matches!(result, Err(BenchError::ShapeMismatch { .. })));
    }
}
