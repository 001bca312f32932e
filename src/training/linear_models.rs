//! Ordinary least squares regression

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve the symmetric system `A x = b` by Cholesky factorization.
///
/// A matrix that is not positive definite gets a small ridge on the diagonal
/// and one more attempt; `None` means that attempt failed too.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>, allow_ridge: bool) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    if !allow_ridge {
                        return None;
                    }
                    // An all-zero diagonal (every column constant) still gets a positive ridge
                    let ridge = (1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64)
                        .max(f64::EPSILON);
                    let mut a_reg = a.clone();
                    a_reg.diag_mut().mapv_inplace(|v| v + ridge);
                    return cholesky_solve(&a_reg, b, false);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inverse with partial pivoting, used when Cholesky fails
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    aug.slice_mut(ndarray::s![.., ..n]).assign(m);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| aug[[a, col]].abs().total_cmp(&aug[[b, col]].abs()))
            .unwrap_or(col);
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < 1e-10 {
            return None;
        }
        aug.row_mut(col).mapv_inplace(|v| v / pivot);

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Solve the normal equations `(X^T X) w = X^T y`
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    cholesky_solve(&xtx, &xty, true).or_else(|| matrix_inverse(&xtx).map(|inv| inv.dot(&xty)))
}

/// Linear regression fitted by ordinary least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients, one per feature
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub fit_intercept: bool,
    is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            is_fitted: false,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;

        // Centering absorbs the intercept
        let (x_work, y_work, means) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| BenchError::ComputationError("empty feature matrix".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);
            let xc = x - &x_mean.view().insert_axis(Axis(0));
            let yc = y - y_mean;
            (xc, yc, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        let coefficients = solve_least_squares(&x_work, &y_work).ok_or_else(|| {
            BenchError::ComputationError("normal equations are singular".to_string())
        })?;

        let intercept = match means {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(&x_mean),
            None => 0.0,
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => c,
            _ => return Err(BenchError::ModelNotFitted),
        };
        check_predict_input(x, coefficients.len())?;

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
