//! Epsilon-insensitive support vector regression
//!
//! The dual is solved by cyclic coordinate descent over the signed
//! coefficients `beta_i = alpha_i - alpha_i*` in `[-C, C]`. The bias is
//! absorbed into the kernel (`K' = K + 1`), which removes the equality
//! constraint and lets every coordinate update in closed form.

use super::models::{check_fit_input, check_predict_input, Regressor};
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kernel matrices are materialized eagerly, so training size is capped
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Below this many rows the kernel matrix is filled sequentially
const PARALLEL_KERNEL_MIN_SAMPLES: usize = 100;

/// Coefficients smaller than this do not make a support vector
const SUPPORT_THRESHOLD: f64 = 1e-8;

/// RBF bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, computed from the training matrix
    Scale,
    Value(f64),
}

/// Kernel function type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = exp(-γ ||x - y||²)
    RBF { gamma: Gamma },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::RBF { gamma: Gamma::Scale }
    }
}

/// SVR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Box constraint on each dual coefficient
    pub c: f64,
    pub kernel: KernelType,
    /// Half-width of the insensitive tube
    pub epsilon: f64,
    /// Stop once no coefficient moves by more than this in a sweep
    pub tol: f64,
    /// Maximum number of full sweeps
    pub max_iter: usize,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::default(),
            epsilon: 0.1,
            tol: 1e-3,
            max_iter: 500,
        }
    }
}

impl SVMConfig {
    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(BenchError::invalid_param("c", self.c, "must be positive"));
        }
        if !(self.epsilon >= 0.0 && self.epsilon.is_finite()) {
            return Err(BenchError::invalid_param("epsilon", self.epsilon, "must be non-negative"));
        }
        if self.max_iter == 0 {
            return Err(BenchError::invalid_param("max_iter", 0, "must be at least 1"));
        }
        if let KernelType::RBF { gamma: Gamma::Value(g) } = self.kernel {
            if !(g > 0.0 && g.is_finite()) {
                return Err(BenchError::invalid_param("gamma", g, "must be positive"));
            }
        }
        Ok(())
    }
}

/// Support vector regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMRegressor {
    config: SVMConfig,
    support_vectors: Option<Array2<f64>>,
    /// Signed dual coefficients of the support vectors
    dual_coef: Option<Array1<f64>>,
    bias: f64,
    /// Resolved RBF bandwidth; unused for the linear kernel
    gamma: f64,
    n_features: usize,
    n_iter: usize,
}

impl Default for SVMRegressor {
    fn default() -> Self {
        Self::new(SVMConfig::default())
    }
}

impl SVMRegressor {
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            dual_coef: None,
            bias: 0.0,
            gamma: 1.0,
            n_features: 0,
            n_iter: 0,
        }
    }

    pub fn config(&self) -> &SVMConfig {
        &self.config
    }

    pub fn n_support(&self) -> usize {
        self.dual_coef.as_ref().map_or(0, |c| c.len())
    }

    /// Sweeps run by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => 1.0,
            KernelType::RBF { gamma: Gamma::Value(g) } => g,
            KernelType::RBF { gamma: Gamma::Scale } => {
                let var = x.var(0.0);
                if var > 0.0 {
                    1.0 / (x.ncols() as f64 * var)
                } else {
                    1.0
                }
            }
        }
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::RBF { .. } => {
                let dist_sq: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
                (-self.gamma * dist_sq).exp()
            }
        }
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let row_of = |i: usize| -> Vec<f64> { (0..n).map(|j| self.kernel(x.row(i), x.row(j))).collect() };

        let rows: Vec<Vec<f64>> = if n < PARALLEL_KERNEL_MIN_SAMPLES {
            (0..n).map(row_of).collect()
        } else {
            (0..n).into_par_iter().map(row_of).collect()
        };

        Array2::from_shape_fn((n, n), |(i, j)| rows[i][j])
    }

    /// Coordinate descent on
    /// `½ βᵀK'β - yᵀβ + ε‖β‖₁` subject to `-C <= β_i <= C`
    fn solve_dual(&mut self, k: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
        let n = y.len();
        let c = self.config.c;
        let eps = self.config.epsilon;

        let mut beta = Array1::<f64>::zeros(n);
        // f = K' beta
        let mut f = Array1::<f64>::zeros(n);

        self.n_iter = 0;
        for _ in 0..self.config.max_iter {
            self.n_iter += 1;
            let mut max_change = 0.0f64;

            for i in 0..n {
                let q_ii = k[[i, i]] + 1.0;
                let z = beta[i] - (f[i] - y[i]) / q_ii;
                let shrink = eps / q_ii;
                let soft = if z > shrink {
                    z - shrink
                } else if z < -shrink {
                    z + shrink
                } else {
                    0.0
                };
                let updated = soft.clamp(-c, c);

                let delta = updated - beta[i];
                if delta != 0.0 {
                    beta[i] = updated;
                    f.scaled_add(delta, &k.row(i));
                    f += delta;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.config.tol {
                break;
            }
        }

        beta
    }
}

impl Regressor for SVMRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        self.config.validate()?;

        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(BenchError::ValidationError(format!(
                "{} samples exceeds the SVR limit of {}",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        self.n_features = x.ncols();
        self.gamma = self.resolve_gamma(x);

        let k = self.compute_kernel_matrix(x);
        let beta = self.solve_dual(&k, y);

        let support: Vec<usize> = beta
            .iter()
            .enumerate()
            .filter(|(_, b)| b.abs() > SUPPORT_THRESHOLD)
            .map(|(i, _)| i)
            .collect();

        let dual_coef = beta.select(Axis(0), &support);
        self.bias = dual_coef.sum();
        self.support_vectors = Some(x.select(Axis(0), &support));
        self.dual_coef = Some(dual_coef);

        debug!(
            n_support = support.len(),
            n_iter = self.n_iter,
            gamma = self.gamma,
            "SVR fitted"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (sv, coef) = match (&self.support_vectors, &self.dual_coef) {
            (Some(sv), Some(coef)) => (sv, coef),
            _ => return Err(BenchError::ModelNotFitted),
        };
        check_predict_input(x, self.n_features)?;

        let preds: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                sv.outer_iter()
                    .zip(coef.iter())
                    .map(|(s, &b)| b * self.kernel(row, s))
                    .sum::<f64>()
                    + self.bias
            })
            .collect();

        Ok(Array1::from_vec(preds))
    }

    fn is_fitted(&self) -> bool {
        self.dual_coef.is_some()
    }
}
