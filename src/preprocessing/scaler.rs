//! Feature scaling

use crate::data::FeatureMatrix;
use crate::error::{BenchError, Result};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaling (z-score normalization): (x - mean) / std
///
/// Uses the population standard deviation. Constant columns get a scale of
/// 1.0 so they map to zero instead of NaN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-column mean and std
    pub fn fit(&mut self, x: &FeatureMatrix) -> Result<&mut Self> {
        if x.n_rows() == 0 {
            return Err(BenchError::ValidationError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let values = x.values();
        let mean = values
            .mean_axis(Axis(0))
            .ok_or_else(|| BenchError::ComputationError("empty axis".to_string()))?;
        let scale = values
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(self)
    }

    pub fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        let (mean, scale) = match (&self.mean, &self.scale) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(BenchError::ModelNotFitted),
        };

        if x.n_features() != mean.len() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("{} features", mean.len()),
                actual: format!("{} features", x.n_features()),
            });
        }

        let scaled = (x.values() - &mean.view().insert_axis(Axis(0)))
            / &scale.view().insert_axis(Axis(0));
        x.with_values(scaled)
    }

    pub fn fit_transform(&mut self, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }
}
