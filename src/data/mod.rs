//! Numeric dataset types consumed by the benchmark harness
//!
//! A [`Dataset`] pairs a [`FeatureMatrix`] (named `f64` columns) with a
//! [`TargetVector`]. Both are validated on construction so that everything
//! downstream can assume aligned, fully numeric input.

mod loader;

pub use loader::{load_csv, FrameConverter};

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered collection of named numeric columns, one row per observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Create a feature matrix, checking that names match the column count
    /// and are unique
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("{} feature names", values.ncols()),
                actual: format!("{} feature names", names.len()),
            });
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(BenchError::DataError(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
        }

        Ok(Self { names, values })
    }

    /// Build a matrix with generated names `feature_0..feature_{k-1}`
    pub fn from_array(values: Array2<f64>) -> Self {
        let names = (0..values.ncols()).map(|i| format!("feature_{}", i)).collect();
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Copy the given rows (in the given order) into a new matrix
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }

    /// Replace the numeric payload, keeping the column names
    pub(crate) fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(self.names.clone(), values)
    }
}

/// One numeric target value per observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetVector {
    name: String,
    values: Array1<f64>,
}

impl TargetVector {
    pub fn new(name: impl Into<String>, values: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

/// Validated pair of features and target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub features: FeatureMatrix,
    pub target: TargetVector,
}

impl Dataset {
    /// Pair features with a target.
    ///
    /// Fails with [`BenchError::ShapeMismatch`] when row counts differ and with
    /// [`BenchError::DataError`] when the target column also appears among the
    /// features.
    pub fn new(features: FeatureMatrix, target: TargetVector) -> Result<Self> {
        if features.n_rows() != target.len() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("target length = {}", features.n_rows()),
                actual: format!("target length = {}", target.len()),
            });
        }

        if features.names().iter().any(|n| n == target.name()) {
            return Err(BenchError::DataError(format!(
                "target column '{}' must not be used as a feature",
                target.name()
            )));
        }

        if target.values().iter().any(|v| !v.is_finite()) {
            return Err(BenchError::DataError(format!(
                "target column '{}' contains non-finite values",
                target.name()
            )));
        }

        Ok(Self { features, target })
    }

    /// Convert a DataFrame, using every non-target column as a feature when
    /// `feature_columns` is `None`
    pub fn from_frame(
        df: &polars::prelude::DataFrame,
        target_column: &str,
        feature_columns: Option<Vec<String>>,
    ) -> Result<Self> {
        let mut converter = FrameConverter::new(target_column);
        if let Some(cols) = feature_columns {
            converter = converter.with_feature_columns(cols);
        }
        converter.convert(df)
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn feature_names(&self) -> &[String] {
        self.features.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feature_matrix_rejects_name_count_mismatch() {
        let result = FeatureMatrix::new(names(&["a"]), array![[1.0, 2.0]]);
        assert!(matches!(result, Err(BenchError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_feature_matrix_rejects_duplicate_names() {
        let result = FeatureMatrix::new(names(&["a", "a"]), array![[1.0, 2.0]]);
        assert!(matches!(result, Err(BenchError::DataError(_))));
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let fm = FeatureMatrix::new(names(&["a", "b"]), array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])
            .unwrap();
        let picked = fm.select_rows(&[2, 0]);
        assert_eq!(picked.values(), &array![[5.0, 6.0], [1.0, 2.0]]);
        assert_eq!(picked.names(), fm.names());
    }

    #[test]
    fn test_dataset_row_mismatch() {
        let fm = FeatureMatrix::from_array(array![[1.0], [2.0], [3.0]]);
        let target = TargetVector::new("y", array![1.0, 2.0]);
        let result = Dataset::new(fm, target);
        assert!(matches!(result, Err(BenchError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_dataset_rejects_target_as_feature() {
        let fm = FeatureMatrix::new(names(&["x", "y"]), array![[1.0, 2.0]]).unwrap();
        let target = TargetVector::new("y", array![2.0]);
        assert!(Dataset::new(fm, target).is_err());
    }

    #[test]
    fn test_dataset_ok() {
        let fm = FeatureMatrix::from_array(array![[1.0], [2.0]]);
        let ds = Dataset::new(fm, TargetVector::new("y", array![3.0, 4.0])).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.feature_names(), &["feature_0".to_string()]);
    }
}
