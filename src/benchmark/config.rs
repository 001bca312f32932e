//! Benchmark run configuration

use crate::error::{BenchError, Result};
use crate::training::RANDOM_FOREST;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Column holding the regression target
    pub target_column: String,

    /// Feature column names (None = all except target)
    pub feature_columns: Option<Vec<String>>,

    /// Columns label-encoded before numeric conversion
    pub categorical_columns: Vec<String>,

    /// Share of rows held out for testing
    pub test_fraction: f64,

    /// Seed for the split and every stochastic model
    pub random_state: u64,

    /// Standardize features with statistics from the training partition
    pub scale_features: bool,

    /// Evaluate models concurrently
    pub parallel: bool,

    /// Model whose importances are extracted
    pub importance_model: String,

    pub results_path: PathBuf,

    pub importance_path: PathBuf,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            target_column: "target".to_string(),
            feature_columns: None,
            categorical_columns: Vec::new(),
            test_fraction: 0.2,
            random_state: 42,
            scale_features: true,
            parallel: false,
            importance_model: RANDOM_FOREST.to_string(),
            results_path: PathBuf::from("model_results.csv"),
            importance_path: PathBuf::from("feature_importance.csv"),
        }
    }
}

impl BenchmarkConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target_column: target.into(),
            ..Default::default()
        }
    }

    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = Some(columns);
        self
    }

    pub fn with_categorical_columns(mut self, columns: Vec<String>) -> Self {
        self.categorical_columns = columns;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_scaling(mut self, scale: bool) -> Self {
        self.scale_features = scale;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_importance_model(mut self, name: impl Into<String>) -> Self {
        self.importance_model = name.into();
        self
    }

    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    pub fn with_importance_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.importance_path = path.into();
        self
    }

    /// Reject settings that would fail later in the run
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(BenchError::ConfigError("target_column must not be empty".to_string()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(BenchError::invalid_param(
                "test_fraction",
                self.test_fraction,
                "must be strictly between 0 and 1",
            ));
        }
        if let Some(cols) = &self.feature_columns {
            if cols.is_empty() {
                return Err(BenchError::ConfigError("feature_columns must not be empty".to_string()));
            }
            if cols.iter().any(|c| c == &self.target_column) {
                return Err(BenchError::ConfigError(format!(
                    "target column '{}' is listed as a feature",
                    self.target_column
                )));
            }
        }
        if self.categorical_columns.iter().any(|c| c == &self.target_column) {
            return Err(BenchError::ConfigError(format!(
                "target column '{}' cannot be categorical",
                self.target_column
            )));
        }
        Ok(())
    }

    /// Read a JSON configuration file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.random_state, 42);
        assert!(config.scale_features);
        assert!(!config.parallel);
        assert_eq!(config.importance_model, "Random Forest");
        assert_eq!(config.results_path, PathBuf::from("model_results.csv"));
    }

    #[test]
    fn test_validate() {
        assert!(BenchmarkConfig::new("price").validate().is_ok());
        assert!(BenchmarkConfig::new("price").with_test_fraction(1.0).validate().is_err());
        assert!(BenchmarkConfig::new("").validate().is_err());
        assert!(BenchmarkConfig::new("price")
            .with_feature_columns(vec!["price".to_string()])
            .validate()
            .is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");

        let config = BenchmarkConfig::new("price")
            .with_categorical_columns(vec!["city".to_string()])
            .with_random_state(7)
            .with_parallel(true);
        config.save(&path).unwrap();

        let loaded = BenchmarkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BenchmarkConfig =
            serde_json::from_str(r#"{"target_column": "y", "test_fraction": 0.3}"#).unwrap();
        assert_eq!(config.target_column, "y");
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.random_state, 42);
    }
}
