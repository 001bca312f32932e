//! End-to-end benchmark pipeline

use super::config::BenchmarkConfig;
use super::evaluator::Evaluator;
use super::importance::extract_importances;
use super::report::{BenchmarkReport, ModelTiming};
use crate::data::{load_csv, Dataset, FrameConverter};
use crate::error::{BenchError, Result};
use crate::preprocessing::{LabelEncoder, StandardScaler};
use crate::training::{default_registry, train_test_split, ModelRegistry};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::{debug, info};

/// Runs encode, convert, split, scale, evaluate and importance extraction
/// in that order.
///
/// Every input problem is raised before the first model trains.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: BenchmarkConfig,
    registry: Option<ModelRegistry>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Replace the default candidate set
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn run_csv(&self, path: impl AsRef<Path>) -> Result<BenchmarkReport> {
        self.config.validate()?;
        let df = load_csv(path)?;
        self.run_frame(&df)
    }

    pub fn run_frame(&self, df: &DataFrame) -> Result<BenchmarkReport> {
        self.config.validate()?;

        let encoded;
        let frame = if self.config.categorical_columns.is_empty() {
            df
        } else {
            let mut encoder = LabelEncoder::new();
            encoded = encoder.fit_transform(df, &self.config.categorical_columns)?;
            debug!(columns = ?self.config.categorical_columns, "Label-encoded categorical columns");
            &encoded
        };

        let mut converter = FrameConverter::new(self.config.target_column.as_str());
        if let Some(cols) = &self.config.feature_columns {
            converter = converter.with_feature_columns(cols.clone());
        }
        let dataset = converter.convert(frame)?;

        self.run_dataset(&dataset)
    }

    pub fn run_dataset(&self, dataset: &Dataset) -> Result<BenchmarkReport> {
        self.config.validate()?;

        let split = train_test_split(
            &dataset.features,
            &dataset.target,
            self.config.test_fraction,
            self.config.random_state,
        )?;
        info!(
            rows = dataset.n_rows(),
            features = dataset.features.n_features(),
            train = split.split.n_train(),
            test = split.split.n_test(),
            seed = self.config.random_state,
            "Split dataset"
        );

        let (train_features, test_features) = if self.config.scale_features {
            let mut scaler = StandardScaler::new();
            scaler.fit(&split.train_features)?;
            (scaler.transform(&split.train_features)?, scaler.transform(&split.test_features)?)
        } else {
            (split.train_features.clone(), split.test_features.clone())
        };

        let registry = self
            .registry
            .clone()
            .unwrap_or_else(|| default_registry(self.config.random_state));
        let attempted = registry.len();

        let evaluation = Evaluator::new().with_parallel(self.config.parallel).evaluate(
            registry,
            &train_features,
            &split.train_target,
            &test_features,
            &split.test_target,
        )?;

        if evaluation.results().is_empty() {
            return Err(BenchError::NoModelsSucceeded { attempted });
        }

        let importances = match evaluation.fitted_model(&self.config.importance_model) {
            Some(model) if model.estimator.kind().has_importances() => {
                extract_importances(&model.name, &model.estimator, train_features.names())?
            }
            _ => None,
        };
        if importances.is_none() {
            info!(model = %self.config.importance_model, "Feature importances unavailable");
        }

        let timings = evaluation
            .fitted()
            .map(|m| ModelTiming {
                model: m.name.clone(),
                fit_secs: m.fit_time.as_secs_f64(),
                predict_secs: m.predict_time.as_secs_f64(),
            })
            .collect();

        Ok(BenchmarkReport {
            target: dataset.target.name().to_string(),
            feature_names: train_features.names().to_vec(),
            n_train: split.split.n_train(),
            n_test: split.split.n_test(),
            failures: evaluation.failures().into_iter().cloned().collect(),
            results: evaluation.into_results(),
            importances,
            timings,
        })
    }

    /// Write the results CSV and, when present, the importance CSV to the
    /// configured paths
    pub fn save_outputs(&self, report: &BenchmarkReport) -> Result<()> {
        report.write_results_csv(&self.config.results_path)?;
        info!(path = %self.config.results_path.display(), "Wrote model results");

        if report.write_importance_csv(&self.config.importance_path)? {
            info!(path = %self.config.importance_path.display(), "Wrote feature importances");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{Estimator, LinearRegression, RandomForest, RANDOM_FOREST};
    use polars::prelude::*;

    fn frame(n: usize) -> DataFrame {
        let a: Vec<f64> = (0..n).map(|i| (i % 17) as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| ((i * 7) % 11) as f64).collect();
        let city: Vec<&str> = (0..n).map(|i| ["east", "north", "south"][i % 3]).collect();
        let price: Vec<f64> = (0..n)
            .map(|i| 2.0 * a[i] - b[i] + (i % 3) as f64 * 5.0)
            .collect();
        df!("a" => a, "b" => b, "city" => city, "price" => price).unwrap()
    }

    fn quick_registry() -> ModelRegistry {
        ModelRegistry::new()
            .with_model("Linear Regression", Estimator::Linear(LinearRegression::new()))
            .unwrap()
            .with_model(RANDOM_FOREST, Estimator::RandomForest(RandomForest::new(10).with_random_state(3)))
            .unwrap()
    }

    #[test]
    fn test_run_frame_with_categorical() {
        let config = BenchmarkConfig::new("price").with_categorical_columns(vec!["city".to_string()]);
        let report = Benchmark::new(config)
            .with_registry(quick_registry())
            .run_frame(&frame(60))
            .unwrap();

        assert_eq!(report.n_test, 12);
        assert_eq!(report.n_train, 48);
        assert_eq!(report.results.model_names(), vec!["Linear Regression", RANDOM_FOREST]);
        assert!(report.results.get("Linear Regression").unwrap().r2 > 0.99);

        let imp = report.importances.as_ref().unwrap();
        assert_eq!(imp.len(), 3);
        assert_eq!(imp.model(), RANDOM_FOREST);
    }

    #[test]
    fn test_string_feature_without_encoding_is_fatal() {
        let config = BenchmarkConfig::new("price");
        let result = Benchmark::new(config).with_registry(quick_registry()).run_frame(&frame(20));
        assert!(matches!(result, Err(BenchError::NonNumericFeature { .. })));
    }

    #[test]
    fn test_all_models_failing() {
        let registry = ModelRegistry::new()
            .with_model("broken", Estimator::RandomForest(RandomForest::new(0)))
            .unwrap();
        let config = BenchmarkConfig::new("price").with_feature_columns(vec!["a".into(), "b".into()]);
        let result = Benchmark::new(config).with_registry(registry).run_frame(&frame(20));
        assert!(matches!(result, Err(BenchError::NoModelsSucceeded { attempted: 1 })));
    }

    #[test]
    fn test_importance_model_missing_is_not_an_error() {
        let registry = ModelRegistry::new()
            .with_model("Linear Regression", Estimator::Linear(LinearRegression::new()))
            .unwrap();
        let config = BenchmarkConfig::new("price").with_feature_columns(vec!["a".into(), "b".into()]);
        let report = Benchmark::new(config).with_registry(registry).run_frame(&frame(30)).unwrap();
        assert!(report.importances.is_none());
    }
}
