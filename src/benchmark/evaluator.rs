//! Fit, predict and score every registered model with per-model isolation

use super::results::{MetricRecord, ResultsTable};
use crate::data::{FeatureMatrix, TargetVector};
use crate::error::{BenchError, Result};
use crate::training::{Estimator, ModelRegistry, ModelSpec, Regressor, RegressionMetrics};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Step at which a model failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationStage {
    Fit,
    Predict,
    Score,
}

impl fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvaluationStage::Fit => "fit",
            EvaluationStage::Predict => "predict",
            EvaluationStage::Score => "score",
        })
    }
}

/// Diagnostic for a model that produced no metric record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub model: String,
    pub stage: EvaluationStage,
    pub message: String,
}

impl fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed during {}: {}", self.model, self.stage, self.message)
    }
}

/// A model that completed fit, predict and scoring
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub name: String,
    pub estimator: Estimator,
    pub metrics: RegressionMetrics,
    pub fit_time: Duration,
    pub predict_time: Duration,
}

/// Result of evaluating one registry entry
#[derive(Debug, Clone)]
pub enum ModelOutcome {
    Trained(FittedModel),
    Failed(ModelFailure),
}

impl ModelOutcome {
    pub fn name(&self) -> &str {
        match self {
            ModelOutcome::Trained(m) => &m.name,
            ModelOutcome::Failed(f) => &f.model,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self, ModelOutcome::Trained(_))
    }
}

/// Outcomes of a full evaluation, in registry order
#[derive(Debug, Clone)]
pub struct Evaluation {
    outcomes: Vec<ModelOutcome>,
    table: ResultsTable,
}

impl Evaluation {
    fn from_outcomes(outcomes: Vec<ModelOutcome>) -> Self {
        let table = outcomes
            .iter()
            .filter_map(|o| match o {
                ModelOutcome::Trained(m) => Some(MetricRecord::from_metrics(&m.name, &m.metrics)),
                ModelOutcome::Failed(_) => None,
            })
            .collect();
        Self { outcomes, table }
    }

    pub fn outcomes(&self) -> &[ModelOutcome] {
        &self.outcomes
    }

    pub fn results(&self) -> &ResultsTable {
        &self.table
    }

    pub fn into_results(self) -> ResultsTable {
        self.table
    }

    pub fn fitted(&self) -> impl Iterator<Item = &FittedModel> {
        self.outcomes.iter().filter_map(|o| match o {
            ModelOutcome::Trained(m) => Some(m),
            ModelOutcome::Failed(_) => None,
        })
    }

    pub fn fitted_model(&self, name: &str) -> Option<&FittedModel> {
        self.fitted().find(|m| m.name == name)
    }

    pub fn failures(&self) -> Vec<&ModelFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ModelOutcome::Failed(f) => Some(f),
                ModelOutcome::Trained(_) => None,
            })
            .collect()
    }
}

/// Runs every model in a registry against one train/test split
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    parallel: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate models concurrently; outcome order still follows the registry
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fit each model on the training partition and score it on the test
    /// partition.
    ///
    /// Mismatched partitions are rejected before any model trains. After
    /// that, a failing model is logged and recorded as
    /// [`ModelOutcome::Failed`] without affecting the others.
    pub fn evaluate(
        &self,
        registry: ModelRegistry,
        train_features: &FeatureMatrix,
        train_target: &TargetVector,
        test_features: &FeatureMatrix,
        test_target: &TargetVector,
    ) -> Result<Evaluation> {
        check_partitions(train_features, train_target, test_features, test_target)?;

        info!(
            models = registry.len(),
            train_rows = train_features.n_rows(),
            test_rows = test_features.n_rows(),
            parallel = self.parallel,
            "Evaluating models"
        );

        let run = |spec: ModelSpec| evaluate_one(spec, train_features, train_target, test_features, test_target);
        let outcomes: Vec<ModelOutcome> = if self.parallel {
            registry.into_specs().into_par_iter().map(run).collect()
        } else {
            registry.into_iter().map(run).collect()
        };

        Ok(Evaluation::from_outcomes(outcomes))
    }
}

fn check_partitions(
    train_features: &FeatureMatrix,
    train_target: &TargetVector,
    test_features: &FeatureMatrix,
    test_target: &TargetVector,
) -> Result<()> {
    for (features, target, label) in [
        (train_features, train_target, "train"),
        (test_features, test_target, "test"),
    ] {
        if features.n_rows() != target.len() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("{} target length = {}", label, features.n_rows()),
                actual: format!("{} target length = {}", label, target.len()),
            });
        }
        if features.n_rows() == 0 {
            return Err(BenchError::DataError(format!("{} partition is empty", label)));
        }
    }
    if train_features.names() != test_features.names() {
        return Err(BenchError::ShapeMismatch {
            expected: format!("test features {:?}", train_features.names()),
            actual: format!("test features {:?}", test_features.names()),
        });
    }
    Ok(())
}

fn evaluate_one(
    spec: ModelSpec,
    train_features: &FeatureMatrix,
    train_target: &TargetVector,
    test_features: &FeatureMatrix,
    test_target: &TargetVector,
) -> ModelOutcome {
    let ModelSpec { name, mut estimator } = spec;

    let fail = |stage: EvaluationStage, error: BenchError| {
        warn!(model = %name, stage = %stage, error = %error, "Model evaluation failed");
        ModelOutcome::Failed(ModelFailure {
            model: name.clone(),
            stage,
            message: error.to_string(),
        })
    };

    let start = Instant::now();
    if let Err(e) = estimator.fit(train_features.values(), train_target.values()) {
        return fail(EvaluationStage::Fit, e);
    }
    let fit_time = start.elapsed();

    let start = Instant::now();
    let predictions = match estimator.predict(test_features.values()) {
        Ok(p) => p,
        Err(e) => return fail(EvaluationStage::Predict, e),
    };
    let predict_time = start.elapsed();

    let metrics = match RegressionMetrics::compute(test_target.values(), &predictions) {
        Ok(m) => m,
        Err(e) => return fail(EvaluationStage::Score, e),
    };

    info!(
        model = %name,
        r2 = metrics.r2,
        rmse = metrics.rmse,
        fit_ms = fit_time.as_millis() as u64,
        "Model evaluated"
    );

    ModelOutcome::Trained(FittedModel {
        name,
        estimator,
        metrics,
        fit_time,
        predict_time,
    })
}
