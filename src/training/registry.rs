//! Ordered set of named candidate models

use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::linear_models::LinearRegression;
use super::decision_tree::DecisionTree;
use super::models::{Estimator, ModelKind};
use super::random_forest::{MaxFeatures, RandomForest};
use super::svm::{Gamma, KernelType, SVMConfig, SVMRegressor};
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};

pub const LINEAR_REGRESSION: &str = "Linear Regression";
pub const DECISION_TREE: &str = "Decision Tree";
pub const RANDOM_FOREST: &str = "Random Forest";
pub const SVM: &str = "SVM";
pub const GRADIENT_BOOSTING: &str = "Gradient Boosting";

/// Trees in the default forest and stages in the default booster
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// A display name bound to an unfitted estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub estimator: Estimator,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, estimator: Estimator) -> Self {
        Self {
            name: name.into(),
            estimator,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.estimator.kind()
    }
}

/// Candidate models in evaluation order, with unique names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelRegistry {
    specs: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model; a name already present is rejected
    pub fn register(&mut self, name: impl Into<String>, estimator: Estimator) -> Result<&mut Self> {
        let name = name.into();
        if self.contains(&name) {
            return Err(BenchError::invalid_param("model name", &name, "already registered"));
        }
        self.specs.push(ModelSpec::new(name, estimator));
        Ok(self)
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_model(mut self, name: impl Into<String>, estimator: Estimator) -> Result<Self> {
        self.register(name, estimator)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn into_specs(self) -> Vec<ModelSpec> {
        self.specs
    }
}

impl IntoIterator for ModelRegistry {
    type Item = ModelSpec;
    type IntoIter = std::vec::IntoIter<ModelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.into_iter()
    }
}

/// The five standard candidates, freshly constructed on every call.
///
/// Every stochastic model is seeded from `seed`, so two registries built
/// with the same seed produce identical fits.
pub fn default_registry(seed: u64) -> ModelRegistry {
    let specs = vec![
        ModelSpec::new(LINEAR_REGRESSION, Estimator::Linear(LinearRegression::new())),
        ModelSpec::new(
            DECISION_TREE,
            Estimator::DecisionTree(DecisionTree::new().with_random_state(seed)),
        ),
        ModelSpec::new(
            RANDOM_FOREST,
            Estimator::RandomForest(
                RandomForest::new(DEFAULT_N_ESTIMATORS)
                    .with_max_features(MaxFeatures::All)
                    .with_random_state(seed),
            ),
        ),
        ModelSpec::new(
            SVM,
            Estimator::Svr(SVMRegressor::new(SVMConfig {
                c: 1.0,
                epsilon: 0.1,
                kernel: KernelType::RBF { gamma: Gamma::Scale },
                ..Default::default()
            })),
        ),
        ModelSpec::new(
            GRADIENT_BOOSTING,
            Estimator::GradientBoosting(GradientBoostingRegressor::new(GradientBoostingConfig {
                n_estimators: DEFAULT_N_ESTIMATORS,
                learning_rate: 0.1,
                max_depth: 3,
                random_state: Some(seed),
                ..Default::default()
            })),
        ),
    ];

    ModelRegistry { specs }
}
