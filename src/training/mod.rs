//! Regression models and the pieces needed to train them
//!
//! - Linear regression (ordinary least squares)
//! - Decision trees, random forests and gradient boosting
//! - Epsilon-insensitive support vector regression
//! - Seeded train/test splitting and regression metrics
//!
//! Every model implements [`Regressor`]; [`Estimator`] closes the set so a
//! [`ModelRegistry`] can hold them side by side.

mod models;
mod registry;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod split;
pub mod svm;

pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear_models::LinearRegression;
pub use metrics::RegressionMetrics;
pub use models::{Estimator, ModelKind, Regressor};
pub use random_forest::{MaxFeatures, RandomForest};
pub use registry::{
    default_registry, ModelRegistry, ModelSpec, DECISION_TREE, DEFAULT_N_ESTIMATORS,
    GRADIENT_BOOSTING, LINEAR_REGRESSION, RANDOM_FOREST, SVM,
};
pub use split::{train_test_split, SplitData, TrainTestSplit};
pub use svm::{Gamma, KernelType, SVMConfig, SVMRegressor};
