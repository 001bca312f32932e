//! regbench - Multi-model regression benchmark
//!
//! Trains a fixed set of regression models on one dataset, scores each on a
//! held-out partition and reports comparable metrics plus feature
//! importances from a tree ensemble.
//!
//! # Modules
//!
//! - [`data`] - CSV loading and numeric conversion
//! - [`preprocessing`] - Label encoding and standard scaling
//! - [`training`] - Regression models, splitting and metrics
//! - [`benchmark`] - Evaluation, results tables and the end-to-end pipeline
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data and models
pub mod data;
pub mod preprocessing;
pub mod training;

// Harness
pub mod benchmark;
pub mod cli;

pub use error::{BenchError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{BenchError, Result};

    // Data
    pub use crate::data::{load_csv, Dataset, FeatureMatrix, TargetVector};

    // Preprocessing
    pub use crate::preprocessing::{LabelEncoder, StandardScaler};

    // Training
    pub use crate::training::{
        default_registry, train_test_split, Estimator, ModelRegistry, RegressionMetrics, Regressor,
    };

    // Benchmark
    pub use crate::benchmark::{
        Benchmark, BenchmarkConfig, BenchmarkReport, Evaluator, ImportanceTable, ResultsTable,
    };
}
