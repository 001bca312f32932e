//! Multi-model benchmark harness
//!
//! [`Benchmark`] drives the whole run: label encoding, numeric conversion,
//! a seeded split, train-only scaling, then [`Evaluator`] over a
//! [`ModelRegistry`](crate::training::ModelRegistry). A model that fails is
//! reported and skipped; the remaining ones still produce metric records.

mod config;
mod evaluator;
mod importance;
mod report;
mod results;
mod runner;

pub use config::BenchmarkConfig;
pub use evaluator::{EvaluationStage, Evaluation, Evaluator, FittedModel, ModelFailure, ModelOutcome};
pub use importance::{extract_importances, ImportanceRecord, ImportanceTable};
pub use report::{BenchmarkReport, ModelTiming};
pub use results::{MetricRecord, ResultsTable};
pub use runner::Benchmark;
