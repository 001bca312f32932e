//! Summary of a benchmark run

use super::evaluator::ModelFailure;
use super::importance::ImportanceTable;
use super::results::ResultsTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Wall-clock cost of one successfully evaluated model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTiming {
    pub model: String,
    pub fit_secs: f64,
    pub predict_secs: f64,
}

/// Everything a benchmark run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub target: String,
    pub feature_names: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    pub results: ResultsTable,
    pub importances: Option<ImportanceTable>,
    pub failures: Vec<ModelFailure>,
    pub timings: Vec<ModelTiming>,
}

impl BenchmarkReport {
    /// Plain text summary: header, results, rankings, failures, importances
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    pub fn write_results_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        self.results.write_csv(path)
    }

    /// Write the importance table if there is one; returns whether a file was written
    pub fn write_importance_csv(&self, path: impl AsRef<Path>) -> Result<bool> {
        match &self.importances {
            Some(table) => {
                table.write_csv(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Regression benchmark for '{}': {} features, {} train rows, {} test rows",
            self.target,
            self.feature_names.len(),
            self.n_train,
            self.n_test
        )?;
        writeln!(f)?;

        writeln!(f, "{:<24} {:>14} {:>14} {:>14} {:>10}", "Model", "MAE", "MSE", "RMSE", "R2")?;
        writeln!(f, "{}", "-".repeat(80))?;
        for r in self.results.records() {
            writeln!(
                f,
                "{:<24} {:>14.4} {:>14.4} {:>14.4} {:>10.4}",
                r.model, r.mae, r.mse, r.rmse, r.r2
            )?;
        }

        if let (Some(best_r2), Some(best_rmse)) = (self.results.best_by_r2(), self.results.best_by_rmse()) {
            writeln!(f)?;
            writeln!(f, "Best by R2:   {} ({:.4})", best_r2.model, best_r2.r2)?;
            writeln!(f, "Best by RMSE: {} ({:.4})", best_rmse.model, best_rmse.rmse)?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed models:")?;
            for failure in &self.failures {
                writeln!(f, "  {}", failure)?;
            }
        }

        if let Some(table) = &self.importances {
            writeln!(f)?;
            writeln!(f, "Feature importance ({}):", table.model())?;
            for r in table.records() {
                writeln!(f, "  {:<24} {:>10.4}", r.feature, r.importance)?;
            }
        }

        Ok(())
    }
}
