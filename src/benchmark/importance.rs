//! Feature importance extraction

use crate::error::{BenchError, Result};
use crate::training::{Estimator, Regressor};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceRecord {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
}

/// Importance weights of one model, sorted by descending weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceTable {
    model: String,
    records: Vec<ImportanceRecord>,
}

impl ImportanceTable {
    /// Pair weights with feature names and sort descending.
    ///
    /// The sort is stable, so equal weights keep feature order.
    pub fn from_weights(model: impl Into<String>, feature_names: &[String], weights: &[f64]) -> Result<Self> {
        if feature_names.len() != weights.len() {
            return Err(BenchError::ShapeMismatch {
                expected: format!("{} importance weights", feature_names.len()),
                actual: format!("{} importance weights", weights.len()),
            });
        }

        let mut records: Vec<ImportanceRecord> = feature_names
            .iter()
            .zip(weights)
            .map(|(name, &w)| ImportanceRecord {
                feature: name.clone(),
                importance: w,
            })
            .collect();
        records.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        Ok(Self {
            model: model.into(),
            records,
        })
    }

    /// Name of the model the weights came from
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn records(&self) -> &[ImportanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top(&self, k: usize) -> &[ImportanceRecord] {
        &self.records[..k.min(self.records.len())]
    }

    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.importance).sum()
    }

    /// CSV with a `Feature,Importance` header, descending
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        wtr.write_record(["Feature", "Importance"])?;
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv_to(std::io::BufWriter::new(file))
    }
}

/// Importance table of a fitted model.
///
/// `Ok(None)` when the model does not expose importances or has not been
/// fitted. A weight count that differs from the feature count is an error.
pub fn extract_importances(
    model_name: &str,
    estimator: &Estimator,
    feature_names: &[String],
) -> Result<Option<ImportanceTable>> {
    if !estimator.is_fitted() {
        return Ok(None);
    }
    match estimator.feature_importances() {
        Some(weights) => {
            let weights = weights.to_vec();
            ImportanceTable::from_weights(model_name, feature_names, &weights).map(Some)
        }
        None => Ok(None),
    }
}
