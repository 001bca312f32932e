//! Per-model metric records and their ordered table

use crate::error::Result;
use crate::training::RegressionMetrics;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Test-set metrics of one successfully evaluated model.
///
/// Field renames fix the CSV header to `Model,MAE,MSE,RMSE,R2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "MSE")]
    pub mse: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
}

impl MetricRecord {
    pub fn from_metrics(model: impl Into<String>, metrics: &RegressionMetrics) -> Self {
        Self {
            model: model.into(),
            mae: metrics.mae,
            mse: metrics.mse,
            rmse: metrics.rmse,
            r2: metrics.r2,
        }
    }
}

/// Metric records in registry order; failed models leave no record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    records: Vec<MetricRecord>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, model: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|r| r.model == model)
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.model.as_str()).collect()
    }

    /// Highest R²; the earliest record wins ties
    pub fn best_by_r2(&self) -> Option<&MetricRecord> {
        self.records.iter().fold(None, |best, r| match best {
            Some(b) if b.r2 >= r.r2 => Some(b),
            _ => Some(r),
        })
    }

    /// Lowest RMSE; the earliest record wins ties
    pub fn best_by_rmse(&self) -> Option<&MetricRecord> {
        self.records.iter().fold(None, |best, r| match best {
            Some(b) if b.rmse <= r.rmse => Some(b),
            _ => Some(r),
        })
    }

    /// All records by descending R², ties in registry order
    pub fn ranked_by_r2(&self) -> Vec<&MetricRecord> {
        let mut ranked: Vec<&MetricRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.r2.total_cmp(&a.r2));
        ranked
    }

    /// All records by ascending RMSE, ties in registry order
    pub fn ranked_by_rmse(&self) -> Vec<&MetricRecord> {
        let mut ranked: Vec<&MetricRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| a.rmse.total_cmp(&b.rmse));
        ranked
    }

    /// Serialize as CSV with a `Model,MAE,MSE,RMSE,R2` header.
    ///
    /// Floats are written in shortest round-trip form.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        wtr.write_record(["Model", "MAE", "MSE", "RMSE", "R2"])?;
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

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl FromIterator<MetricRecord> for ResultsTable {
    fn from_iter<I: IntoIterator<Item = MetricRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
