//! Conversion from tabular files and polars frames into a numeric [`Dataset`]

use super::{Dataset, FeatureMatrix, TargetVector};
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Read a CSV file with a header row into a DataFrame
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
    Ok(df)
}

/// Extracts a numeric [`Dataset`] from a DataFrame
#[derive(Debug, Clone)]
pub struct FrameConverter {
    target_column: String,
    feature_columns: Option<Vec<String>>,
}

impl FrameConverter {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            feature_columns: None,
        }
    }

    /// Restrict the features to the given columns (default: every non-target column)
    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = Some(columns);
        self
    }

    /// Convert the frame.
    ///
    /// The target must convert to `f64` on every row; the first row that
    /// does not is reported as [`BenchError::TargetConversion`]. Feature
    /// columns must already be numeric (categoricals are encoded upstream).
    pub fn convert(&self, df: &DataFrame) -> Result<Dataset> {
        let feature_cols = self.resolve_feature_columns(df)?;
        let target = self.extract_target(df)?;
        let x = Self::columns_to_array2(df, &feature_cols)?;

        let features = FeatureMatrix::new(feature_cols, x)?;
        Dataset::new(features, TargetVector::new(self.target_column.clone(), target))
    }

    fn resolve_feature_columns(&self, df: &DataFrame) -> Result<Vec<String>> {
        let cols: Vec<String> = match &self.feature_columns {
            Some(cols) => cols.clone(),
            None => df
                .get_column_names()
                .into_iter()
                .filter(|name| name.as_str() != self.target_column)
                .map(|s| s.to_string())
                .collect(),
        };

        if cols.is_empty() {
            return Err(BenchError::DataError("no feature columns selected".to_string()));
        }
        Ok(cols)
    }

    fn extract_target(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let column = df
            .column(&self.target_column)
            .map_err(|_| BenchError::FeatureNotFound(self.target_column.clone()))?;

        let numeric = column.cast(&DataType::Float64)?;
        let numeric = numeric.f64()?;

        if numeric.null_count() == 0 {
            return Ok(numeric.into_iter().map(|v| v.unwrap_or_default()).collect());
        }

        // Find the first offending row for the diagnostic
        let raw = column.cast(&DataType::String)?;
        let raw = raw.str()?;
        for (row, (value, converted)) in raw.into_iter().zip(numeric.into_iter()).enumerate() {
            if converted.is_none() {
                return Err(BenchError::TargetConversion {
                    column: self.target_column.clone(),
                    row,
                    value: value.unwrap_or("<null>").to_string(),
                });
            }
        }

        Err(BenchError::TargetConversion {
            column: self.target_column.clone(),
            row: 0,
            value: "<unknown>".to_string(),
        })
    }

    /// Extract named columns into a row-major array, rejecting nulls and
    /// values that do not cast to `f64`.
    fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
        let n_rows = df.height();

        let col_data: Vec<Vec<f64>> = col_names
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| BenchError::FeatureNotFound(col_name.clone()))?;

                if matches!(column.dtype(), DataType::String) {
                    return Err(BenchError::NonNumericFeature {
                        column: col_name.clone(),
                        reason: "string column must be label-encoded first".to_string(),
                    });
                }
                if column.null_count() > 0 {
                    return Err(BenchError::NonNumericFeature {
                        column: col_name.clone(),
                        reason: format!("{} missing values", column.null_count()),
                    });
                }

                let cast = column.cast(&DataType::Float64)?;
                let values = cast.f64()?;
                if values.null_count() > 0 {
                    return Err(BenchError::NonNumericFeature {
                        column: col_name.clone(),
                        reason: "values do not convert to f64".to_string(),
                    });
                }
                Ok(values.into_iter().map(|v| v.unwrap_or_default()).collect())
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_refs[c][r]))
    }
}
