//! Label encoding for categorical columns

use crate::error::{BenchError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Ordinal label encoder.
///
/// Each column gets its own mapping from category to integer code, with
/// categories numbered in lexicographic order. Mappings are never shared
/// between columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    // column name -> (category -> code)
    mappings: HashMap<String, HashMap<String, usize>>,
    // column name -> categories ordered by code
    classes: HashMap<String, Vec<String>>,
    columns: Vec<String>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn one category mapping per column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.mappings.clear();
        self.classes.clear();
        self.columns = columns.to_vec();

        for col_name in columns {
            let categories = Self::categories(df, col_name)?;
            let mapping = categories
                .iter()
                .enumerate()
                .map(|(code, cat)| (cat.clone(), code))
                .collect();
            self.mappings.insert(col_name.clone(), mapping);
            self.classes.insert(col_name.clone(), categories);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace every fitted column with its integer codes (as `f64`)
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BenchError::ModelNotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let mapping = &self.mappings[col_name];
            let column = df
                .column(col_name)
                .map_err(|_| BenchError::FeatureNotFound(col_name.clone()))?;
            let as_str = column.cast(&DataType::String)?;

            let codes = as_str
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or_else(|| {
                        BenchError::DataError(format!(
                            "column '{}' has a missing value at row {}",
                            col_name, row
                        ))
                    })?;
                    mapping.get(value).map(|&c| c as f64).ok_or_else(|| {
                        BenchError::DataError(format!(
                            "column '{}' has unseen category '{}'",
                            col_name, value
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;

            result.with_column(Series::new(col_name.as_str().into(), codes))?;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Categories of a fitted column, ordered by code
    pub fn classes(&self, column: &str) -> Option<&[String]> {
        self.classes.get(column).map(|c| c.as_slice())
    }

    fn categories(df: &DataFrame, col_name: &str) -> Result<Vec<String>> {
        let column = df
            .column(col_name)
            .map_err(|_| BenchError::FeatureNotFound(col_name.to_string()))?;
        let as_str = column.cast(&DataType::String)?;

        let mut unique = BTreeSet::new();
        for value in as_str.str()?.into_iter() {
            match value {
                Some(v) => {
                    unique.insert(v.to_string());
                }
                None => {
                    return Err(BenchError::DataError(format!(
                        "column '{}' contains missing values",
                        col_name
                    )))
                }
            }
        }
        Ok(unique.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "color" => &["red", "blue", "red", "green"],
            "size" => &["S", "L", "M", "S"],
            "price" => &[1.0, 2.0, 3.0, 4.0]
        )
        .unwrap()
    }

    #[test]
    fn test_codes_are_sorted_per_column() {
        let df = frame();
        let mut enc = LabelEncoder::new();
        let out = enc
            .fit_transform(&df, &["color".to_string(), "size".to_string()])
            .unwrap();

        let color: Vec<f64> = out.column("color").unwrap().f64().unwrap().into_no_null_iter().collect();
        // blue=0, green=1, red=2
        assert_eq!(color, vec![2.0, 0.0, 2.0, 1.0]);

        let size: Vec<f64> = out.column("size").unwrap().f64().unwrap().into_no_null_iter().collect();
        // L=0, M=1, S=2
        assert_eq!(size, vec![2.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_each_column_keeps_its_own_mapping() {
        let df = frame();
        let mut enc = LabelEncoder::new();
        enc.fit(&df, &["color".to_string(), "size".to_string()]).unwrap();

        assert_eq!(enc.classes("color").unwrap(), &["blue", "green", "red"]);
        assert_eq!(enc.classes("size").unwrap(), &["L", "M", "S"]);
    }

    #[test]
    fn test_unseen_category_fails() {
        let mut enc = LabelEncoder::new();
        enc.fit(&frame(), &["color".to_string()]).unwrap();

        let other = df!("color" => &["purple"], "price" => &[1.0]).unwrap();
        assert!(enc.transform(&other).is_err());
    }

    #[test]
    fn test_transform_before_fit() {
        let enc = LabelEncoder::new();
        assert!(matches!(enc.transform(&frame()), Err(BenchError::ModelNotFitted)));
    }
}
