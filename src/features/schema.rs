//! Feature vectors and the ordered column schema they must follow.
//!
//! Column order is `[year, lag1, lag2, variable_<v1> .. variable_<vk>]`, where the
//! one-hot block follows the vocabulary order. The schema recorded at training
//! time is the reference every later vector is checked against.

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::features::Vocabulary;

pub const YEAR_COLUMN: &str = "year";
pub const LAG1_COLUMN: &str = "lag1";
pub const LAG2_COLUMN: &str = "lag2";
pub const ONE_HOT_PREFIX: &str = "variable_";

/// Model input for one (entity, variable, year).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub year: i32,
    pub lag1: f64,
    pub lag2: f64,
    pub variable_onehot: Vec<f64>,
}

impl FeatureVector {
    /// Number of columns this vector occupies.
    pub fn width(&self) -> usize {
        3 + self.variable_onehot.len()
    }

    /// Flatten in schema order.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        row.push(f64::from(self.year));
        row.push(self.lag1);
        row.push(self.lag2);
        row.extend_from_slice(&self.variable_onehot);
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn for_vocabulary(vocabulary: &Vocabulary) -> Self {
        let mut columns = vec![
            YEAR_COLUMN.to_string(),
            LAG1_COLUMN.to_string(),
            LAG2_COLUMN.to_string(),
        ];
        columns.extend(
            vocabulary
                .categories()
                .iter()
                .map(|c| format!("{ONE_HOT_PREFIX}{c}")),
        );
        Self { columns }
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Verify that `vector`, built under `layout`, matches this schema exactly.
    ///
    /// Both the column identifiers (in order) and the vector width must agree;
    /// nothing is reordered or padded.
    pub fn check(&self, layout: &FeatureSchema, vector: &FeatureVector) -> Result<(), SeriesError> {
        if layout.columns != self.columns {
            return Err(SeriesError::SchemaMismatch {
                expected: self.columns.clone(),
                found: layout.columns.clone(),
            });
        }
        if vector.width() != self.columns.len() {
            let found = (0..vector.width())
                .map(|i| {
                    layout
                        .columns
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("column_{i}"))
                })
                .collect();
            return Err(SeriesError::SchemaMismatch {
                expected: self.columns.clone(),
                found,
            });
        }
        Ok(())
    }
}
