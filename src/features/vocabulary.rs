//! Fixed categorical vocabulary for the `variable` dimension.
//!
//! Built once from the whole dataset, before any feature vector exists, and then
//! threaded into every builder call. A saved model carries its own copy so a
//! reloaded model encodes variables exactly as it did during training.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::ObservationRecord;
use crate::error::SeriesError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredVocabulary")]
pub struct Vocabulary {
    categories: Vec<String>,
}

/// On-disk form; re-sorted and de-duplicated on load.
#[derive(Deserialize)]
struct StoredVocabulary {
    categories: Vec<String>,
}

impl From<StoredVocabulary> for Vocabulary {
    fn from(stored: StoredVocabulary) -> Self {
        Self::from_categories(stored.categories.iter().map(String::as_str))
    }
}

impl Vocabulary {
    /// Sorted, de-duplicated set of every variable in `observations`.
    pub fn from_observations(observations: &[ObservationRecord]) -> Self {
        Self::from_categories(observations.iter().map(|o| o.variable.as_str()))
    }

    pub fn from_categories<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        let set: BTreeSet<&str> = categories.into_iter().collect();
        Self {
            categories: set.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn index_of(&self, variable: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(variable))
            .ok()
    }

    /// One-hot encoding of `variable`; its length always equals `self.len()`.
    pub fn one_hot(&self, variable: &str) -> Result<Vec<f64>, SeriesError> {
        let idx = self
            .index_of(variable)
            .ok_or_else(|| SeriesError::UnknownVariable(variable.to_string()))?;
        let mut out = vec![0.0; self.categories.len()];
        out[idx] = 1.0;
        Ok(out)
    }
}
