//! Series grouping and lag feature construction.
//!
//! Lags are always computed from a row's position within *its own* sorted
//! (entity, variable) series. The first two positions use `0.0` as a
//! "no history" sentinel:
//!
//! | position | lag1        | lag2        |
//! |----------|-------------|-------------|
//! | 0        | 0           | 0           |
//! | 1        | value[0]    | 0           |
//! | i >= 2   | value[i-1]  | value[i-2]  |

use std::collections::{BTreeMap, HashMap};

use crate::domain::{EntitySeries, ObservationRecord};
use crate::error::{SeriesError, SeriesFailure};
use crate::features::{FeatureSchema, FeatureVector, Vocabulary};

/// One supervised example: features for a year and the value observed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub entity: String,
    pub variable: String,
    pub year: i32,
    pub features: FeatureVector,
    pub target: f64,
}

/// Builds feature vectors against one fixed vocabulary.
#[derive(Debug, Clone)]
pub struct FeatureBuilder<'a> {
    vocabulary: &'a Vocabulary,
    schema: FeatureSchema,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self {
            vocabulary,
            schema: FeatureSchema::for_vocabulary(vocabulary),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.vocabulary
    }

    /// Column layout of every vector this builder produces.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn vector(&self, variable: &str, year: i32, lag1: f64, lag2: f64) -> Result<FeatureVector, SeriesError> {
        Ok(FeatureVector {
            year,
            lag1,
            lag2,
            variable_onehot: self.vocabulary.one_hot(variable)?,
        })
    }

    /// One training row per observation of `series`.
    pub fn series_rows(&self, series: &EntitySeries) -> Result<Vec<TrainingRow>, SeriesError> {
        let values: Vec<f64> = series.values().collect();
        series
            .observations
            .iter()
            .enumerate()
            .map(|(position, obs)| {
                let (lag1, lag2) = boundary_lags(&values, position);
                Ok(TrainingRow {
                    entity: obs.entity.clone(),
                    variable: obs.variable.clone(),
                    year: obs.year,
                    features: self.vector(&obs.variable, obs.year, lag1, lag2)?,
                    target: obs.value,
                })
            })
            .collect()
    }
}

/// `(lag1, lag2)` for `position` within one series' values.
pub fn boundary_lags(values: &[f64], position: usize) -> (f64, f64) {
    let lag1 = position
        .checked_sub(1)
        .and_then(|i| values.get(i))
        .copied()
        .unwrap_or(0.0);
    let lag2 = position
        .checked_sub(2)
        .and_then(|i| values.get(i))
        .copied()
        .unwrap_or(0.0);
    (lag1, lag2)
}

/// Group observations into per-(entity, variable) series sorted by year.
///
/// Series containing a repeated year are returned as failures instead.
pub fn group_series(observations: &[ObservationRecord]) -> (Vec<EntitySeries>, Vec<SeriesFailure>) {
    let mut groups: BTreeMap<(&str, &str), Vec<ObservationRecord>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.entity.as_str(), obs.variable.as_str()))
            .or_default()
            .push(obs.clone());
    }

    let mut series = Vec::with_capacity(groups.len());
    let mut failures = Vec::new();
    for ((entity, variable), mut records) in groups {
        records.sort_by_key(|r| r.year);
        if let Some(pair) = records.windows(2).find(|w| w[0].year == w[1].year) {
            failures.push(SeriesFailure::new(entity, variable, SeriesError::DuplicateYear(pair[0].year)));
            continue;
        }
        series.push(EntitySeries {
            entity: entity.to_string(),
            variable: variable.to_string(),
            observations: records,
        });
    }
    (series, failures)
}

/// Length consistency across series.
///
/// Lags never depend on series length, but uneven histories usually point at
/// gaps in the source table, so they are surfaced.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLengthReport {
    pub min_len: usize,
    pub max_len: usize,
    /// Most common length (ties resolve to the longer length).
    pub typical_len: usize,
    /// `(entity, variable, len)` for every series whose length differs from `typical_len`.
    pub deviating: Vec<(String, String, usize)>,
}

impl SeriesLengthReport {
    pub fn is_uniform(&self) -> bool {
        self.deviating.is_empty()
    }
}

pub fn check_series_lengths(series: &[EntitySeries]) -> Option<SeriesLengthReport> {
    let min_len = series.iter().map(EntitySeries::len).min()?;
    let max_len = series.iter().map(EntitySeries::len).max()?;

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for s in series {
        *counts.entry(s.len()).or_default() += 1;
    }
    let typical_len = counts
        .iter()
        .max_by_key(|&(len, count)| (*count, *len))
        .map(|(len, _)| *len)
        .unwrap_or(max_len);

    let deviating = series
        .iter()
        .filter(|s| s.len() != typical_len)
        .map(|s| (s.entity.clone(), s.variable.clone(), s.len()))
        .collect();

    Some(SeriesLengthReport {
        min_len,
        max_len,
        typical_len,
        deviating,
    })
}
