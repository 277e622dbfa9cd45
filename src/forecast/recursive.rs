//! Recursive multi-step forecasting.
//!
//! Each (entity, variable) series is forecast independently. Within a series,
//! every step feeds its prediction back as the next step's `lag1`, so steps run
//! strictly in year order:
//!
//! ```text
//! (prev1, prev2) <- last two historical values
//! for y in first..=end:
//!     p = model([y, prev1, prev2, onehot])     (schema checked first)
//!     p = 0 if prev1 == prev2 == 0
//!     (prev1, prev2) <- (p, prev1)
//! ```
//!
//! Series are independent of one another and run on the rayon pool; results are
//! collected in input order.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{EntitySeries, ForecastHorizon, ForecastRecord, ForecastTarget};
use crate::error::{SeriesError, SeriesFailure};
use crate::features::{FeatureBuilder, FeatureVector, boundary_lags};
use crate::models::ForecastModel;

/// Two-value rolling lag state of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagBuffer {
    pub prev1: f64,
    pub prev2: f64,
}

impl LagBuffer {
    /// Seed from the last two historical values; `None` with fewer than two.
    pub fn from_history(values: &[f64]) -> Option<Self> {
        match values {
            [.., prev2, prev1] => Some(Self {
                prev1: *prev1,
                prev2: *prev2,
            }),
            _ => None,
        }
    }

    /// Both lags hold the "no history" sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.prev1 == 0.0 && self.prev2 == 0.0
    }

    #[must_use]
    pub fn roll(self, predicted: f64) -> Self {
        Self {
            prev1: predicted,
            prev2: self.prev1,
        }
    }
}

/// Per-series forecast results of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastOutcome {
    pub records: Vec<ForecastRecord>,
    pub failures: Vec<SeriesFailure>,
}

/// Score one vector after checking it against the model's schema.
///
/// The zero-override applies when both lags are the sentinel.
fn predict_checked<M>(model: &M, builder: &FeatureBuilder<'_>, vector: &FeatureVector) -> Result<f64, SeriesError>
where
    M: ForecastModel + ?Sized,
{
    model.schema().check(builder.schema(), vector)?;
    let raw = model.predict_row(&vector.to_row());
    let p = if vector.lag1 == 0.0 && vector.lag2 == 0.0 { 0.0 } else { raw };
    if !p.is_finite() {
        return Err(SeriesError::NonFinitePrediction(vector.year));
    }
    Ok(p)
}

/// Forecast one series from the year after its history through `horizon.end_year`.
pub fn forecast_series<M>(
    series: &EntitySeries,
    model: &M,
    builder: &FeatureBuilder<'_>,
    horizon: &ForecastHorizon,
) -> Result<Vec<ForecastRecord>, SeriesError>
where
    M: ForecastModel + ?Sized,
{
    let values: Vec<f64> = series.values().collect();
    let (Some(mut lags), Some(last_year)) = (LagBuffer::from_history(&values), series.last_year()) else {
        return Err(SeriesError::InsufficientHistory {
            observations: series.len(),
        });
    };

    let mut records = Vec::new();
    let Some(first) = horizon.first_forecast_year(last_year) else {
        return Ok(records);
    };
    for year in first..=horizon.end_year {
        let vector = builder.vector(&series.variable, year, lags.prev1, lags.prev2)?;
        let predicted = predict_checked(model, builder, &vector)?;
        debug!(
            entity = %series.entity,
            variable = %series.variable,
            year,
            lag1 = lags.prev1,
            lag2 = lags.prev2,
            predicted,
            "forecast step"
        );
        records.push(ForecastRecord {
            entity: series.entity.clone(),
            variable: series.variable.clone(),
            year,
            predicted,
            lag1: lags.prev1,
            lag2: lags.prev2,
        });
        lags = lags.roll(predicted);
    }
    Ok(records)
}

/// Model output over the historical rows of one series, using the training lags.
pub fn in_sample_predictions<M>(
    series: &EntitySeries,
    model: &M,
    builder: &FeatureBuilder<'_>,
) -> Result<Vec<ForecastRecord>, SeriesError>
where
    M: ForecastModel + ?Sized,
{
    let values: Vec<f64> = series.values().collect();
    series
        .observations
        .iter()
        .enumerate()
        .map(|(position, obs)| {
            let (lag1, lag2) = boundary_lags(&values, position);
            let vector = builder.vector(&series.variable, obs.year, lag1, lag2)?;
            Ok(ForecastRecord {
                entity: series.entity.clone(),
                variable: series.variable.clone(),
                year: obs.year,
                predicted: predict_checked(model, builder, &vector)?,
                lag1,
                lag2,
            })
        })
        .collect()
}

fn run_selected<F>(series: &[EntitySeries], target: &ForecastTarget, step: F) -> ForecastOutcome
where
    F: Fn(&EntitySeries) -> Result<Vec<ForecastRecord>, SeriesError> + Sync,
{
    let results: Vec<(&EntitySeries, Result<Vec<ForecastRecord>, SeriesError>)> = series
        .par_iter()
        .filter(|s| target.matches(&s.entity))
        .map(|s| (s, step(s)))
        .collect();

    let mut outcome = ForecastOutcome::default();
    for (s, result) in results {
        match result {
            Ok(mut records) => outcome.records.append(&mut records),
            Err(error) => {
                warn!(entity = %s.entity, variable = %s.variable, %error, "series skipped");
                outcome
                    .failures
                    .push(SeriesFailure::new(&s.entity, &s.variable, error));
            }
        }
    }
    outcome
}

/// Forecast every series selected by `target`.
///
/// A failing series is recorded in `failures`; its siblings are unaffected.
pub fn forecast_all<M>(
    series: &[EntitySeries],
    model: &M,
    builder: &FeatureBuilder<'_>,
    horizon: &ForecastHorizon,
    target: &ForecastTarget,
) -> ForecastOutcome
where
    M: ForecastModel + ?Sized,
{
    let outcome = run_selected(series, target, |s| forecast_series(s, model, builder, horizon));
    info!(
        records = outcome.records.len(),
        failures = outcome.failures.len(),
        end_year = horizon.end_year,
        "forecast complete"
    );
    outcome
}

/// In-sample predictions for every series selected by `target`.
pub fn fitted_all<M>(
    series: &[EntitySeries],
    model: &M,
    builder: &FeatureBuilder<'_>,
    target: &ForecastTarget,
) -> ForecastOutcome
where
    M: ForecastModel + ?Sized,
{
    run_selected(series, target, |s| in_sample_predictions(s, model, builder))
}
