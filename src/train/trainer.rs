//! Fit a regressor on lag features and bundle it with its schema.
//!
//! Given the grouped series, a fixed vocabulary and a training scope:
//! - every in-scope series is expanded into training rows (boundary lags included)
//! - rows are split into a seeded hold-out
//! - the regressor is fit on the training side and scored on the hold-out
//!
//! The hold-out error is a diagnostic only; the fitted model is returned
//! regardless of its value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{EntitySeries, ModelKind, TrainConfig, TrainScope};
use crate::error::AppError;
use crate::features::{FeatureBuilder, FeatureSchema, TrainingRow, Vocabulary};
use crate::models::{ForecastModel, Regressor};
use crate::train::split::train_test_split;

/// Hold-out diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub n_train: usize,
    pub n_test: usize,
    /// `None` when no rows were held out.
    pub mse: Option<f64>,
    pub rmse: Option<f64>,
}

/// A fitted model plus everything needed to build valid inputs for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub regressor: Regressor,
    pub schema: FeatureSchema,
    pub vocabulary: Vocabulary,
    pub scope: TrainScope,
    pub report: TrainReport,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.regressor.kind()
    }
}

impl ForecastModel for TrainedModel {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.regressor.predict(row)
    }
}

/// Collect training rows for every series inside `scope`.
///
/// Series whose rows cannot be built are skipped with a warning.
pub fn collect_training_rows(
    series: &[EntitySeries],
    builder: &FeatureBuilder<'_>,
    scope: &TrainScope,
) -> Vec<TrainingRow> {
    let mut rows = Vec::new();
    for s in series.iter().filter(|s| scope.includes(&s.entity)) {
        match builder.series_rows(s) {
            Ok(mut r) => rows.append(&mut r),
            Err(err) => warn!(entity = %s.entity, variable = %s.variable, %err, "skipping series in training"),
        }
    }
    rows
}

pub fn train_model(
    series: &[EntitySeries],
    vocabulary: &Vocabulary,
    scope: &TrainScope,
    config: &TrainConfig,
) -> Result<TrainedModel, AppError> {
    let builder = FeatureBuilder::new(vocabulary);
    let rows = collect_training_rows(series, &builder, scope);
    if rows.is_empty() {
        return Err(AppError::new(
            3,
            format!("No training rows for {}.", scope.label()),
        ));
    }

    let x: Vec<Vec<f64>> = rows.iter().map(|r| r.features.to_row()).collect();
    let y: Vec<f64> = rows.iter().map(|r| r.target).collect();

    let split = train_test_split(rows.len(), config.test_fraction, config.seed);
    let x_train: Vec<Vec<f64>> = split.train.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();

    let regressor = Regressor::fit(config.model, &x_train, &y_train)?;

    let mse = if split.test.is_empty() {
        None
    } else {
        let sse: f64 = split
            .test
            .iter()
            .map(|&i| {
                let e = y[i] - regressor.predict(&x[i]);
                e * e
            })
            .sum();
        Some(sse / split.test.len() as f64)
    };
    let report = TrainReport {
        n_train: split.train.len(),
        n_test: split.test.len(),
        mse,
        rmse: mse.map(f64::sqrt),
    };

    info!(
        model = config.model.display_name(),
        scope = %scope.label(),
        n_train = report.n_train,
        n_test = report.n_test,
        rmse = ?report.rmse,
        "trained model"
    );

    Ok(TrainedModel {
        regressor,
        schema: builder.schema().clone(),
        vocabulary: vocabulary.clone(),
        scope: scope.clone(),
        report,
        trained_at: Utc::now(),
    })
}
