//! Regressor dispatch and the prediction seam used by the forecaster.
//!
//! The forecaster only needs two things from a model: the schema it was fit
//! against and a way to score one flattened feature row. [`ForecastModel`]
//! captures exactly that, so trained ensembles, the linear baseline, and
//! hand-written models in tests are interchangeable.

use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::features::FeatureSchema;
use crate::models::gbm::{GbmParams, GradientBoostedRegressor};
use crate::models::linear::LinearRegressor;

/// Read-only model shared across forecast series.
pub trait ForecastModel: Sync {
    /// Column layout the model was fit against.
    fn schema(&self) -> &FeatureSchema;

    /// Score one row laid out according to [`ForecastModel::schema`].
    fn predict_row(&self, row: &[f64]) -> f64;
}

/// A fitted regressor of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Regressor {
    Gbm(GradientBoostedRegressor),
    Linear(LinearRegressor),
}

impl Regressor {
    pub fn fit(kind: ModelKind, x: &[Vec<f64>], y: &[f64]) -> Result<Self, AppError> {
        match kind {
            ModelKind::Gbm => Ok(Regressor::Gbm(GradientBoostedRegressor::fit(
                x,
                y,
                &GbmParams::default(),
            )?)),
            ModelKind::Linear => Ok(Regressor::Linear(LinearRegressor::fit(x, y)?)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Regressor::Gbm(_) => ModelKind::Gbm,
            Regressor::Linear(_) => ModelKind::Linear,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Regressor::Gbm(m) => m.predict(row),
            Regressor::Linear(m) => m.predict(row),
        }
    }
}
