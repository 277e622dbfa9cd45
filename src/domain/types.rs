//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while training and forecasting
//! - exported to CSV/JSON for chart and report consumers
//! - reloaded later alongside a saved model

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Shape of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InputLayout {
    /// Detect the layout from the header row.
    Auto,
    /// Explicit `entity, variable, year, value` columns.
    Long,
    /// `variable, year` columns followed by one column per entity.
    WideEntities,
    /// Identifier columns followed by one column per fiscal year (`FY22 ...`).
    WideYears,
}

/// Which regressor to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Gradient-boosted regression trees (least-squares loss).
    Gbm,
    /// Ordinary least squares over the same feature columns.
    Linear,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Gbm => "Gradient boosting",
            ModelKind::Linear => "Linear (OLS)",
        }
    }
}

/// Which rows the trainer sees, relative to the forecast target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Train on the forecast target only (all entities when the target is "all").
    Target,
    /// Train on every entity regardless of the forecast target.
    All,
}

/// Resolved training scope recorded in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainScope {
    All,
    Entity(String),
}

impl TrainScope {
    pub fn includes(&self, entity: &str) -> bool {
        match self {
            TrainScope::All => true,
            TrainScope::Entity(name) => name == entity,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TrainScope::All => "all entities".to_string(),
            TrainScope::Entity(name) => format!("entity '{name}'"),
        }
    }
}

/// Which entities get forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastTarget {
    All,
    Entity(String),
}

impl ForecastTarget {
    pub fn from_option(entity: Option<&str>) -> Self {
        match entity {
            Some(name) if !name.eq_ignore_ascii_case("all") => ForecastTarget::Entity(name.to_string()),
            _ => ForecastTarget::All,
        }
    }

    pub fn matches(&self, entity: &str) -> bool {
        match self {
            ForecastTarget::All => true,
            ForecastTarget::Entity(name) => name == entity,
        }
    }

    /// Training scope implied by this target under `mode`.
    pub fn train_scope(&self, mode: ScopeMode) -> TrainScope {
        match (self, mode) {
            (ForecastTarget::Entity(name), ScopeMode::Target) => TrainScope::Entity(name.clone()),
            _ => TrainScope::All,
        }
    }
}

/// One cleaned `(entity, variable, year, value)` observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub entity: String,
    pub variable: String,
    pub year: i32,
    pub value: f64,
}

/// All observations of one (entity, variable) pair, strictly increasing in year.
///
/// Constructed through `features::group_series`, which enforces the ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySeries {
    pub entity: String,
    pub variable: String,
    pub observations: Vec<ObservationRecord>,
}

impl EntitySeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.observations.last().map(|o| o.year)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }
}

/// One generated future value, with the lags that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub entity: String,
    pub variable: String,
    pub year: i32,
    pub predicted: f64,
    pub lag1: f64,
    pub lag2: f64,
}

/// Whether a timeline row is historical or generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Actual,
    Predicted,
}

/// Flat output row consumed by chart/report collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub entity: String,
    pub variable: String,
    pub year: i32,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub kind: RecordKind,
}

/// History plus forecast for one entity, sorted by (variable, year).
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entity: String,
    pub records: Vec<TimelineRecord>,
}

/// Requested forecast years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastHorizon {
    /// First requested year; `None` means "the year after each series' history".
    pub start_year: Option<i32>,
    /// Last requested year (inclusive).
    pub end_year: i32,
}

impl ForecastHorizon {
    /// First year to forecast for a series whose history ends at `last_year`.
    ///
    /// `None` when no year after `last_year` is representable.
    pub fn first_forecast_year(&self, last_year: i32) -> Option<i32> {
        let after_history = last_year.checked_add(1)?;
        Some(match self.start_year {
            Some(start) => start.max(after_history),
            None => after_history,
        })
    }
}

/// How to read the input table.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub csv_path: PathBuf,
    pub layout: InputLayout,
    /// Entity column for `wide-years` (defaults to the first identifier column).
    pub entity_column: Option<String>,
    /// Variable column for `wide-years` (defaults to the second identifier column).
    pub variable_column: Option<String>,
}

/// Trainer settings.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub model: ModelKind,
    pub scope_mode: ScopeMode,
    /// Fraction of rows held out for the diagnostic error.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Gbm,
            scope_mode: ScopeMode::Target,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// A full `budget forecast` run as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub ingest: IngestOptions,
    pub target: ForecastTarget,
    pub horizon: ForecastHorizon,
    pub train: TrainConfig,

    /// Attach in-sample predictions to historical timeline rows.
    pub include_fitted: bool,

    pub load_model: Option<PathBuf>,
    pub save_model: Option<PathBuf>,
    pub export_timeline: Option<PathBuf>,
}
