//! Shared forecast pipeline used by the CLI commands and the integration tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> group series -> vocabulary -> train (or load) -> forecast -> assemble
//!
//! The `*_on` / `*_with` entry points take data already in memory and never touch
//! the filesystem; `run_forecast` wraps them with file ingest and exports.

use tracing::{info, warn};

use crate::domain::{EntitySeries, ForecastConfig, ForecastRecord, ForecastTarget, Timeline, TrainConfig};
use crate::error::{AppError, SeriesFailure};
use crate::features::{FeatureBuilder, SeriesLengthReport, Vocabulary, check_series_lengths, group_series};
use crate::forecast::{ForecastOutcome, assemble_timelines, fitted_all, forecast_all};
use crate::io::ingest::{IngestedData, load_observations};
use crate::io::{read_model_json, write_model_json, write_timeline_csv};
use crate::train::{TrainedModel, train_model};

/// All computed outputs of a single `budget forecast` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub model: TrainedModel,
    pub forecasts: Vec<ForecastRecord>,
    /// In-sample predictions (only when requested).
    pub fitted: Option<Vec<ForecastRecord>>,
    /// Every skipped series: grouping problems first, then forecast failures.
    pub failures: Vec<SeriesFailure>,
    pub lengths: Option<SeriesLengthReport>,
    pub timelines: Vec<Timeline>,
}

/// Execute the full pipeline: read the CSV, train or load, forecast, export.
pub fn run_forecast(config: &ForecastConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let ingest = load_observations(&config.ingest)?;

    let run = match &config.load_model {
        Some(path) => {
            let model = read_model_json(path)?;
            forecast_with_model(config, ingest, model)?
        }
        None => run_forecast_on(config, ingest)?,
    };

    if let Some(path) = &config.save_model {
        write_model_json(path, &run.model)?;
    }
    if let Some(path) = &config.export_timeline {
        write_timeline_csv(path, &run.timelines)?;
    }
    Ok(run)
}

/// Train on `ingest` and forecast. No filesystem access.
pub fn run_forecast_on(config: &ForecastConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let model = train_on(&ingest, &config.target, &config.train)?;
    forecast_with_model(config, ingest, model)
}

/// Train a model on `ingest` for `target`. No filesystem access.
///
/// The vocabulary always spans the whole dataset, whatever the scope.
pub fn train_on(ingest: &IngestedData, target: &ForecastTarget, config: &TrainConfig) -> Result<TrainedModel, AppError> {
    validate_train_config(config)?;
    let (series, failures) = group_series(&ingest.observations);
    for f in &failures {
        warn!(entity = %f.entity, variable = %f.variable, error = %f.error, "series excluded from training");
    }
    ensure_target_present(&series, target)?;

    let vocabulary = Vocabulary::from_observations(&ingest.observations);
    let scope = target.train_scope(config.scope_mode);
    train_model(&series, &vocabulary, &scope, config)
}

/// Forecast with an already trained (or loaded) model. No filesystem access.
pub fn forecast_with_model(
    config: &ForecastConfig,
    ingest: IngestedData,
    model: TrainedModel,
) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    let (series, group_failures) = group_series(&ingest.observations);
    ensure_target_present(&series, &config.target)?;

    let lengths = check_series_lengths(&series);
    if let Some(report) = lengths.as_ref().filter(|r| !r.is_uniform()) {
        warn!(
            typical = report.typical_len,
            min = report.min_len,
            max = report.max_len,
            deviating = report.deviating.len(),
            "series lengths differ"
        );
    }

    let builder = FeatureBuilder::new(&model.vocabulary);
    let ForecastOutcome { records, failures } =
        forecast_all(&series, &model, &builder, &config.horizon, &config.target);

    let mut all_failures: Vec<SeriesFailure> = group_failures
        .into_iter()
        .filter(|f| config.target.matches(&f.entity))
        .collect();
    all_failures.extend(failures);

    let fitted = if config.include_fitted {
        let outcome = fitted_all(&series, &model, &builder, &config.target);
        // A series that already failed its forecast is reported once.
        for f in outcome.failures {
            if !all_failures
                .iter()
                .any(|seen| seen.entity == f.entity && seen.variable == f.variable)
            {
                all_failures.push(f);
            }
        }
        Some(outcome.records)
    } else {
        None
    };

    let timelines = assemble_timelines(&ingest.observations, &records, fitted.as_deref(), &config.target);
    info!(
        timelines = timelines.len(),
        forecasts = records.len(),
        skipped = all_failures.len(),
        "assembled timelines"
    );

    Ok(RunOutput {
        ingest,
        model,
        forecasts: records,
        fitted,
        failures: all_failures,
        lengths,
        timelines,
    })
}

fn validate_config(config: &ForecastConfig) -> Result<(), AppError> {
    if let Some(start) = config.horizon.start_year {
        if start > config.horizon.end_year {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid year range: start year {start} is after end year {}.",
                    config.horizon.end_year
                ),
            ));
        }
    }
    validate_train_config(&config.train)
}

fn validate_train_config(config: &TrainConfig) -> Result<(), AppError> {
    if !(config.test_fraction.is_finite() && (0.0..1.0).contains(&config.test_fraction)) {
        return Err(AppError::new(
            2,
            format!("Invalid test fraction {} (expected 0 <= f < 1).", config.test_fraction),
        ));
    }
    Ok(())
}

fn ensure_target_present(series: &[EntitySeries], target: &ForecastTarget) -> Result<(), AppError> {
    match target {
        ForecastTarget::Entity(name) if !series.iter().any(|s| &s.entity == name) => Err(AppError::new(
            3,
            format!("Entity '{name}' not found in the input."),
        )),
        _ if series.is_empty() => Err(AppError::new(3, "No usable series in the input.")),
        _ => Ok(()),
    }
}
