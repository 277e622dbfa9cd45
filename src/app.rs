//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - converts them into plain pipeline configs
//! - prints reports and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ForecastArgs, InputArgs, ModelArgs, ShowModelArgs, TrainArgs};
use crate::domain::{ForecastConfig, ForecastHorizon, ForecastTarget, IngestOptions, TrainConfig};
use crate::error::AppError;

pub mod pipeline;

/// Env var that overrides `--log-level`.
pub const LOG_ENV: &str = "BUDGET_FORECAST_LOG";

/// Entry point for the `budget` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Forecast(args) => handle_forecast(&args),
        Command::Train(args) => handle_train(&args),
        Command::ShowModel(args) => handle_show_model(&args),
    }
}

fn init_tracing(level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::new(2, format!("Invalid log filter '{level}': {e}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::new(2, format!("Failed to initialize logging: {e}")))
}

fn handle_forecast(args: &ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(args);
    let run = pipeline::run_forecast(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.ingest,
            &run.model,
            &config.target,
            &config.horizon,
            &run.failures,
            run.lengths.as_ref(),
        )
    );
    println!("{}", crate::report::format_timelines(&run.timelines));
    Ok(())
}

fn handle_train(args: &TrainArgs) -> Result<(), AppError> {
    let ingest = crate::io::load_observations(&ingest_options_from_args(&args.source))?;
    let target = ForecastTarget::from_option(args.entity.as_deref());
    let model = pipeline::train_on(&ingest, &target, &train_config_from_args(&args.training))?;
    crate::io::write_model_json(&args.save_model, &model)?;

    println!("{}", crate::report::format_model_summary(&model));
    println!("Saved model to {}", args.save_model.display());
    Ok(())
}

fn handle_show_model(args: &ShowModelArgs) -> Result<(), AppError> {
    let model = crate::io::read_model_json(&args.model)?;
    println!("{}", crate::report::format_model_summary(&model));
    Ok(())
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    ForecastConfig {
        ingest: ingest_options_from_args(&args.source),
        target: ForecastTarget::from_option(args.entity.as_deref()),
        horizon: ForecastHorizon {
            start_year: args.start_year,
            end_year: args.end_year,
        },
        train: train_config_from_args(&args.training),
        include_fitted: args.fitted,
        load_model: args.load_model.clone(),
        save_model: args.save_model.clone(),
        export_timeline: args.export.clone(),
    }
}

fn ingest_options_from_args(args: &InputArgs) -> IngestOptions {
    IngestOptions {
        csv_path: args.input.clone(),
        layout: args.layout,
        entity_column: args.entity_column.clone(),
        variable_column: args.variable_column.clone(),
    }
}

fn train_config_from_args(args: &ModelArgs) -> TrainConfig {
    TrainConfig {
        model: args.model,
        scope_mode: args.train_scope,
        test_fraction: args.test_fraction,
        seed: args.seed,
    }
}
