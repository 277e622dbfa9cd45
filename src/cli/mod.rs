//! Command-line parsing for the budget forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the feature/model/forecast code. Nothing outside `app` sees
//! these types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{InputLayout, ModelKind, ScopeMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "budget", version, about = "Recursive municipal budget forecaster")]
pub struct Cli {
    /// Log filter used when `BUDGET_FORECAST_LOG` is unset (e.g. `info`, `debug`).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train (or load) a model, forecast, print the timeline, and optionally export.
    Forecast(ForecastArgs),
    /// Train a model and save it without forecasting.
    Train(TrainArgs),
    /// Print the schema, vocabulary, and diagnostics of a saved model.
    ShowModel(ShowModelArgs),
}

/// Where the budget table comes from and how it is shaped.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Budget CSV (long, wide-entities, or wide-years layout).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Input layout.
    #[arg(long, value_enum, default_value_t = InputLayout::Auto)]
    pub layout: InputLayout,

    /// Entity column for wide-years input.
    #[arg(long)]
    pub entity_column: Option<String>,

    /// Variable column for wide-years input.
    #[arg(long)]
    pub variable_column: Option<String>,
}

/// Training options shared by `forecast` and `train`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Which regressor to fit.
    #[arg(long, value_enum, default_value_t = ModelKind::Gbm)]
    pub model: ModelKind,

    /// Train on the forecast target only, or on every entity.
    #[arg(long, value_enum, default_value_t = ScopeMode::Target)]
    pub train_scope: ScopeMode,

    /// Fraction of training rows held out for the diagnostic error.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the hold-out shuffle.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: InputArgs,

    #[command(flatten)]
    pub training: ModelArgs,

    /// Entity to forecast, or "all".
    #[arg(short = 'e', long)]
    pub entity: Option<String>,

    /// First forecast year (defaults to the year after each series' history).
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last forecast year (inclusive).
    #[arg(long)]
    pub end_year: i32,

    /// Use a saved model instead of training.
    #[arg(long, value_name = "JSON", conflicts_with = "save_model")]
    pub load_model: Option<PathBuf>,

    /// Save the trained model as JSON.
    #[arg(long, value_name = "JSON")]
    pub save_model: Option<PathBuf>,

    /// Export the timeline to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Attach in-sample predictions to historical rows.
    #[arg(long)]
    pub fitted: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub source: InputArgs,

    #[command(flatten)]
    pub training: ModelArgs,

    /// Restrict training to one entity ("all" for every entity).
    #[arg(short = 'e', long)]
    pub entity: Option<String>,

    /// Where to write the model JSON.
    #[arg(long, value_name = "JSON")]
    pub save_model: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ShowModelArgs {
    /// Model JSON produced by `budget train` or `budget forecast --save-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::parse_from([
            "budget",
            "forecast",
            "--input",
            "budget.csv",
            "--entity",
            "Boston",
            "--start-year",
            "2022",
            "--end-year",
            "2025",
            "--model",
            "linear",
            "--train-scope",
            "all",
            "--layout",
            "wide-years",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.entity.as_deref(), Some("Boston"));
        assert_eq!(args.start_year, Some(2022));
        assert_eq!(args.end_year, 2025);
        assert_eq!(args.training.model, ModelKind::Linear);
        assert_eq!(args.training.train_scope, ScopeMode::All);
        assert_eq!(args.source.layout, InputLayout::WideYears);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn load_and_save_model_conflict() {
        let res = Cli::try_parse_from([
            "budget",
            "forecast",
            "-i",
            "b.csv",
            "--end-year",
            "2025",
            "--load-model",
            "a.json",
            "--save-model",
            "b.json",
        ]);
        assert!(res.is_err());
    }
}
