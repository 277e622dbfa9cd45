use std::fs;
use std::path::Path;

use budget_forecast::app::pipeline::{forecast_with_model, run_forecast, run_forecast_on};
use budget_forecast::domain::{
    ForecastConfig, ForecastHorizon, ForecastTarget, IngestOptions, InputLayout, ObservationRecord, RecordKind,
    TrainConfig,
};
use budget_forecast::error::SeriesError;
use budget_forecast::features::{FeatureBuilder, FeatureSchema, Vocabulary, group_series};
use budget_forecast::forecast::{assemble_timelines, forecast_all};
use budget_forecast::io::{IngestedData, read_model_json};
use budget_forecast::models::ForecastModel;
use pretty_assertions::assert_eq;

/// f = lag1 + (lag1 - lag2)
struct Trend {
    schema: FeatureSchema,
}

impl ForecastModel for Trend {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        row[1] + (row[1] - row[2])
    }
}

fn obs(entity: &str, variable: &str, year: i32, value: f64) -> ObservationRecord {
    ObservationRecord {
        entity: entity.to_string(),
        variable: variable.to_string(),
        year,
        value,
    }
}

fn config(csv: &Path, target: ForecastTarget, start: Option<i32>, end: i32) -> ForecastConfig {
    ForecastConfig {
        ingest: IngestOptions {
            csv_path: csv.to_path_buf(),
            layout: InputLayout::Auto,
            entity_column: None,
            variable_column: None,
        },
        target,
        horizon: ForecastHorizon {
            start_year: start,
            end_year: end,
        },
        train: TrainConfig::default(),
        include_fitted: false,
        load_model: None,
        save_model: None,
        export_timeline: None,
    }
}

fn city_observations() -> Vec<ObservationRecord> {
    let mut out = Vec::new();
    for (entity, base) in [("Austin", 400.0), ("Boston", 1000.0)] {
        for (variable, growth) in [("Fire", 10.0), ("Police", 25.0)] {
            for (i, year) in (2014..2022).enumerate() {
                out.push(obs(entity, variable, year, base + growth * i as f64));
            }
        }
    }
    out
}

#[test]
fn boston_police_timeline_continues_the_trend() {
    let observations = vec![
        obs("Boston", "Police", 2019, 100.0),
        obs("Boston", "Police", 2020, 105.0),
        obs("Boston", "Police", 2021, 110.0),
    ];
    let vocab = Vocabulary::from_observations(&observations);
    let builder = FeatureBuilder::new(&vocab);
    let model = Trend {
        schema: builder.schema().clone(),
    };
    let (series, failures) = group_series(&observations);
    assert!(failures.is_empty());

    let horizon = ForecastHorizon {
        start_year: Some(2022),
        end_year: 2023,
    };
    let outcome = forecast_all(&series, &model, &builder, &horizon, &ForecastTarget::All);
    assert!(outcome.failures.is_empty());

    let timelines = assemble_timelines(&observations, &outcome.records, None, &ForecastTarget::All);
    assert_eq!(timelines.len(), 1);
    let rows: Vec<(i32, f64, RecordKind)> = timelines[0]
        .records
        .iter()
        .map(|r| (r.year, r.actual.or(r.predicted).unwrap(), r.kind))
        .collect();
    assert_eq!(
        rows,
        vec![
            (2019, 100.0, RecordKind::Actual),
            (2020, 105.0, RecordKind::Actual),
            (2021, 110.0, RecordKind::Actual),
            (2022, 115.0, RecordKind::Predicted),
            (2023, 120.0, RecordKind::Predicted),
        ]
    );
}

#[test]
fn forecast_lags_chain_from_history_into_predictions() {
    let ingest = IngestedData::from_observations(city_observations()).unwrap();
    let run = run_forecast_on(&config(Path::new("unused.csv"), ForecastTarget::All, None, 2025), ingest).unwrap();

    assert!(run.failures.is_empty());
    assert_eq!(run.forecasts.len(), 4 * 4);
    for s in group_series(&run.ingest.observations).0 {
        let history: Vec<f64> = s.values().collect();
        let mine: Vec<_> = run
            .forecasts
            .iter()
            .filter(|f| f.entity == s.entity && f.variable == s.variable)
            .collect();
        assert_eq!(mine[0].year, 2022);
        assert_eq!(mine[0].lag1, history[history.len() - 1]);
        assert_eq!(mine[0].lag2, history[history.len() - 2]);
        for pair in mine.windows(2) {
            assert_eq!(pair[1].lag1, pair[0].predicted);
            assert_eq!(pair[1].lag2, pair[0].lag1);
        }
    }
}

#[test]
fn repeated_runs_are_bit_identical() {
    let cfg = config(Path::new("unused.csv"), ForecastTarget::All, Some(2022), 2024);
    let a = run_forecast_on(&cfg, IngestedData::from_observations(city_observations()).unwrap()).unwrap();
    let b = run_forecast_on(&cfg, IngestedData::from_observations(city_observations()).unwrap()).unwrap();
    assert_eq!(a.forecasts, b.forecasts);
    assert_eq!(a.timelines, b.timelines);
}

#[test]
fn short_series_is_skipped_without_affecting_siblings() {
    let mut observations = city_observations();
    observations.push(obs("Cleveland", "Police", 2021, 300.0));
    let ingest = IngestedData::from_observations(observations).unwrap();

    let run = run_forecast_on(&config(Path::new("unused.csv"), ForecastTarget::All, None, 2023), ingest).unwrap();
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].entity, "Cleveland");
    assert_eq!(run.failures[0].error, SeriesError::InsufficientHistory { observations: 1 });
    assert_eq!(run.forecasts.len(), 4 * 2);

    let lengths = run.lengths.unwrap();
    assert!(!lengths.is_uniform());
    assert_eq!(lengths.deviating, vec![("Cleveland".to_string(), "Police".to_string(), 1)]);
}

#[test]
fn all_zero_history_forecasts_zero_with_a_trained_model() {
    let mut observations = city_observations();
    observations.push(obs("Denver", "Parks", 2020, 0.0));
    observations.push(obs("Denver", "Parks", 2021, 0.0));
    let ingest = IngestedData::from_observations(observations).unwrap();

    let run = run_forecast_on(&config(Path::new("unused.csv"), ForecastTarget::All, None, 2024), ingest).unwrap();
    let denver: Vec<f64> = run
        .forecasts
        .iter()
        .filter(|f| f.entity == "Denver")
        .map(|f| f.predicted)
        .collect();
    assert_eq!(denver, vec![0.0, 0.0, 0.0]);
}

#[test]
fn loaded_model_with_other_vocabulary_fails_per_series() {
    let ingest = IngestedData::from_observations(city_observations()).unwrap();
    let cfg = config(Path::new("unused.csv"), ForecastTarget::All, None, 2023);
    let trained = run_forecast_on(&cfg, ingest).unwrap().model;

    // Same cities, plus a variable the model never saw.
    let mut observations = city_observations();
    observations.push(obs("Austin", "Library", 2020, 10.0));
    observations.push(obs("Austin", "Library", 2021, 12.0));
    let run = forecast_with_model(&cfg, IngestedData::from_observations(observations).unwrap(), trained).unwrap();

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].error, SeriesError::UnknownVariable("Library".to_string()));
    assert_eq!(run.forecasts.len(), 4 * 2);
}

#[test]
fn csv_run_exports_timeline_and_reloads_model() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("budget.csv");
    let model_path = dir.path().join("model.json");
    let export_path = dir.path().join("timeline.csv");

    let mut csv = String::from("City,Category,Fiscal Year,Budget\n");
    for o in city_observations() {
        csv.push_str(&format!("{},{},{},\"${:.2}\"\n", o.entity, o.variable, o.year, o.value));
    }
    fs::write(&csv_path, csv).unwrap();

    let mut cfg = config(&csv_path, ForecastTarget::Entity("Boston".into()), Some(2022), 2023);
    cfg.save_model = Some(model_path.clone());
    cfg.export_timeline = Some(export_path.clone());
    cfg.include_fitted = true;
    let first = run_forecast(&cfg).unwrap();

    assert_eq!(first.forecasts.len(), 2 * 2);
    assert!(first.forecasts.iter().all(|f| f.entity == "Boston"));

    let exported = fs::read_to_string(&export_path).unwrap();
    let mut lines = exported.lines();
    assert_eq!(lines.next(), Some("entity,variable,year,actual,predicted,kind"));
    // 8 historical + 2 forecast rows per variable.
    assert_eq!(lines.count(), 2 * 10);

    let model = read_model_json(&model_path).unwrap();
    assert_eq!(model, first.model);

    let mut reload = config(&csv_path, ForecastTarget::Entity("Boston".into()), Some(2022), 2023);
    reload.load_model = Some(model_path);
    let second = run_forecast(&reload).unwrap();
    assert_eq!(second.forecasts, first.forecasts);
}

#[test]
fn absurd_year_cell_is_a_row_error_and_the_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("budget.csv");
    fs::write(
        &csv_path,
        "entity,variable,year,value\nA,x,2019,1\nA,x,2020,2\nA,x,1e12,3\nA,x,2021,4\n",
    )
    .unwrap();

    let run = run_forecast(&config(&csv_path, ForecastTarget::All, None, 2023)).unwrap();
    assert_eq!(run.ingest.row_errors.len(), 1);
    assert_eq!(run.ingest.row_errors[0].line, 4);
    let years: Vec<i32> = run.forecasts.iter().map(|f| f.year).collect();
    assert_eq!(years, vec![2022, 2023]);
}
