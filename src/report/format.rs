//! Formatted terminal output: run summary, model card, and timeline tables.
//!
//! We keep formatting code in one place so:
//! - the training/forecasting code stays free of presentation concerns
//! - output changes are localized

use crate::domain::{ForecastHorizon, ForecastTarget, RecordKind, Timeline};
use crate::error::SeriesFailure;
use crate::features::SeriesLengthReport;
use crate::io::ingest::IngestedData;
use crate::train::TrainedModel;

/// How many row-level ingest problems are listed before summarizing.
const MAX_ROW_ERRORS: usize = 10;

/// Format the run summary (dataset stats + model diagnostics + series problems).
pub fn format_run_summary(
    ingest: &IngestedData,
    model: &TrainedModel,
    target: &ForecastTarget,
    horizon: &ForecastHorizon,
    failures: &[SeriesFailure],
    lengths: Option<&SeriesLengthReport>,
) -> String {
    let mut out = String::new();

    out.push_str("=== budget - Recursive Budget Forecast ===\n");
    out.push_str(&format_dataset(ingest));

    let target_label = match target {
        ForecastTarget::All => "all entities".to_string(),
        ForecastTarget::Entity(name) => name.clone(),
    };
    let start = horizon
        .start_year
        .map_or_else(|| "after history".to_string(), |y| y.to_string());
    out.push_str(&format!(
        "Forecast: {target_label} | years {start} .. {}\n",
        horizon.end_year
    ));

    if let Some(report) = lengths {
        if report.is_uniform() {
            out.push_str(&format!("Series length: {} (uniform)\n", report.typical_len));
        } else {
            out.push_str(&format!(
                "Series length: typical={} range=[{}, {}], {} series differ:\n",
                report.typical_len,
                report.min_len,
                report.max_len,
                report.deviating.len()
            ));
            for (entity, variable, len) in &report.deviating {
                out.push_str(&format!("  - {entity} / {variable}: {len}\n"));
            }
        }
    }

    out.push('\n');
    out.push_str(&format_model_summary(model));

    if !failures.is_empty() {
        out.push_str(&format!("\nSkipped series ({}):\n", failures.len()));
        for f in failures {
            out.push_str(&format!("  - {f}\n"));
        }
    }
    out.push('\n');

    out
}

fn format_dataset(ingest: &IngestedData) -> String {
    let mut out = String::new();
    let s = &ingest.stats;
    out.push_str(&format!("Layout: {:?}\n", ingest.layout));
    out.push_str(&format!(
        "Records: n={} | entities={} | variables={} | years=[{}, {}]\n",
        s.n_records, s.n_entities, s.n_variables, s.year_min, s.year_max
    ));
    if ingest.values_coerced + ingest.values_filled + ingest.values_dropped > 0 {
        out.push_str(&format!(
            "Cleaning: coerced={} filled={} dropped={}\n",
            ingest.values_coerced, ingest.values_filled, ingest.values_dropped
        ));
    }
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!(
            "Row errors: {} of {} rows\n",
            ingest.row_errors.len(),
            ingest.rows_read
        ));
        for e in ingest.row_errors.iter().take(MAX_ROW_ERRORS) {
            let id = e.id.as_deref().map(|id| format!(" [{id}]")).unwrap_or_default();
            out.push_str(&format!("  line {}{id}: {}\n", e.line, e.message));
        }
        if ingest.row_errors.len() > MAX_ROW_ERRORS {
            out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - MAX_ROW_ERRORS));
        }
    }
    out
}

/// Describe a trained (or loaded) model.
pub fn format_model_summary(model: &TrainedModel) -> String {
    let mut out = String::new();
    let r = &model.report;

    out.push_str("Model:\n");
    out.push_str(&format!("- kind   : {}\n", model.kind().display_name()));
    out.push_str(&format!("- scope  : {}\n", model.scope.label()));
    out.push_str(&format!("- trained: {}\n", model.trained_at.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push_str(&format!("- rows   : train={} test={}\n", r.n_train, r.n_test));
    match (r.mse, r.rmse) {
        (Some(mse), Some(rmse)) => {
            out.push_str(&format!("- holdout: MSE={mse:.3} RMSE={rmse:.3}\n"));
        }
        _ => out.push_str("- holdout: n/a (too few rows)\n"),
    }
    out.push_str(&format!("- schema : [{}]\n", model.schema.columns().join(", ")));
    out.push_str(&format!(
        "- vocabulary ({}): {}\n",
        model.vocabulary.len(),
        model.vocabulary.categories().join(", ")
    ));

    out
}

/// Format timelines as one table per entity.
pub fn format_timelines(timelines: &[Timeline]) -> String {
    let mut out = String::new();
    for (i, t) in timelines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}:\n", t.entity));
        out.push_str(&format_table(t));
    }
    out
}

fn format_table(timeline: &Timeline) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:>6} {:>16} {:>16} {:<9}",
            "variable", "year", "actual", "predicted", "kind"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<24} {:-<6} {:-<16} {:-<16} {:-<9}\n", "", "", "", "", ""));

    for r in &timeline.records {
        let kind = match r.kind {
            RecordKind::Actual => "actual",
            RecordKind::Predicted => "predicted",
        };
        out.push_str(
            format!(
                "{:<24} {:>6} {:>16} {:>16} {:<9}",
                truncate(&r.variable, 24),
                r.year,
                fmt_amount(r.actual),
                fmt_amount(r.predicted),
                kind,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_amount(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimelineRecord;

    fn row(year: i32, actual: Option<f64>, predicted: Option<f64>, kind: RecordKind) -> TimelineRecord {
        TimelineRecord {
            entity: "Boston".to_string(),
            variable: "Police".to_string(),
            year,
            actual,
            predicted,
            kind,
        }
    }

    #[test]
    fn timeline_table_lists_actual_and_predicted_rows() {
        let timeline = Timeline {
            entity: "Boston".to_string(),
            records: vec![
                row(2021, Some(110.0), None, RecordKind::Actual),
                row(2022, None, Some(115.0), RecordKind::Predicted),
            ],
        };
        let text = format_timelines(&[timeline]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Boston:");
        assert!(lines[1].starts_with("variable"));
        assert!(lines[3].contains("110.00") && lines[3].ends_with("actual"));
        assert!(lines[4].contains("115.00") && lines[4].ends_with("predicted"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Police", 10), "Police");
        assert_eq!(truncate("Public Works Department", 8), "Public .");
    }
}
