//! Merge history and forecasts into per-entity timelines.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{ForecastRecord, ForecastTarget, ObservationRecord, RecordKind, Timeline, TimelineRecord};

/// Build one entity's timeline, sorted by (variable, year).
///
/// `fitted` values, when given, fill the `predicted` field of matching
/// historical rows. Values are never altered.
pub fn assemble_timeline(
    entity: &str,
    observations: &[ObservationRecord],
    forecasts: &[ForecastRecord],
    fitted: Option<&[ForecastRecord]>,
) -> Timeline {
    let fitted_lookup: HashMap<(&str, i32), f64> = fitted
        .unwrap_or_default()
        .iter()
        .filter(|f| f.entity == entity)
        .map(|f| ((f.variable.as_str(), f.year), f.predicted))
        .collect();

    let mut records: Vec<TimelineRecord> = observations
        .iter()
        .filter(|o| o.entity == entity)
        .map(|o| TimelineRecord {
            entity: o.entity.clone(),
            variable: o.variable.clone(),
            year: o.year,
            actual: Some(o.value),
            predicted: fitted_lookup.get(&(o.variable.as_str(), o.year)).copied(),
            kind: RecordKind::Actual,
        })
        .collect();

    records.extend(
        forecasts
            .iter()
            .filter(|f| f.entity == entity)
            .map(|f| TimelineRecord {
                entity: f.entity.clone(),
                variable: f.variable.clone(),
                year: f.year,
                actual: None,
                predicted: Some(f.predicted),
                kind: RecordKind::Predicted,
            }),
    );

    records.sort_by(|a, b| (&a.variable, a.year).cmp(&(&b.variable, b.year)));
    Timeline {
        entity: entity.to_string(),
        records,
    }
}

/// One timeline per entity selected by `target`, entities ascending.
pub fn assemble_timelines(
    observations: &[ObservationRecord],
    forecasts: &[ForecastRecord],
    fitted: Option<&[ForecastRecord]>,
    target: &ForecastTarget,
) -> Vec<Timeline> {
    let entities: BTreeSet<&str> = observations
        .iter()
        .map(|o| o.entity.as_str())
        .chain(forecasts.iter().map(|f| f.entity.as_str()))
        .filter(|name| target.matches(name))
        .collect();

    entities
        .into_iter()
        .map(|entity| assemble_timeline(entity, observations, forecasts, fitted))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn obs(entity: &str, variable: &str, year: i32, value: f64) -> ObservationRecord {
        ObservationRecord {
            entity: entity.to_string(),
            variable: variable.to_string(),
            year,
            value,
        }
    }

    fn fc(entity: &str, variable: &str, year: i32, predicted: f64) -> ForecastRecord {
        ForecastRecord {
            entity: entity.to_string(),
            variable: variable.to_string(),
            year,
            predicted,
            lag1: 0.0,
            lag2: 0.0,
        }
    }

    #[test]
    fn history_and_forecast_are_merged_in_year_order() {
        let observations = vec![
            obs("Boston", "Police", 2021, 110.0),
            obs("Boston", "Police", 2019, 100.0),
            obs("Boston", "Police", 2020, 105.0),
        ];
        let forecasts = vec![fc("Boston", "Police", 2023, 120.0), fc("Boston", "Police", 2022, 115.0)];

        let timeline = assemble_timeline("Boston", &observations, &forecasts, None);
        let got: Vec<(i32, Option<f64>, Option<f64>, RecordKind)> = timeline
            .records
            .iter()
            .map(|r| (r.year, r.actual, r.predicted, r.kind))
            .collect();
        assert_eq!(
            got,
            vec![
                (2019, Some(100.0), None, RecordKind::Actual),
                (2020, Some(105.0), None, RecordKind::Actual),
                (2021, Some(110.0), None, RecordKind::Actual),
                (2022, None, Some(115.0), RecordKind::Predicted),
                (2023, None, Some(120.0), RecordKind::Predicted),
            ]
        );
    }

    #[test]
    fn records_sort_by_variable_then_year() {
        let observations = vec![obs("A", "Police", 2020, 1.0), obs("A", "Fire", 2021, 2.0), obs("A", "Fire", 2020, 3.0)];
        let timeline = assemble_timeline("A", &observations, &[fc("A", "Fire", 2022, 4.0)], None);
        let keys: Vec<(&str, i32)> = timeline.records.iter().map(|r| (r.variable.as_str(), r.year)).collect();
        assert_eq!(keys, vec![("Fire", 2020), ("Fire", 2021), ("Fire", 2022), ("Police", 2020)]);
    }

    #[test]
    fn fitted_values_attach_to_history() {
        let observations = vec![obs("A", "x", 2020, 10.0)];
        let fitted = vec![fc("A", "x", 2020, 9.5)];
        let timeline = assemble_timeline("A", &observations, &[], Some(fitted.as_slice()));
        assert_eq!(timeline.records[0].actual, Some(10.0));
        assert_eq!(timeline.records[0].predicted, Some(9.5));
    }

    #[test]
    fn timelines_follow_target_and_entity_order() {
        let observations = vec![obs("Cleveland", "x", 2020, 1.0), obs("Austin", "x", 2020, 1.0)];
        let all = assemble_timelines(&observations, &[], None, &ForecastTarget::All);
        let names: Vec<&str> = all.iter().map(|t| t.entity.as_str()).collect();
        assert_eq!(names, vec!["Austin", "Cleveland"]);

        let one = assemble_timelines(&observations, &[], None, &ForecastTarget::Entity("Austin".into()));
        assert_eq!(one.len(), 1);
    }
}
