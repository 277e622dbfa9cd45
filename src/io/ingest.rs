//! CSV ingest and reshaping.
//!
//! This module is responsible for turning a budget table (long or wide) into a
//! clean, sorted list of `(entity, variable, year, value)` observations.
//!
//! Design goals:
//! - **Layout detection** from the header row, overridable with `--layout`
//! - **Lenient values**: currency strings are cleaned, malformed numbers become
//!   missing, and missing values are filled within their own series
//! - **Failure by omission**: bad rows are skipped and reported, never fatal
//! - **Separation of concerns**: no feature or model logic here

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{IngestOptions, InputLayout, ObservationRecord};
use crate::error::AppError;

const ENTITY_ALIASES: [&str; 6] = ["entity", "city", "cabinet", "program", "dept", "department"];
const VARIABLE_ALIASES: [&str; 3] = ["variable", "category", "expense category"];
const YEAR_ALIASES: [&str; 2] = ["year", "fiscal year"];
const VALUE_ALIASES: [&str; 4] = ["value", "budget", "amount", "expense"];

/// Cell contents treated as "no value" rather than malformed.
const MISSING_TOKENS: [&str; 7] = ["#missing", "na", "n/a", "nan", "null", "none", "-"];

/// Accepted fiscal years, for both header tokens and year cells.
const FISCAL_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Variable name used when the table has no variable dimension.
pub const DEFAULT_VARIABLE: &str = "total";

/// Summary stats about the observations actually produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_records: usize,
    pub n_entities: usize,
    pub n_variables: usize,
    pub year_min: i32,
    pub year_max: i32,
}

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: cleaned observations + resolved layout + diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<ObservationRecord>,
    pub layout: InputLayout,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Non-empty cells that could not be parsed as numbers.
    pub values_coerced: usize,
    /// Missing values recovered by forward/backward fill.
    pub values_filled: usize,
    /// Missing values that could not be filled (their series was dropped).
    pub values_dropped: usize,
}

impl IngestedData {
    /// Wrap observations that were produced in memory (no CSV involved).
    pub fn from_observations(mut observations: Vec<ObservationRecord>) -> Result<Self, AppError> {
        sort_observations(&mut observations);
        let stats = compute_stats(&observations)
            .ok_or_else(|| AppError::new(3, "No observations supplied."))?;
        Ok(Self {
            rows_read: observations.len(),
            observations,
            layout: InputLayout::Long,
            stats,
            row_errors: Vec::new(),
            values_coerced: 0,
            values_filled: 0,
            values_dropped: 0,
        })
    }
}

/// Load the CSV named in `opts` and reshape it into observations.
pub fn load_observations(opts: &IngestOptions) -> Result<IngestedData, AppError> {
    let file = File::open(&opts.csv_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", opts.csv_path.display()),
        )
    })?;
    let data = reshape_reader(file, opts)?;
    info!(
        path = %opts.csv_path.display(),
        layout = ?data.layout,
        records = data.stats.n_records,
        entities = data.stats.n_entities,
        variables = data.stats.n_variables,
        "loaded budget table"
    );
    Ok(data)
}

/// Reshape CSV content from any reader. `opts.csv_path` is ignored.
pub fn reshape_reader<R: Read>(reader: R, opts: &IngestOptions) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let layout = resolve_layout(opts.layout, &headers, &header_map)?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts at line 2 (after the header), 1-based.
        let line = idx + 2;
        match result {
            Ok(record) => rows.push((line, record)),
            Err(e) => row_errors.push(RowError {
                line,
                id: None,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }
    let rows_read = rows.len() + row_errors.len();

    let mut cells = CellCollector::default();
    match layout {
        InputLayout::Long => collect_long(&rows, &header_map, &mut cells, &mut row_errors)?,
        InputLayout::WideEntities => {
            collect_wide_entities(&rows, &headers, &header_map, &mut cells, &mut row_errors)?
        }
        InputLayout::WideYears => collect_wide_years(&rows, &headers, &header_map, opts, &mut cells, &mut row_errors)?,
        InputLayout::Auto => return Err(AppError::new(2, "Input layout could not be resolved.")),
    }

    let values_coerced = cells.coerced;
    let (mut observations, values_filled, values_dropped) = fill_missing(cells.groups);
    sort_observations(&mut observations);

    if values_coerced > 0 {
        warn!(values_coerced, "non-numeric values treated as missing");
    }
    if values_dropped > 0 {
        warn!(values_dropped, "series without any numeric value were dropped");
    }

    let stats = compute_stats(&observations).ok_or_else(|| {
        AppError::new(3, "No valid records remain after cleaning/missing-value handling.")
    })?;

    Ok(IngestedData {
        observations,
        layout,
        stats,
        row_errors,
        rows_read,
        values_coerced,
        values_filled,
        values_dropped,
    })
}

type SeriesKey = (String, String);

/// Accumulates raw cells per (entity, variable) and year, summing duplicates.
#[derive(Default)]
struct CellCollector {
    groups: BTreeMap<SeriesKey, BTreeMap<i32, Option<f64>>>,
    coerced: usize,
}

impl CellCollector {
    fn push(&mut self, entity: &str, variable: &str, year: i32, raw: Option<&str>) {
        let value = match raw.map(parse_amount).unwrap_or(Ok(None)) {
            Ok(v) => v,
            Err(msg) => {
                debug!(entity, variable, year, "{msg}");
                self.coerced += 1;
                None
            }
        };

        let slot = self
            .groups
            .entry((entity.to_string(), variable.to_string()))
            .or_default()
            .entry(year)
            .or_insert(None);
        *slot = match (*slot, value) {
            (Some(a), Some(b)) => Some(a + b),
            (Some(a), None) => Some(a),
            (None, v) => v,
        };
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn resolve_layout(
    requested: InputLayout,
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<InputLayout, AppError> {
    if requested != InputLayout::Auto {
        return Ok(requested);
    }

    let has_entity = find_column(header_map, &ENTITY_ALIASES).is_some();
    let has_variable = find_column(header_map, &VARIABLE_ALIASES).is_some();
    let has_year = find_column(header_map, &YEAR_ALIASES).is_some();
    let has_value = find_column(header_map, &VALUE_ALIASES).is_some();

    if has_entity && has_year && has_value {
        return Ok(InputLayout::Long);
    }
    if has_variable && has_year && !has_value {
        return Ok(InputLayout::WideEntities);
    }
    if headers.iter().any(|h| parse_year_token(h).is_some()) {
        return Ok(InputLayout::WideYears);
    }

    Err(AppError::new(
        2,
        "Could not detect the input layout: expected `entity,variable,year,value`, \
         `variable,year,<entity...>`, or year-named columns such as `FY22 Budget`.",
    ))
}

fn collect_long(
    rows: &[(usize, StringRecord)],
    header_map: &HashMap<String, usize>,
    cells: &mut CellCollector,
    row_errors: &mut Vec<RowError>,
) -> Result<(), AppError> {
    let entity_idx = find_column(header_map, &ENTITY_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `entity`"))?;
    let year_idx = find_column(header_map, &YEAR_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `year`"))?;
    let value_idx = find_column(header_map, &VALUE_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `value`"))?;
    let variable_idx = find_column(header_map, &VARIABLE_ALIASES);

    for (line, record) in rows {
        let Some(entity) = cell(record, entity_idx) else {
            row_errors.push(RowError {
                line: *line,
                id: None,
                message: "Missing entity.".to_string(),
            });
            continue;
        };
        let variable = variable_idx
            .and_then(|i| cell(record, i))
            .unwrap_or(DEFAULT_VARIABLE);
        let year = match cell(record, year_idx).ok_or_else(|| "Missing year.".to_string()).and_then(parse_year_cell) {
            Ok(y) => y,
            Err(message) => {
                row_errors.push(RowError {
                    line: *line,
                    id: Some(entity.to_string()),
                    message,
                });
                continue;
            }
        };
        cells.push(entity, variable, year, cell(record, value_idx));
    }
    Ok(())
}

fn collect_wide_entities(
    rows: &[(usize, StringRecord)],
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
    cells: &mut CellCollector,
    row_errors: &mut Vec<RowError>,
) -> Result<(), AppError> {
    let variable_idx = find_column(header_map, &VARIABLE_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `variable`"))?;
    let year_idx = find_column(header_map, &YEAR_ALIASES)
        .ok_or_else(|| AppError::new(2, "Missing required column: `year`"))?;

    let entity_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != variable_idx && *idx != year_idx)
        .map(|(idx, name)| (idx, name.trim().trim_start_matches('\u{feff}')))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    if entity_columns.is_empty() {
        return Err(AppError::new(2, "No entity columns found next to `variable` and `year`."));
    }

    for (line, record) in rows {
        let Some(variable) = cell(record, variable_idx) else {
            row_errors.push(RowError {
                line: *line,
                id: None,
                message: "Missing variable.".to_string(),
            });
            continue;
        };
        let year = match cell(record, year_idx).ok_or_else(|| "Missing year.".to_string()).and_then(parse_year_cell) {
            Ok(y) => y,
            Err(message) => {
                row_errors.push(RowError {
                    line: *line,
                    id: Some(variable.to_string()),
                    message,
                });
                continue;
            }
        };
        for (idx, entity) in &entity_columns {
            cells.push(entity, variable, year, cell(record, *idx));
        }
    }
    Ok(())
}

fn collect_wide_years(
    rows: &[(usize, StringRecord)],
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
    opts: &IngestOptions,
    cells: &mut CellCollector,
    row_errors: &mut Vec<RowError>,
) -> Result<(), AppError> {
    let mut year_columns = Vec::new();
    let mut id_columns = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        match parse_year_token(name) {
            Some(year) => year_columns.push((idx, year)),
            None => id_columns.push(idx),
        }
    }
    if year_columns.is_empty() {
        return Err(AppError::new(2, "No year columns found (expected headers such as `FY22 Budget`)."));
    }

    let named = |name: &Option<String>, what: &str| -> Result<Option<usize>, AppError> {
        match name {
            Some(n) => header_map
                .get(&normalize_header_name(n))
                .copied()
                .map(Some)
                .ok_or_else(|| AppError::new(2, format!("{what} column `{n}` not found in CSV header."))),
            None => Ok(None),
        }
    };

    let entity_idx = match named(&opts.entity_column, "Entity")? {
        Some(idx) => idx,
        None => *id_columns
            .first()
            .ok_or_else(|| AppError::new(2, "No identifier column found for the entity."))?,
    };
    let variable_idx = match named(&opts.variable_column, "Variable")? {
        Some(idx) => Some(idx),
        None => id_columns.iter().copied().find(|&i| i != entity_idx),
    };

    for (line, record) in rows {
        let Some(entity) = cell(record, entity_idx) else {
            row_errors.push(RowError {
                line: *line,
                id: None,
                message: "Missing entity.".to_string(),
            });
            continue;
        };
        let variable = variable_idx
            .and_then(|i| cell(record, i))
            .unwrap_or(DEFAULT_VARIABLE);
        for &(idx, year) in &year_columns {
            cells.push(entity, variable, year, cell(record, idx));
        }
    }
    Ok(())
}

/// Forward-fill then back-fill each series; drop series with no values at all.
///
/// Returns `(observations, filled, dropped)`.
fn fill_missing(groups: BTreeMap<SeriesKey, BTreeMap<i32, Option<f64>>>) -> (Vec<ObservationRecord>, usize, usize) {
    let mut out = Vec::new();
    let mut filled = 0usize;
    let mut dropped = 0usize;

    for ((entity, variable), by_year) in groups {
        let years: Vec<i32> = by_year.keys().copied().collect();
        let mut values: Vec<Option<f64>> = by_year.into_values().collect();
        let missing_before = values.iter().filter(|v| v.is_none()).count();

        let mut last = None;
        for v in values.iter_mut() {
            match v {
                Some(x) => last = Some(*x),
                None => *v = last,
            }
        }
        let mut next = None;
        for v in values.iter_mut().rev() {
            match v {
                Some(x) => next = Some(*x),
                None => *v = next,
            }
        }

        if values.iter().all(Option::is_none) {
            dropped += values.len();
            continue;
        }
        filled += missing_before;

        for (year, value) in years.into_iter().zip(values) {
            if let Some(value) = value {
                out.push(ObservationRecord {
                    entity: entity.clone(),
                    variable: variable.clone(),
                    year,
                    value,
                });
            }
        }
    }

    (out, filled, dropped)
}

fn sort_observations(observations: &mut [ObservationRecord]) {
    observations.sort_by(|a, b| {
        (a.entity.as_str(), a.variable.as_str(), a.year).cmp(&(b.entity.as_str(), b.variable.as_str(), b.year))
    });
}

fn compute_stats(observations: &[ObservationRecord]) -> Option<DatasetStats> {
    let year_min = observations.iter().map(|o| o.year).min()?;
    let year_max = observations.iter().map(|o| o.year).max()?;
    let entities: BTreeSet<&str> = observations.iter().map(|o| o.entity.as_str()).collect();
    let variables: BTreeSet<&str> = observations.iter().map(|o| o.variable.as_str()).collect();

    Some(DatasetStats {
        n_records: observations.len(),
        n_entities: entities.len(),
        n_variables: variables.len(),
        year_min,
        year_max,
    })
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a budget amount.
///
/// - `Ok(Some(v))`: a number (currency symbols, thousands separators and
///   accounting parentheses are accepted)
/// - `Ok(None)`: an explicit missing marker (`#Missing`, `NA`, ...) or blank
/// - `Err(_)`: anything else; callers treat it as missing and count it
pub fn parse_amount(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if s.is_empty() || MISSING_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        return Ok(None);
    }

    let (negative, body) = match s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' ' | '\u{a0}'))
        .collect();

    let v = cleaned
        .parse::<f64>()
        .map_err(|_| format!("Invalid numeric value '{s}'."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite numeric value '{s}'."));
    }
    Ok(Some(if negative { -v } else { v }))
}

/// Extract a fiscal year from a column name.
///
/// Accepts `FY22` (two-digit, 2000-based), `FY2022`, or a bare four-digit year
/// between 1900 and 2100 anywhere in the name (`2021 Actual`).
pub fn parse_year_token(name: &str) -> Option<i32> {
    let upper = name.trim().to_ascii_uppercase();
    let bytes = upper.as_bytes();

    let mut i = 0;
    while i + 2 <= bytes.len() {
        if &bytes[i..i + 2] == b"FY" {
            let run = digit_run(bytes, i + 2);
            let year = match run.len() {
                2 => Some(2000 + ascii_number(run)),
                4 => Some(ascii_number(run)),
                _ => None,
            };
            if let Some(year) = year.filter(|y| FISCAL_YEARS.contains(y)) {
                return Some(year);
            }
        }
        i += 1;
    }

    let mut i = 0;
    while i < bytes.len() {
        let run = digit_run(bytes, i);
        if run.is_empty() {
            i += 1;
            continue;
        }
        if run.len() == 4 {
            let year = ascii_number(run);
            if FISCAL_YEARS.contains(&year) {
                return Some(year);
            }
        }
        i += run.len();
    }
    None
}

fn digit_run(bytes: &[u8], start: usize) -> &[u8] {
    let rest = bytes.get(start..).unwrap_or(&[]);
    let len = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    &rest[..len]
}

fn ascii_number(digits: &[u8]) -> i32 {
    digits.iter().fold(0, |acc, d| acc * 10 + i32::from(d - b'0'))
}

fn parse_year_cell(s: &str) -> Result<i32, String> {
    let year = if let Ok(y) = s.parse::<i64>() {
        Some(y)
    } else if let Ok(v) = s.parse::<f64>() {
        // `2021.0` from spreadsheet exports; anything fractional is rejected.
        (v.is_finite() && v.fract() == 0.0 && v.abs() < 1e6).then_some(v as i64)
    } else {
        parse_year_token(s).map(i64::from)
    };
    year.and_then(|y| i32::try_from(y).ok())
        .filter(|y| FISCAL_YEARS.contains(y))
        .ok_or_else(|| format!("Invalid year '{s}'."))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn opts(layout: InputLayout) -> IngestOptions {
        IngestOptions {
            csv_path: PathBuf::new(),
            layout,
            entity_column: None,
            variable_column: None,
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

    #[rstest]
    #[case("1,234", Some(1234.0))]
    #[case("$1,234.50", Some(1234.5))]
    #[case("(2,000)", Some(-2000.0))]
    #[case("#Missing", None)]
    #[case("", None)]
    #[case("n/a", None)]
    fn parse_amount_cleans_currency_strings(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_amount(raw), Ok(expected));
    }

    #[test]
    fn parse_amount_rejects_text() {
        assert!(parse_amount("twelve").is_err());
    }

    #[rstest]
    #[case("FY22 Actual Expense", Some(2022))]
    #[case("FY2024 Appropriation", Some(2024))]
    #[case("fy25 budget", Some(2025))]
    #[case("2019", Some(2019))]
    #[case("Budget 2021 (Revised)", Some(2021))]
    #[case("Program", None)]
    #[case("Code 12345", None)]
    fn year_tokens(#[case] header: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_year_token(header), expected);
    }

    #[test]
    fn long_layout_is_detected_and_sorted() {
        let csv = "Entity,Variable,Year,Value\n\
                   Boston,Police,2020,\"105\"\n\
                   Boston,Police,2019,100\n\
                   Austin,Fire,2019,\"1,000\"\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Auto)).unwrap();
        assert_eq!(data.layout, InputLayout::Long);
        assert_eq!(
            data.observations,
            vec![
                obs("Austin", "Fire", 2019, 1000.0),
                obs("Boston", "Police", 2019, 100.0),
                obs("Boston", "Police", 2020, 105.0),
            ]
        );
        assert_eq!(data.stats.n_entities, 2);
        assert_eq!(data.stats.year_min, 2019);
        assert_eq!(data.stats.year_max, 2020);
    }

    #[test]
    fn wide_entities_layout_melts_city_columns() {
        let csv = "\u{feff}Variable,Year,MA: Boston,TX: Austin\n\
                   Police,2019,\"1,000\",500\n\
                   Police,2020,\"1,100\",#Missing\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Auto)).unwrap();
        assert_eq!(data.layout, InputLayout::WideEntities);
        assert_eq!(
            data.observations,
            vec![
                obs("MA: Boston", "Police", 2019, 1000.0),
                obs("MA: Boston", "Police", 2020, 1100.0),
                obs("TX: Austin", "Police", 2019, 500.0),
                // forward-filled
                obs("TX: Austin", "Police", 2020, 500.0),
            ]
        );
        assert_eq!(data.values_filled, 1);
    }

    #[test]
    fn wide_years_layout_sums_duplicate_groups() {
        let csv = "Cabinet,Dept,FY22 Actual Expense,FY23 Actual Expense\n\
                   Health,EMS,100,110\n\
                   Health,EMS,5,5\n\
                   Parks,Trees,7,oops\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Auto)).unwrap();
        assert_eq!(data.layout, InputLayout::WideYears);
        assert_eq!(
            data.observations,
            vec![
                obs("Health", "EMS", 2022, 105.0),
                obs("Health", "EMS", 2023, 115.0),
                obs("Parks", "Trees", 2022, 7.0),
                obs("Parks", "Trees", 2023, 7.0),
            ]
        );
        assert_eq!(data.values_coerced, 1);
    }

    #[test]
    fn wide_years_honours_explicit_columns() {
        let csv = "Cabinet,Dept,Program,FY22 Budget\n\
                   Health,EMS,Ambulance,10\n";
        let mut o = opts(InputLayout::WideYears);
        o.entity_column = Some("Program".to_string());
        o.variable_column = Some("Cabinet".to_string());
        let data = reshape_reader(csv.as_bytes(), &o).unwrap();
        assert_eq!(data.observations, vec![obs("Ambulance", "Health", 2022, 10.0)]);
    }

    #[test]
    fn backfill_recovers_leading_gaps_and_empty_series_are_dropped() {
        let csv = "entity,variable,year,value\n\
                   A,x,2019,\n\
                   A,x,2020,20\n\
                   B,y,2019,#Missing\n\
                   B,y,2020,\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap();
        assert_eq!(data.observations, vec![obs("A", "x", 2019, 20.0), obs("A", "x", 2020, 20.0)]);
        assert_eq!(data.values_filled, 1);
        assert_eq!(data.values_dropped, 2);
    }

    #[test]
    fn fill_never_crosses_series_boundaries() {
        let csv = "entity,variable,year,value\n\
                   A,x,2019,1\n\
                   A,x,2020,2\n\
                   A,y,2019,\n\
                   A,y,2020,50\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap();
        let y: Vec<f64> = data
            .observations
            .iter()
            .filter(|o| o.variable == "y")
            .map(|o| o.value)
            .collect();
        assert_eq!(y, vec![50.0, 50.0]);
    }

    #[test]
    fn bad_years_are_reported_not_fatal() {
        let csv = "entity,variable,year,value\n\
                   A,x,soon,1\n\
                   A,x,2020,2\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap();
        assert_eq!(data.observations.len(), 1);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 2);
        assert_eq!(data.rows_read, 2);
    }

    #[rstest]
    #[case("1e12")]
    #[case("99999999999")]
    #[case("-2020")]
    #[case("2020.5")]
    #[case("1776")]
    fn out_of_range_years_become_row_errors(#[case] year: &str) {
        let csv = format!("entity,variable,year,value\nA,x,2019,1\nA,x,{year},2\n");
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap();
        let years: Vec<i32> = data.observations.iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2019]);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn float_formatted_years_are_accepted() {
        let csv = "entity,variable,year,value\nA,x,2019.0,1\n";
        let data = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap();
        assert_eq!(data.observations[0].year, 2019);
    }

    #[test]
    fn unknown_layout_is_an_input_error() {
        let csv = "foo,bar\n1,2\n";
        let err = reshape_reader(csv.as_bytes(), &opts(InputLayout::Auto)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn all_missing_input_has_no_records() {
        let csv = "entity,variable,year,value\nA,x,2019,\n";
        let err = reshape_reader(csv.as_bytes(), &opts(InputLayout::Long)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
