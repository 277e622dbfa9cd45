//! Export assembled timelines to CSV.
//!
//! One flat row per timeline record, sorted per entity by (variable, year):
//! `entity,variable,year,actual,predicted,kind`. Absent values are empty cells.
//! The file is meant for chart renderers, spreadsheets, or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::domain::Timeline;
use crate::error::AppError;

/// Write every timeline record to `writer`.
pub fn write_timeline<W: Write>(writer: W, timelines: &[Timeline]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in timelines.iter().flat_map(|t| &t.records) {
        csv.serialize(record)
            .map_err(|e| AppError::new(2, format!("Failed to write timeline row: {e}")))?;
    }
    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush timeline CSV: {e}")))?;
    Ok(())
}

/// Write timelines to a CSV file.
pub fn write_timeline_csv(path: &Path, timelines: &[Timeline]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_timeline(file, timelines)?;
    info!(path = %path.display(), entities = timelines.len(), "wrote timeline CSV");
    Ok(())
}
