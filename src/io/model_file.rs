//! Read/write trained model JSON files.
//!
//! A model file is the portable representation of a training run:
//! - the fitted regressor (tree ensemble or linear coefficients)
//! - the ordered feature schema and the fixed variable vocabulary
//! - training scope, hold-out diagnostics, and timestamp
//!
//! The layout is defined by `train::TrainedModel`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::features::FeatureSchema;
use crate::train::TrainedModel;

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &TrainedModel) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    info!(path = %path.display(), kind = ?model.kind(), "saved model");
    Ok(())
}

/// Read a model JSON file.
///
/// The stored schema must be the one its vocabulary implies; anything else means
/// the file was edited or produced by an incompatible build.
pub fn read_model_json(path: &Path) -> Result<TrainedModel, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: TrainedModel = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(4, format!("Invalid model JSON: {e}")))?;

    if model.schema != FeatureSchema::for_vocabulary(&model.vocabulary) {
        return Err(AppError::new(
            4,
            "Model JSON schema does not match its vocabulary.",
        ));
    }
    info!(path = %path.display(), kind = ?model.kind(), "loaded model");
    Ok(model)
}
