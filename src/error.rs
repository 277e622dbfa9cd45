//! Error types.
//!
//! Two layers:
//!
//! - [`AppError`]: run-level failures (bad input file, no usable rows, invalid
//!   model file). Carries the process exit code.
//! - [`SeriesError`]: failures scoped to one (entity, variable) series. These are
//!   collected and reported; they never abort sibling series.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failure of a single (entity, variable) series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Fewer than two historical observations: the lag buffer cannot be seeded.
    #[error("insufficient history: {observations} observation(s), need at least 2")]
    InsufficientHistory { observations: usize },

    /// Feature layout disagrees with the schema recorded at training time.
    #[error("feature schema mismatch: expected [{}], got [{}]", expected.join(", "), found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The series' variable is not part of the fixed vocabulary.
    #[error("variable '{0}' is not in the model vocabulary")]
    UnknownVariable(String),

    /// The same year appears twice within one series.
    #[error("duplicate year {0} in series")]
    DuplicateYear(i32),

    /// The model produced NaN or an infinite value.
    #[error("non-finite prediction for year {0}")]
    NonFinitePrediction(i32),
}

/// A [`SeriesError`] tagged with the series it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFailure {
    pub entity: String,
    pub variable: String,
    pub error: SeriesError,
}

impl SeriesFailure {
    pub fn new(entity: &str, variable: &str, error: SeriesError) -> Self {
        Self {
            entity: entity.to_string(),
            variable: variable.to_string(),
            error,
        }
    }
}

impl std::fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}: {}", self.entity, self.variable, self.error)
    }
}
