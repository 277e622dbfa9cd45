//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input/configuration enums (`InputLayout`, `ModelKind`, `ScopeMode`)
//! - cleaned observations and per-series groupings (`ObservationRecord`, `EntitySeries`)
//! - forecast outputs (`ForecastRecord`, `TimelineRecord`, `Timeline`)

pub mod types;

pub use types::*;
