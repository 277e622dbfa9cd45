//! `budget-forecast` library crate.
//!
//! The binary (`budget`) is a thin wrapper around this library so that:
//!
//! - the forecasting core is testable without spawning processes
//! - the pipeline can run on in-memory observations (no CSV, no exports)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod train;
