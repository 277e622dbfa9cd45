//! Forecasting core.
//!
//! - recursive per-series forecasting (`recursive`)
//! - timeline assembly (`assemble`)
//!
//! Nothing here touches the filesystem.

pub mod assemble;
pub mod recursive;

pub use assemble::*;
pub use recursive::*;
