//! Regression models.
//!
//! - least-squares regression trees (`tree`)
//! - gradient-boosted tree ensemble (`gbm`)
//! - linear baseline (`linear`)
//! - kind dispatch + the `ForecastModel` seam (`model`)

pub mod gbm;
pub mod linear;
pub mod model;
pub mod tree;

pub use model::*;
