//! Ordinary least squares baseline.
//!
//! No separate intercept column: the one-hot block always sums to one, so it
//! already acts as a per-variable intercept (adding another would make the
//! design exactly rank-deficient).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::solve_least_squares;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, AppError> {
        let n = x.len();
        let p = x.first().map_or(0, Vec::len);
        if n == 0 || p == 0 || n != y.len() {
            return Err(AppError::new(
                4,
                format!("Cannot fit linear model on {n} rows x {p} columns / {} targets.", y.len()),
            ));
        }

        let design = DMatrix::from_fn(n, p, |i, j| x[i][j]);
        let target = DVector::from_row_slice(y);
        let beta = solve_least_squares(&design, &target)
            .ok_or_else(|| AppError::new(4, "Linear model is too ill-conditioned to solve."))?;

        Ok(Self {
            coefficients: beta.iter().copied().collect(),
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.coefficients.iter().zip(row).map(|(c, v)| c * v).sum()
    }
}
