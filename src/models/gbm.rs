//! Gradient-boosted regression ensemble (least-squares loss).
//!
//! `F_0 = mean(y)`, then for each stage `m`:
//!
//! ```text
//! r_i   = y_i - F_{m-1}(x_i)
//! h_m   = tree fitted to (x, r)
//! F_m   = F_{m-1} + ν h_m
//! ```
//!
//! With squared error the negative gradient is the plain residual and the
//! optimal leaf value is the residual mean, so no line search is needed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::models::tree::{RegressionTree, TreeParams};

/// Fixed ensemble settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &GbmParams) -> Result<Self, AppError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AppError::new(
                4,
                format!("Cannot fit gradient boosting on {} rows / {} targets.", x.len(), y.len()),
            ));
        }
        if !(params.learning_rate.is_finite() && params.learning_rate > 0.0) {
            return Err(AppError::new(4, "Learning rate must be finite and > 0."));
        }

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, f)| t - f).collect();
            let tree = RegressionTree::fit(x, &residuals, &params.tree);
            for (f, row) in current.iter_mut().zip(x) {
                *f += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            if stage % 25 == 0 {
                let mse = residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64;
                debug!(stage, train_mse = mse, "boosting stage");
            }
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensemble_converges_on_a_step_function() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 100.0 } else { 200.0 }).collect();
        let model = GradientBoostedRegressor::fit(&x, &y, &GbmParams::default()).unwrap();

        assert_eq!(model.n_trees(), 100);
        assert!((model.predict(&[3.0]) - 100.0).abs() < 0.01);
        assert!((model.predict(&[15.0]) - 200.0).abs() < 0.01);
    }

    #[test]
    fn zero_stages_predict_the_mean() {
        let x = vec![vec![0.0], vec![1.0]];
        let y = vec![2.0, 4.0];
        let params = GbmParams {
            n_estimators: 0,
            ..GbmParams::default()
        };
        let model = GradientBoostedRegressor::fit(&x, &y, &params).unwrap();
        assert_eq!(model.predict(&[10.0]), 3.0);
    }

    #[test]
    fn fitting_is_deterministic() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| (i as f64).sin() * 10.0 + i as f64).collect();
        let a = GradientBoostedRegressor::fit(&x, &y, &GbmParams::default()).unwrap();
        let b = GradientBoostedRegressor::fit(&x, &y, &GbmParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = GradientBoostedRegressor::fit(&[], &[], &GbmParams::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
