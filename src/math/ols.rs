//! Least squares solver.
//!
//! The linear baseline solves
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! over the feature matrix. Implementation choices:
//! - SVD, so tall and rank-deficient designs (e.g. a vocabulary category that
//!   never appears in the training subset) still produce the minimum-norm solution.
//! - Singular-value cutoffs are relative to the largest singular value because
//!   budget columns span many orders of magnitude (years ~2e3, amounts ~1e9).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let scale = svd.singular_values.max().max(1.0);

    // Try progressively looser tolerances if the strict solve is not finite.
    for &rel in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, rel * scale) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
