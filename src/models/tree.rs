//! Least-squares regression trees (the weak learner of the boosted ensemble).
//!
//! Trees are grown depth-first with exhaustive threshold search:
//! - candidate thresholds are midpoints between consecutive distinct values
//! - the split maximizing the variance reduction wins
//! - leaves hold the mean target of their rows
//!
//! Feature columns are scanned in parallel. Ties resolve to the lowest feature
//! index and then the lowest threshold, so the grown tree does not depend on
//! thread scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit a tree to `(x, y)`. `x` is row-major; every row has the same width.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &TreeParams) -> Self {
        let mut nodes = Vec::new();
        if x.is_empty() {
            nodes.push(TreeNode::Leaf { value: 0.0 });
            return Self { nodes };
        }
        let indices: Vec<usize> = (0..x.len()).collect();
        grow(&mut nodes, x, y, indices, 0, params);
        Self { nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

fn grow(
    nodes: &mut Vec<TreeNode>,
    x: &[Vec<f64>],
    y: &[f64],
    indices: Vec<usize>,
    depth: usize,
    params: &TreeParams,
) -> usize {
    let node_id = nodes.len();
    let sum: f64 = indices.iter().map(|&i| y[i]).sum();
    nodes.push(TreeNode::Leaf {
        value: sum / indices.len() as f64,
    });

    if depth >= params.max_depth || indices.len() < params.min_samples_split.max(2) {
        return node_id;
    }
    let Some(split) = best_split(x, y, &indices, params.min_samples_leaf.max(1)) else {
        return node_id;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[i][split.feature] <= split.threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        return node_id;
    }

    let left = grow(nodes, x, y, left_idx, depth + 1, params);
    let right = grow(nodes, x, y, right_idx, depth + 1, params);
    nodes[node_id] = TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    node_id
}

fn best_split(x: &[Vec<f64>], y: &[f64], indices: &[usize], min_leaf: usize) -> Option<SplitCandidate> {
    let n_features = x[indices[0]].len();
    let n = indices.len() as f64;
    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    let parent_gain = total * total / n;

    // Evaluate each feature independently (parallel); collect keeps feature order.
    let per_feature: Vec<SplitCandidate> = (0..n_features)
        .into_par_iter()
        .filter_map(|feature| best_split_for_feature(x, y, indices, feature, min_leaf))
        .collect();

    let mut best: Option<SplitCandidate> = None;
    for c in per_feature {
        if best.is_none_or(|b| c.gain > b.gain) {
            best = Some(c);
        }
    }

    // Require a strict reduction of squared error.
    let tolerance = f64::EPSILON * parent_gain.abs().max(1.0);
    best.filter(|b| b.gain - parent_gain > tolerance)
}

fn best_split_for_feature(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    feature: usize,
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    if n < 2 * min_leaf {
        return None;
    }
    let total: f64 = pairs.iter().map(|p| p.1).sum();

    let mut best: Option<SplitCandidate> = None;
    let mut left_sum = 0.0;
    for k in 1..n {
        left_sum += pairs[k - 1].1;
        if k < min_leaf || n - k < min_leaf {
            continue;
        }
        let (lo, hi) = (pairs[k - 1].0, pairs[k].0);
        if lo >= hi {
            continue;
        }

        let right_sum = total - left_sum;
        // Maximizing Σ_l²/n_l + Σ_r²/n_r is equivalent to minimizing child SSE.
        let gain = left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
        if best.is_none_or(|b| gain > b.gain) {
            let mid = lo + (hi - lo) / 2.0;
            let threshold = if mid < hi { mid } else { lo };
            best = Some(SplitCandidate {
                feature,
                threshold,
                gain,
            });
        }
    }
    best
}
