//! Seeded shuffled hold-out split.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices assigned to each side of the split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// At least one row always stays in training. With fewer than two rows, or a
/// non-positive fraction, nothing is held out.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    if n < 2 || !(test_fraction.is_finite() && test_fraction > 0.0) {
        return SplitIndices {
            train: indices,
            test: Vec::new(),
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let train = indices.split_off(n_test);
    SplitIndices {
        train,
        test: indices,
    }
}
