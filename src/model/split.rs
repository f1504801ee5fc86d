//! Seeded train/validation splits and k-fold partitioning

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{MartcastError, Result};

/// Shuffle rows with the given seed and split off the trailing fraction as
/// the validation set. Returns `(x_train, x_val, y_train, y_val)`.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    if n != y.len() {
        return Err(MartcastError::ShapeError {
            expected: format!("y length = {n}"),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(MartcastError::ValidationError(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n_test = ((n as f64) * test_fraction).round() as usize;
    if n_test == 0 || n_test == n {
        return Err(MartcastError::ValidationError(format!(
            "cannot split {n} rows with test_fraction {test_fraction}: one side would be empty"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let (test_indices, train_indices) = indices.split_at(n_test);

    let take = |rows: &[usize]| -> (Array2<f64>, Array1<f64>) {
        (
            x.select(Axis(0), rows),
            Array1::from_vec(rows.iter().map(|&i| y[i]).collect()),
        )
    };
    let (x_train, y_train) = take(train_indices);
    let (x_test, y_test) = take(test_indices);
    Ok((x_train, x_test, y_train, y_test))
}

/// K-fold index partitioner with shuffled, seeded assignment
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Produce `(train_indices, validation_indices)` pairs over `n` rows.
    /// Every row lands in exactly one validation fold; fold sizes differ by
    /// at most one.
    pub fn split(&self, n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(MartcastError::ValidationError(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if n < self.n_splits {
            return Err(MartcastError::ValidationError(format!(
                "cannot make {} folds from {n} rows",
                self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));

        let base = n / self.n_splits;
        let remainder = n % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let validation: Vec<usize> = indices[start..start + size].to_vec();
            let train: Vec<usize> = indices[..start]
                .iter()
                .chain(indices[start + size..].iter())
                .copied()
                .collect();
            folds.push((train, validation));
            start += size;
        }
        Ok(folds)
    }
}
