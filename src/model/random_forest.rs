//! Random forest of regression trees

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTreeRegressor;
use super::Model;
use crate::error::{MartcastError, Result};

/// Bagged ensemble of regression trees. Each tree trains on a bootstrap
/// sample over a random sqrt-sized feature subset; predictions average
/// across trees. Tree seeds derive from the base seed, so a fixed seed
/// gives a fully reproducible forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    feature_subsets: Vec<Vec<usize>>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub random_state: u64,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            feature_subsets: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            random_state: 42,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Model for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(MartcastError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.n_estimators == 0 {
            return Err(MartcastError::ValidationError(
                "n_estimators must be positive".to_string(),
            ));
        }

        let subset_size = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let fitted: Result<Vec<(DecisionTreeRegressor, Vec<usize>)>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();
                let mut features: Vec<usize> = (0..n_features).collect();
                features.shuffle(&mut rng);
                features.truncate(subset_size);
                features.sort_unstable();

                let x_boot = x
                    .select(Axis(0), &sample_indices)
                    .select(Axis(1), &features);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTreeRegressor::new()
                    .with_min_samples_leaf(self.min_samples_leaf);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&x_boot, &y_boot)?;
                Ok((tree, features))
            })
            .collect();

        let (trees, feature_subsets) = fitted?.into_iter().unzip();
        self.trees = trees;
        self.feature_subsets = feature_subsets;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(MartcastError::ModelNotFitted);
        }

        let per_tree: Result<Vec<Array1<f64>>> = self
            .trees
            .par_iter()
            .zip(self.feature_subsets.par_iter())
            .map(|(tree, features)| tree.predict(&x.select(Axis(1), features)))
            .collect();
        let per_tree = per_tree?;

        let n = x.nrows();
        let predictions: Vec<f64> = (0..n)
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / per_tree.len() as f64)
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}
