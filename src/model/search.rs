//! Randomized hyperparameter search over gradient boosting

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::metrics::RegressionMetrics;
use super::split::KFold;
use super::Model;
use crate::error::{MartcastError, Result};

/// Candidate values per gradient boosting hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub subsample: Vec<f64>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200, 300, 500],
            learning_rate: vec![0.01, 0.05, 0.1, 0.2],
            max_depth: vec![3, 4, 5, 7],
            min_samples_leaf: vec![1, 3, 5],
            subsample: vec![0.6, 0.8, 1.0],
        }
    }
}

impl SearchSpace {
    fn validate(&self) -> Result<()> {
        let empty = self.n_estimators.is_empty()
            || self.learning_rate.is_empty()
            || self.max_depth.is_empty()
            || self.min_samples_leaf.is_empty()
            || self.subsample.is_empty();
        if empty {
            return Err(MartcastError::ValidationError(
                "every search space dimension needs at least one candidate".to_string(),
            ));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut ChaCha8Rng, seed: u64) -> GradientBoostingConfig {
        GradientBoostingConfig {
            n_estimators: *self.n_estimators.choose(rng).unwrap(),
            learning_rate: *self.learning_rate.choose(rng).unwrap(),
            max_depth: *self.max_depth.choose(rng).unwrap(),
            min_samples_leaf: *self.min_samples_leaf.choose(rng).unwrap(),
            subsample: *self.subsample.choose(rng).unwrap(),
            random_state: seed,
        }
    }
}

/// One evaluated configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub config: GradientBoostingConfig,
    pub mean_rmse: f64,
}

/// Outcome of a search: the winner plus every trial, sorted best first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best_config: GradientBoostingConfig,
    pub best_rmse: f64,
    pub trials: Vec<TrialResult>,
}

/// Random sampling of gradient boosting configurations, each scored by
/// k-fold cross-validated RMSE. Candidates evaluate in parallel; the seed
/// fixes both the sampled configurations and the fold assignment.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    pub space: SearchSpace,
    pub n_iter: usize,
    pub n_folds: usize,
    pub seed: u64,
}

impl RandomizedSearch {
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            n_iter: 10,
            n_folds: 5,
            seed: 42,
        }
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn run(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchOutcome> {
        self.space.validate()?;
        if self.n_iter == 0 {
            return Err(MartcastError::ValidationError(
                "n_iter must be positive".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let candidates: Vec<GradientBoostingConfig> = (0..self.n_iter)
            .map(|_| self.space.sample(&mut rng, self.seed))
            .collect();
        let folds = KFold::new(self.n_folds, self.seed).split(x.nrows())?;
        info!(
            candidates = candidates.len(),
            folds = folds.len(),
            "running randomized search"
        );

        let mut trials: Vec<TrialResult> = candidates
            .into_par_iter()
            .map(|config| {
                let mean_rmse = cross_validated_rmse(&config, x, y, &folds)?;
                Ok(TrialResult { config, mean_rmse })
            })
            .collect::<Result<Vec<TrialResult>>>()?;

        trials.sort_by(|a, b| {
            a.mean_rmse
                .partial_cmp(&b.mean_rmse)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = trials[0].clone();
        info!(rmse = best.mean_rmse, "search finished");

        Ok(SearchOutcome {
            best_config: best.config,
            best_rmse: best.mean_rmse,
            trials,
        })
    }
}

fn cross_validated_rmse(
    config: &GradientBoostingConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: &[(Vec<usize>, Vec<usize>)],
) -> Result<f64> {
    let mut total = 0.0;
    for (train, validation) in folds {
        let x_train = x.select(Axis(0), train);
        let y_train: Array1<f64> = Array1::from_vec(train.iter().map(|&i| y[i]).collect());
        let x_val = x.select(Axis(0), validation);
        let y_val: Array1<f64> = Array1::from_vec(validation.iter().map(|&i| y[i]).collect());

        let mut model = GradientBoostingRegressor::new(config.clone());
        model.fit(&x_train, &y_train)?;
        let predictions = model.predict(&x_val)?;
        total += RegressionMetrics::compute(&y_val, &predictions)?.rmse;
    }
    Ok(total / folds.len() as f64)
}
