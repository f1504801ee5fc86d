//! Regression models, metrics, splits, and hyperparameter search

pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear;
pub mod metrics;
pub mod random_forest;
pub mod search;
pub mod split;

pub use decision_tree::DecisionTreeRegressor;
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear::LinearRegression;
pub use metrics::RegressionMetrics;
pub use random_forest::RandomForestRegressor;
pub use search::{RandomizedSearch, SearchOutcome, SearchSpace, TrialResult};
pub use split::{train_test_split, KFold};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Common interface for the regressors
pub trait Model: Send + Sync {
    fn name(&self) -> &'static str;
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Validation metrics for one fitted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub name: String,
    pub metrics: RegressionMetrics,
}

/// Fit each model on the training split and score it on the validation
/// split. Reports come back sorted by RMSE, best first.
pub fn compare_models(
    models: &mut [Box<dyn Model>],
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_val: &Array2<f64>,
    y_val: &Array1<f64>,
) -> Result<Vec<ModelReport>> {
    let mut reports = Vec::with_capacity(models.len());
    for model in models.iter_mut() {
        model.fit(x_train, y_train)?;
        let predictions = model.predict(x_val)?;
        let metrics = RegressionMetrics::compute(y_val, &predictions)?;
        info!(model = model.name(), rmse = metrics.rmse, r2 = metrics.r2, "evaluated model");
        reports.push(ModelReport {
            name: model.name().to_string(),
            metrics,
        });
    }
    reports.sort_by(|a, b| {
        a.metrics
            .rmse
            .partial_cmp(&b.metrics.rmse)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(reports)
}

/// The default model lineup for comparison runs
pub fn default_models(seed: u64) -> Vec<Box<dyn Model>> {
    vec![
        Box::new(LinearRegression::new()),
        Box::new(DecisionTreeRegressor::new().with_max_depth(8)),
        Box::new(
            RandomForestRegressor::new(100)
                .with_max_depth(10)
                .with_random_state(seed),
        ),
        Box::new(GradientBoostingRegressor::new(GradientBoostingConfig {
            random_state: seed,
            ..Default::default()
        })),
    ]
}
