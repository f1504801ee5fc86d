//! martcast - Retail sales prediction pipeline
//!
//! A batch pipeline for BigMart-style retail sales data:
//! - Cleaning (imputation, label normalization, visibility sentinel fix)
//! - Feature engineering (outlet age, item category, price ratios)
//! - Categorical encoding with fitted, replayable vocabularies
//! - Train/scoring schema alignment
//! - Regression model training, comparison, and randomized tuning
//!
//! # Modules
//! - [`pipeline`] - Cleaner, FeatureBuilder, Encoder, Aligner, Scaler and
//!   the fit-once orchestrator
//! - [`model`] - Native regressors, metrics, splits, randomized search
//! - [`data`] - CSV loading/saving and DataFrame/matrix conversion
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod model;
pub mod pipeline;

pub mod cli;

pub use error::{MartcastError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{MartcastError, Result};

    pub use crate::pipeline::{
        align_to_schema, Cleaner, Encoder, FeatureBuilder, FeatureSchema, PipelineConfig,
        SalesPipeline, Scaler,
    };

    pub use crate::model::{
        GradientBoostingConfig, GradientBoostingRegressor, LinearRegression, Model,
        RandomForestRegressor, RandomizedSearch, RegressionMetrics, SearchSpace,
    };
}
