//! Regression metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MartcastError, Result};

/// Standard regression metrics over a prediction vector
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute metrics from actual and predicted values
    pub fn compute(actual: &Array1<f64>, predicted: &Array1<f64>) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(MartcastError::ShapeError {
                expected: format!("predicted length = {}", actual.len()),
                actual: format!("predicted length = {}", predicted.len()),
            });
        }
        if actual.is_empty() {
            return Err(MartcastError::ValidationError(
                "cannot compute metrics over zero samples".to_string(),
            ));
        }

        let n = actual.len() as f64;
        let mae = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (a - p).abs())
            .sum::<f64>()
            / n;
        let mse = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>()
            / n;
        let rmse = mse.sqrt();

        let mean = actual.iter().sum::<f64>() / n;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
        let ss_res: f64 = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (a - p).powi(2))
            .sum();
        // Constant target: perfect predictions score 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self { mae, mse, rmse, r2 })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE: {:.4}, MSE: {:.4}, RMSE: {:.4}, R2: {:.4}",
            self.mae, self.mse, self.rmse, self.r2
        )
    }
}
