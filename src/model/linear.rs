//! Ordinary least squares via the normal equations

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::Model;
use crate::error::{MartcastError, Result};

/// Linear regression fit by solving the normal equations with a Cholesky
/// factorization. A small ridge term keeps the system solvable when
/// features are collinear (one-hot groups frequently are).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    /// Ridge term added to the diagonal of the Gram matrix
    pub ridge: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            ridge: 1e-8,
        }
    }

    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Model for LinearRegression {
    fn name(&self) -> &'static str {
        "linear_regression"
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
        if n_samples == 0 {
            return Err(MartcastError::ValidationError(
                "cannot fit on zero samples".to_string(),
            ));
        }

        // Center so the intercept falls out of the system
        let x_means: Array1<f64> = (0..n_features)
            .map(|j| x.column(j).sum() / n_samples as f64)
            .collect();
        let y_mean = y.sum() / n_samples as f64;

        let mut gram = Array2::zeros((n_features, n_features));
        let mut moment = Array1::zeros(n_features);
        for i in 0..n_samples {
            for j in 0..n_features {
                let xj = x[[i, j]] - x_means[j];
                moment[j] += xj * (y[i] - y_mean);
                for k in j..n_features {
                    gram[[j, k]] += xj * (x[[i, k]] - x_means[k]);
                }
            }
        }
        for j in 0..n_features {
            gram[[j, j]] += self.ridge;
            for k in 0..j {
                gram[[j, k]] = gram[[k, j]];
            }
        }

        let coefficients = cholesky_solve(&gram, &moment)?;
        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(x_means.iter())
                .map(|(c, m)| c * m)
                .sum::<f64>();
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(MartcastError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(MartcastError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Solve `a * x = b` for symmetric positive definite `a`
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(MartcastError::ValidationError(
                        "normal equations matrix is not positive definite".to_string(),
                    ));
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // Forward then back substitution
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Ok(x)
}
