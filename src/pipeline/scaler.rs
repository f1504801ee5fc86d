//! Standard scaling of continuous feature columns

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::columns::SCALED_COLUMNS;
use crate::error::{MartcastError, Result};

/// Per-column center and scale captured at fit time
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnParams {
    column: String,
    center: f64,
    scale: f64,
}

/// Standard scaler over the continuous feature columns. Parameters are
/// computed once from the training table and replayed on every table the
/// model sees; the scoring path never refits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scaler {
    params: Vec<ColumnParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute mean and standard deviation per scaled column. Non-finite
    /// values are excluded from the statistics; a constant column gets a
    /// scale of 1 so transforming it centers without dividing by zero.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.params.clear();
        for col in SCALED_COLUMNS {
            let values = df
                .column(col)
                .map_err(|_| MartcastError::SchemaError(col.to_string()))?
                .cast(&DataType::Float64)?
                .f64()?
                .clone();

            let finite: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
            if finite.is_empty() {
                return Err(MartcastError::DataQualityError(format!(
                    "cannot fit scaler for '{col}': no finite values"
                )));
            }

            let n = finite.len() as f64;
            let center = finite.iter().sum::<f64>() / n;
            let variance = finite.iter().map(|v| (v - center).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            let scale = if std > 0.0 { std } else { 1.0 };

            self.params.push(ColumnParams {
                column: col.to_string(),
                center,
                scale,
            });
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replay the fit-time parameters on a table
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(MartcastError::ModelNotFitted);
        }

        let mut result = df.clone();
        for params in &self.params {
            let values = result
                .column(&params.column)
                .map_err(|_| MartcastError::SchemaError(params.column.clone()))?
                .cast(&DataType::Float64)?
                .f64()?
                .clone();

            let scaled: Float64Chunked = values
                .into_iter()
                .map(|v| v.map(|v| (v - params.center) / params.scale))
                .collect();
            result.with_column(
                scaled
                    .with_name(params.column.as_str().into())
                    .into_series(),
            )?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::columns::*;

    fn numeric_df() -> DataFrame {
        df!(
            ITEM_WEIGHT => &[8.0, 10.0, 12.0],
            ITEM_VISIBILITY => &[0.02, 0.04, 0.06],
            ITEM_MRP => &[100.0, 200.0, 300.0],
            PRICE_PER_UNIT_WEIGHT => &[12.5, 20.0, 25.0],
            ITEM_VISIBILITY_LOG => &[0.0198, 0.0392, 0.0583],
        )
        .unwrap()
    }

    #[test]
    fn test_scaled_columns_have_zero_mean_unit_variance() {
        let mut scaler = Scaler::new();
        let scaled = scaler.fit_transform(&numeric_df()).unwrap();

        let weights = scaled.column(ITEM_WEIGHT).unwrap().f64().unwrap();
        let mean: f64 = weights.into_iter().flatten().sum::<f64>() / 3.0;
        let var: f64 = weights
            .into_iter()
            .flatten()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_replays_training_parameters() {
        let mut scaler = Scaler::new();
        scaler.fit(&numeric_df()).unwrap();

        let mut scoring = numeric_df();
        scoring
            .with_column(Series::new(ITEM_WEIGHT.into(), &[10.0, 10.0, 10.0]))
            .unwrap();

        // 10.0 is the training mean, so it maps to exactly 0
        let scaled = scaler.transform(&scoring).unwrap();
        let weights = scaled.column(ITEM_WEIGHT).unwrap().f64().unwrap();
        assert!(weights.get(0).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let mut df = numeric_df();
        df.with_column(Series::new(ITEM_MRP.into(), &[50.0, 50.0, 50.0]))
            .unwrap();

        let mut scaler = Scaler::new();
        let scaled = scaler.fit_transform(&df).unwrap();
        let mrp = scaled.column(ITEM_MRP).unwrap().f64().unwrap();
        assert!(mrp.into_iter().all(|v| v.unwrap() == 0.0));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let scaler = Scaler::new();
        let err = scaler.transform(&numeric_df()).unwrap_err();
        assert!(matches!(err, MartcastError::ModelNotFitted));
    }

    #[test]
    fn test_nan_excluded_from_fit_statistics() {
        let mut df = numeric_df();
        df.with_column(Series::new(
            PRICE_PER_UNIT_WEIGHT.into(),
            &[f64::NAN, 20.0, 25.0],
        ))
        .unwrap();

        let mut scaler = Scaler::new();
        let scaled = scaler.fit_transform(&df).unwrap();
        let ratio = scaled.column(PRICE_PER_UNIT_WEIGHT).unwrap().f64().unwrap();
        assert!(ratio.get(1).unwrap().is_finite());
        assert!(ratio.get(2).unwrap().is_finite());
    }
}
