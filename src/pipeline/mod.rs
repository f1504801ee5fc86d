//! Sales preprocessing pipeline.
//!
//! Stages run in a fixed order: clean, engineer features, encode
//! categoricals, scale continuous columns, align to the training schema.
//! Everything stateful (encoder vocabularies, scaler parameters, the
//! feature schema) is captured once from the labeled table and replayed
//! verbatim on scoring tables.

pub mod align;
pub mod cleaner;
pub mod columns;
pub mod config;
pub mod encoder;
pub mod features;
pub mod scaler;

pub use align::{align_to_schema, FeatureSchema};
pub use cleaner::Cleaner;
pub use config::PipelineConfig;
pub use encoder::Encoder;
pub use features::FeatureBuilder;
pub use scaler::Scaler;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{MartcastError, Result};
use columns::{ITEM_ID, OUTLET_ESTABLISHMENT_YEAR, TARGET};

/// End-to-end preprocessing pipeline with fitted state.
///
/// `fit_transform` consumes the labeled table and produces the model-ready
/// feature table plus the target; `transform` replays the captured state on
/// any later table. The fitted state round-trips through JSON so training
/// and scoring can run in separate processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesPipeline {
    config: PipelineConfig,
    encoder: Encoder,
    scaler: Scaler,
    schema: Option<FeatureSchema>,
    is_fitted: bool,
}

impl SalesPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            encoder: Encoder::new(),
            scaler: Scaler::new(),
            schema: None,
            is_fitted: false,
        }
    }

    /// Fit on the labeled table and return the encoded feature table plus
    /// the target column. The identifier and establishment-year columns are
    /// dropped after feature derivation; the target never enters the
    /// feature table.
    pub fn fit_transform(&mut self, train: &DataFrame) -> Result<(DataFrame, Series)> {
        self.config.validate()?;
        if train.column(TARGET).is_err() {
            return Err(MartcastError::SchemaError(TARGET.to_string()));
        }
        info!(rows = train.height(), "fitting sales pipeline");

        let engineered = self.engineer(train)?;
        let target = engineered
            .column(TARGET)?
            .cast(&DataType::Float64)?
            .as_materialized_series()
            .clone();

        let encoded = self.encoder.fit_transform(&engineered)?;
        let scaled = self.scaler.fit_transform(&encoded)?;
        let features = drop_non_features(&scaled)?;
        ensure_finite(&features)?;

        self.schema = Some(FeatureSchema::from_dataframe(&features));
        self.is_fitted = true;
        debug!(columns = features.width(), "captured feature schema");
        Ok((features, target))
    }

    /// Replay the fitted state on a scoring table. The result carries
    /// exactly the training schema's columns, in order.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let schema = self.schema.as_ref().ok_or(MartcastError::ModelNotFitted)?;
        debug!(rows = df.height(), "transforming table with fitted pipeline");

        let engineered = self.engineer(df)?;
        let encoded = self.encoder.transform(&engineered)?;
        let scaled = self.scaler.transform(&encoded)?;
        let features = drop_non_features(&scaled)?;
        let aligned = align_to_schema(schema, &features)?;
        ensure_finite(&aligned)?;
        Ok(aligned)
    }

    /// Clean and derive features; shared by the fit and scoring paths
    fn engineer(&self, df: &DataFrame) -> Result<DataFrame> {
        let cleaned = Cleaner::new().clean(df)?;
        FeatureBuilder::new(&self.config).build(&cleaned)
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Persist the fitted state as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.is_fitted {
            return Err(MartcastError::ModelNotFitted);
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "saved fitted pipeline");
        Ok(())
    }

    /// Restore a fitted pipeline from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let mut pipeline: Self = serde_json::from_str(&json)?;
        pipeline.encoder.rebuild_outlet_codes();
        if !pipeline.is_fitted {
            return Err(MartcastError::ModelNotFitted);
        }
        Ok(pipeline)
    }
}

/// Drop the columns that never enter the feature matrix
fn drop_non_features(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.drop(ITEM_ID)?.drop(OUTLET_ESTABLISHMENT_YEAR)?;
    if result.column(TARGET).is_ok() {
        result = result.drop(TARGET)?;
    }
    Ok(result)
}

/// Reject nulls and non-finite values before anything reaches a model
fn ensure_finite(df: &DataFrame) -> Result<()> {
    for col in df.get_columns() {
        if col.null_count() > 0 {
            return Err(MartcastError::DataQualityError(format!(
                "column '{}' carries nulls after preprocessing",
                col.name()
            )));
        }
        let values = col.cast(&DataType::Float64)?;
        if values.f64()?.into_iter().flatten().any(|v| !v.is_finite()) {
            return Err(MartcastError::DataQualityError(format!(
                "column '{}' carries non-finite values after preprocessing",
                col.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::columns::*;

    fn labeled_df() -> DataFrame {
        df!(
            ITEM_ID => &["FDA15", "DRC01", "NCD19", "FDX07", "FDA15", "DRC01"],
            ITEM_WEIGHT => &[Some(9.3), Some(5.9), None, Some(19.2), Some(9.3), Some(5.9)],
            ITEM_FAT_CONTENT => &["Low Fat", "reg", "LF", "Regular", "Low Fat", "Regular"],
            ITEM_VISIBILITY => &[0.016, 0.0, 0.054, 0.062, 0.021, 0.038],
            ITEM_TYPE => &["Dairy", "Soft Drinks", "Household", "Fruits and Vegetables", "Dairy", "Soft Drinks"],
            ITEM_MRP => &[249.8, 48.3, 53.9, 182.1, 249.8, 48.3],
            OUTLET_ID => &["OUT049", "OUT018", "OUT049", "OUT018", "OUT049", "OUT018"],
            OUTLET_ESTABLISHMENT_YEAR => &[1999i32, 2009, 1999, 2009, 1999, 2009],
            OUTLET_SIZE => &[Some("Medium"), None, Some("Medium"), Some("Small"), Some("Medium"), Some("Small")],
            OUTLET_LOCATION_TYPE => &["Tier 1", "Tier 3", "Tier 1", "Tier 3", "Tier 1", "Tier 3"],
            OUTLET_TYPE => &["Supermarket Type1", "Supermarket Type2", "Supermarket Type1", "Supermarket Type2", "Supermarket Type1", "Supermarket Type2"],
            TARGET => &[3735.1, 443.4, 994.7, 732.4, 3654.9, 556.6],
        )
        .unwrap()
    }

    fn unlabeled_df() -> DataFrame {
        labeled_df().drop(TARGET).unwrap()
    }

    #[test]
    fn test_fit_transform_produces_numeric_features() {
        let mut pipeline = SalesPipeline::new(PipelineConfig::default());
        let (features, target) = pipeline.fit_transform(&labeled_df()).unwrap();

        assert!(pipeline.is_fitted());
        assert_eq!(features.height(), 6);
        assert_eq!(target.len(), 6);
        assert!(features.column(ITEM_ID).is_err());
        assert!(features.column(TARGET).is_err());
        assert!(features.column(OUTLET_ESTABLISHMENT_YEAR).is_err());
        assert!(ensure_finite(&features).is_ok());
    }

    #[test]
    fn test_transform_matches_training_schema() {
        let mut pipeline = SalesPipeline::new(PipelineConfig::default());
        let (features, _) = pipeline.fit_transform(&labeled_df()).unwrap();

        let scored = pipeline.transform(&unlabeled_df()).unwrap();
        assert_eq!(
            scored.get_column_names(),
            features.get_column_names()
        );
        assert_eq!(scored.height(), 6);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let pipeline = SalesPipeline::new(PipelineConfig::default());
        let err = pipeline.transform(&unlabeled_df()).unwrap_err();
        assert!(matches!(err, MartcastError::ModelNotFitted));
    }

    #[test]
    fn test_missing_target_is_schema_error() {
        let mut pipeline = SalesPipeline::new(PipelineConfig::default());
        let err = pipeline.fit_transform(&unlabeled_df()).unwrap_err();
        assert!(matches!(err, MartcastError::SchemaError(c) if c == TARGET));
    }

    #[test]
    fn test_zero_weight_rejected_at_model_boundary() {
        let mut df = labeled_df();
        df.with_column(Series::new(
            ITEM_WEIGHT.into(),
            &[0.0, 5.9, 8.0, 19.2, 9.3, 5.9],
        ))
        .unwrap();

        let mut pipeline = SalesPipeline::new(PipelineConfig::default());
        let err = pipeline.fit_transform(&df).unwrap_err();
        assert!(matches!(err, MartcastError::DataQualityError(_)));
    }

    #[test]
    fn test_fitted_state_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");

        let mut pipeline = SalesPipeline::new(PipelineConfig::default());
        pipeline.fit_transform(&labeled_df()).unwrap();
        pipeline.save(&path).unwrap();

        let restored = SalesPipeline::load(&path).unwrap();
        let a = pipeline.transform(&unlabeled_df()).unwrap();
        let b = restored.transform(&unlabeled_df()).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_save_unfitted_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = SalesPipeline::new(PipelineConfig::default());
        assert!(pipeline.save(&dir.path().join("pipeline.json")).is_err());
    }
}
