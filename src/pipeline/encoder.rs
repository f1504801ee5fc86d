//! Categorical encoding with fitted, replayable vocabularies.
//!
//! Two strategies, mirroring the asymmetry the pipeline depends on:
//! - One-hot with a dropped reference category. Vocabularies are captured
//!   from the training table at fit time and replayed verbatim; a value
//!   unseen at fit time encodes as the all-zero row for its group, never as
//!   a new column.
//! - Integer-code (label) encoding for the outlet identifier. An unseen
//!   value here is a hard `UnseenCategoryError`: silently inventing an id
//!   for a new outlet would feed the model an arbitrary but wrong code.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::columns::{ONEHOT_COLUMNS, OUTLET_ID};
use crate::error::{MartcastError, Result};

/// Fitted categorical encoder. Created once from the training table and
/// passed by reference into every subsequent transform; never refit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    /// Sorted fit-time vocabulary per one-hot column, in `ONEHOT_COLUMNS`
    /// order. The first entry of each vocabulary is the dropped reference
    /// category.
    onehot_vocabularies: Vec<(String, Vec<String>)>,
    /// Sorted fit-time vocabulary of the label-encoded outlet identifier
    outlet_vocabulary: Vec<String>,
    #[serde(skip)]
    outlet_codes: HashMap<String, i32>,
    is_fitted: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            onehot_vocabularies: Vec::new(),
            outlet_vocabulary: Vec::new(),
            outlet_codes: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Capture vocabularies from the training table
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.onehot_vocabularies.clear();
        for col in ONEHOT_COLUMNS {
            let vocabulary = sorted_unique(df, col)?;
            if vocabulary.is_empty() {
                return Err(MartcastError::DataQualityError(format!(
                    "cannot fit one-hot vocabulary for '{col}': no values"
                )));
            }
            self.onehot_vocabularies
                .push((col.to_string(), vocabulary));
        }

        self.outlet_vocabulary = sorted_unique(df, OUTLET_ID)?;
        self.rebuild_outlet_codes();

        self.is_fitted = true;
        Ok(self)
    }

    /// Encode a table with the fit-time vocabularies. One-hot source
    /// columns are replaced by their indicator groups; the outlet
    /// identifier is replaced by its integer code.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(MartcastError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col, vocabulary) in &self.onehot_vocabularies {
            let values = result
                .column(col)
                .map_err(|_| MartcastError::SchemaError(col.clone()))?
                .str()?
                .clone();

            // vocabulary[0] is the dropped reference category
            for category in &vocabulary[1..] {
                let flags: Int32Chunked = values
                    .into_iter()
                    .map(|v| Some(i32::from(v == Some(category.as_str()))))
                    .collect();
                let name = format!("{col}_{category}");
                result.with_column(flags.with_name(name.into()).into_series())?;
            }
            result = result.drop(col)?;
        }

        result = self.encode_outlet_id(&result)?;
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn encode_outlet_id(&self, df: &DataFrame) -> Result<DataFrame> {
        let ids = df
            .column(OUTLET_ID)
            .map_err(|_| MartcastError::SchemaError(OUTLET_ID.to_string()))?
            .str()?
            .clone();

        let codes: Vec<i32> = ids
            .into_iter()
            .map(|id| {
                let id = id.ok_or_else(|| {
                    MartcastError::DataQualityError(format!("null value in '{OUTLET_ID}'"))
                })?;
                self.outlet_codes.get(id).copied().ok_or_else(|| {
                    MartcastError::UnseenCategoryError {
                        column: OUTLET_ID.to_string(),
                        value: id.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<i32>>>()?;

        let mut result = df.clone();
        result.with_column(Series::new(OUTLET_ID.into(), codes))?;
        Ok(result)
    }

    /// Reconstruct the category of each row from a one-hot group; an
    /// all-zero group decodes to the dropped reference category.
    pub fn decode_onehot(&self, df: &DataFrame, column: &str) -> Result<Vec<String>> {
        let vocabulary = self
            .onehot_vocabularies
            .iter()
            .find(|(col, _)| col == column)
            .map(|(_, v)| v)
            .ok_or_else(|| MartcastError::SchemaError(column.to_string()))?;

        let mut decoded = vec![vocabulary[0].clone(); df.height()];
        for category in &vocabulary[1..] {
            let flags = df
                .column(&format!("{column}_{category}"))
                .map_err(|_| MartcastError::SchemaError(format!("{column}_{category}")))?
                .i32()?;
            for (i, flag) in flags.into_iter().enumerate() {
                if flag == Some(1) {
                    decoded[i] = category.clone();
                }
            }
        }
        Ok(decoded)
    }

    /// Fit-time vocabulary of a one-hot column (first entry is the dropped
    /// reference category)
    pub fn onehot_vocabulary(&self, column: &str) -> Option<&[String]> {
        self.onehot_vocabularies
            .iter()
            .find(|(col, _)| col == column)
            .map(|(_, v)| v.as_slice())
    }

    /// Fit-time vocabulary of the label-encoded outlet identifier
    pub fn outlet_vocabulary(&self) -> &[String] {
        &self.outlet_vocabulary
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Rebuild the code lookup from the serialized vocabulary (the map
    /// itself is skipped during serialization)
    pub fn rebuild_outlet_codes(&mut self) {
        self.outlet_codes = self
            .outlet_vocabulary
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code as i32))
            .collect();
    }
}

/// Sorted unique non-null values of a string column
fn sorted_unique(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let values = df
        .column(column)
        .map_err(|_| MartcastError::SchemaError(column.to_string()))?
        .str()?;

    let mut unique: Vec<String> = values
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    unique.sort();
    unique.dedup();
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::columns::*;

    fn engineered_df() -> DataFrame {
        df!(
            ITEM_FAT_CONTENT => &["Low Fat", "Regular", "Low Fat", "Regular"],
            OUTLET_SIZE => &["Medium", "Small", "High", "Medium"],
            OUTLET_LOCATION_TYPE => &["Tier 1", "Tier 3", "Tier 1", "Tier 2"],
            ITEM_CATEGORY => &["Food", "Drinks", "Non-Consumable", "Food"],
            OUTLET_AGE_CATEGORY => &["Mid", "Old", "Young", "Mid"],
            OUTLET_TYPE => &["Supermarket Type1", "Grocery Store", "Supermarket Type1", "Supermarket Type2"],
            ITEM_TYPE => &["Dairy", "Soft Drinks", "Household", "Dairy"],
            OUTLET_ID => &["OUT018", "OUT049", "OUT018", "OUT027"],
        )
        .unwrap()
    }

    #[test]
    fn test_onehot_drops_reference_category() {
        let mut encoder = Encoder::new();
        let encoded = encoder.fit_transform(&engineered_df()).unwrap();

        // Sorted vocabulary {Drinks, Food, Non-Consumable}: Drinks is the
        // dropped reference, so only two indicator columns exist
        assert!(encoded.column("Item_Category_Food").is_ok());
        assert!(encoded.column("Item_Category_Non-Consumable").is_ok());
        assert!(encoded.column("Item_Category_Drinks").is_err());
        // Source column replaced
        assert!(encoded.column(ITEM_CATEGORY).is_err());
    }

    #[test]
    fn test_onehot_round_trip() {
        let df = engineered_df();
        let mut encoder = Encoder::new();
        let encoded = encoder.fit_transform(&df).unwrap();

        for col in ONEHOT_COLUMNS {
            let decoded = encoder.decode_onehot(&encoded, col).unwrap();
            let original: Vec<String> = df
                .column(col)
                .unwrap()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| v.unwrap().to_string())
                .collect();
            assert_eq!(decoded, original, "round trip failed for {col}");
        }
    }

    #[test]
    fn test_unseen_onehot_value_is_all_zeros() {
        let mut encoder = Encoder::new();
        encoder.fit(&engineered_df()).unwrap();

        let mut scoring = engineered_df();
        scoring
            .with_column(Series::new(
                OUTLET_SIZE.into(),
                &["Gigantic", "Small", "High", "Medium"],
            ))
            .unwrap();

        let encoded = encoder.transform(&scoring).unwrap();
        let vocabulary = encoder.onehot_vocabulary(OUTLET_SIZE).unwrap().to_vec();
        for category in &vocabulary[1..] {
            let flags = encoded
                .column(&format!("{OUTLET_SIZE}_{category}"))
                .unwrap()
                .i32()
                .unwrap();
            assert_eq!(flags.get(0).unwrap(), 0);
        }
        // All-zero group decodes to the reference category, by contract
        let decoded = encoder.decode_onehot(&encoded, OUTLET_SIZE).unwrap();
        assert_eq!(decoded[0], vocabulary[0]);
    }

    #[test]
    fn test_outlet_id_label_encoding_is_sorted() {
        let mut encoder = Encoder::new();
        let encoded = encoder.fit_transform(&engineered_df()).unwrap();

        // Sorted vocabulary: OUT018 -> 0, OUT027 -> 1, OUT049 -> 2
        let codes = encoded.column(OUTLET_ID).unwrap().i32().unwrap();
        assert_eq!(codes.get(0).unwrap(), 0);
        assert_eq!(codes.get(1).unwrap(), 2);
        assert_eq!(codes.get(3).unwrap(), 1);
    }

    #[test]
    fn test_unseen_outlet_id_is_an_error() {
        let mut encoder = Encoder::new();
        encoder.fit(&engineered_df()).unwrap();

        let mut scoring = engineered_df();
        scoring
            .with_column(Series::new(
                OUTLET_ID.into(),
                &["OUT099", "OUT049", "OUT018", "OUT027"],
            ))
            .unwrap();

        let err = encoder.transform(&scoring).unwrap_err();
        assert!(matches!(
            err,
            MartcastError::UnseenCategoryError { column, value }
                if column == OUTLET_ID && value == "OUT099"
        ));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let encoder = Encoder::new();
        let err = encoder.transform(&engineered_df()).unwrap_err();
        assert!(matches!(err, MartcastError::ModelNotFitted));
    }

    #[test]
    fn test_state_survives_serialization() {
        let mut encoder = Encoder::new();
        encoder.fit(&engineered_df()).unwrap();

        let json = serde_json::to_string(&encoder).unwrap();
        let mut restored: Encoder = serde_json::from_str(&json).unwrap();
        restored.rebuild_outlet_codes();

        let a = encoder.transform(&engineered_df()).unwrap();
        let b = restored.transform(&engineered_df()).unwrap();
        assert!(a.equals(&b));
    }
}
