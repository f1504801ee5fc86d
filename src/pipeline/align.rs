//! Alignment of an encoded table to a reference feature schema

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MartcastError, Result};

/// Ordered list of feature column names captured from the encoded training
/// table. Scoring tables are aligned to this before prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Capture the column names of an encoded table, in order
    pub fn from_dataframe(df: &DataFrame) -> Self {
        Self {
            columns: df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Reindex a candidate table to exactly the reference schema: columns the
/// candidate is missing are added as zero-filled, columns the schema does
/// not know are dropped, and the result carries the schema's columns in the
/// schema's order. Pure with respect to its inputs; row count and row order
/// are preserved.
pub fn align_to_schema(schema: &FeatureSchema, df: &DataFrame) -> Result<DataFrame> {
    if schema.is_empty() {
        return Err(MartcastError::SchemaError(
            "reference schema has no columns".to_string(),
        ));
    }

    let mut candidate = df.clone();
    for col in schema.columns() {
        if candidate.column(col).is_err() {
            let zeros = Float64Chunked::full(col.as_str().into(), 0.0, candidate.height());
            candidate.with_column(zeros.into_series())?;
        }
    }

    // select drops extras and fixes the order in one pass
    let aligned = candidate.select(schema.columns().iter().map(|c| c.as_str()))?;
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_df() -> DataFrame {
        df!(
            "a" => &[1.0, 2.0],
            "b" => &[3.0, 4.0],
            "c" => &[5.0, 6.0],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_captures_order() {
        let schema = FeatureSchema::from_dataframe(&reference_df());
        assert_eq!(schema.columns(), &["a", "b", "c"]);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_missing_columns_zero_filled() {
        let schema = FeatureSchema::from_dataframe(&reference_df());
        let candidate = df!("a" => &[9.0], "c" => &[7.0]).unwrap();

        let aligned = align_to_schema(&schema, &candidate).unwrap();
        assert_eq!(
            aligned
                .get_column_names()
                .into_iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        let b = aligned.column("b").unwrap().f64().unwrap();
        assert_eq!(b.get(0).unwrap(), 0.0);
    }

    #[test]
    fn test_extra_columns_dropped_and_order_fixed() {
        let schema = FeatureSchema::from_dataframe(&reference_df());
        let candidate = df!(
            "extra" => &[1.0],
            "c" => &[7.0],
            "b" => &[8.0],
            "a" => &[9.0],
        )
        .unwrap();

        let aligned = align_to_schema(&schema, &candidate).unwrap();
        assert!(aligned.column("extra").is_err());
        assert_eq!(
            aligned
                .get_column_names()
                .into_iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        let a = aligned.column("a").unwrap().f64().unwrap();
        assert_eq!(a.get(0).unwrap(), 9.0);
    }

    #[test]
    fn test_align_is_idempotent() {
        let schema = FeatureSchema::from_dataframe(&reference_df());
        let once = align_to_schema(&schema, &reference_df()).unwrap();
        let twice = align_to_schema(&schema, &once).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_row_count_preserved() {
        let schema = FeatureSchema::from_dataframe(&reference_df());
        let candidate = df!("a" => &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let aligned = align_to_schema(&schema, &candidate).unwrap();
        assert_eq!(aligned.height(), 4);
    }

    #[test]
    fn test_empty_schema_rejected() {
        let schema = FeatureSchema { columns: vec![] };
        assert!(align_to_schema(&schema, &reference_df()).is_err());
    }
}
