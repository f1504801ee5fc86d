//! Data loading, saving, and matrix conversion

use crate::error::{MartcastError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a CSV file with header and inferred schema
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| MartcastError::DataError(format!("{}: {e}", path.display())))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| MartcastError::DataError(e.to_string()))
}

/// Save a DataFrame as CSV
pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| MartcastError::DataError(format!("{}: {e}", path.display())))?;

    CsvWriter::new(&mut file)
        .finish(df)
        .map_err(|e| MartcastError::DataError(e.to_string()))
}

/// Fail with `SchemaError` naming the first required column absent from `df`.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for col in columns {
        if df.column(col).is_err() {
            return Err(MartcastError::SchemaError(col.to_string()));
        }
    }
    Ok(())
}

/// Convert a fully numeric DataFrame into a row-major feature matrix.
///
/// Every column is cast to Float64; a column that cannot be cast is a
/// `DataError`, a null value is a `DataQualityError` (the pipeline
/// guarantees the modeler a complete table).
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();
    let mut matrix = Array2::zeros((n_rows, n_cols));

    for (j, col) in df.get_columns().iter().enumerate() {
        let series = col
            .cast(&DataType::Float64)
            .map_err(|_| MartcastError::DataError(format!("column '{}' is not numeric", col.name())))?;
        let ca = series
            .f64()
            .map_err(|e| MartcastError::DataError(e.to_string()))?;

        for (i, value) in ca.into_iter().enumerate() {
            match value {
                Some(v) => matrix[[i, j]] = v,
                None => {
                    return Err(MartcastError::DataQualityError(format!(
                        "null value in column '{}' at row {i}",
                        col.name()
                    )))
                }
            }
        }
    }

    Ok(matrix)
}

/// Convert a numeric column into a target vector
pub fn to_target_vector(df: &DataFrame, column: &str) -> Result<Array1<f64>> {
    let series = df
        .column(column)
        .map_err(|_| MartcastError::SchemaError(column.to_string()))?
        .cast(&DataType::Float64)
        .map_err(|e| MartcastError::DataError(e.to_string()))?;
    let ca = series
        .f64()
        .map_err(|e| MartcastError::DataError(e.to_string()))?;

    let values: Vec<f64> = ca
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                MartcastError::DataQualityError(format!("null target value in '{column}'"))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(Array1::from_vec(values))
}
