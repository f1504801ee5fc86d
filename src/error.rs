//! Error types for the martcast pipeline

use thiserror::Error;

/// Result type alias for martcast operations
pub type Result<T> = std::result::Result<T, MartcastError>;

/// Main error type for the martcast pipeline
#[derive(Error, Debug)]
pub enum MartcastError {
    /// A column required by a pipeline stage is missing from the input
    #[error("Schema error: required column '{0}' is missing")]
    SchemaError(String),

    /// A non-finite or otherwise undefined value reached a stage that
    /// cannot tolerate it (e.g. infinite price-per-weight at the model
    /// boundary)
    #[error("Data quality error: {0}")]
    DataQualityError(String),

    /// A label-encoded column value was not part of the fit-time vocabulary
    #[error("Unseen category '{value}' in label-encoded column '{column}'")]
    UnseenCategoryError { column: String, value: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for MartcastError {
    fn from(err: polars::error::PolarsError) -> Self {
        MartcastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for MartcastError {
    fn from(err: serde_json::Error) -> Self {
        MartcastError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = MartcastError::SchemaError("Item_Weight".to_string());
        assert_eq!(
            err.to_string(),
            "Schema error: required column 'Item_Weight' is missing"
        );
    }

    #[test]
    fn test_unseen_category_display() {
        let err = MartcastError::UnseenCategoryError {
            column: "Outlet_Identifier".to_string(),
            value: "OUT099".to_string(),
        };
        assert!(err.to_string().contains("OUT099"));
        assert!(err.to_string().contains("Outlet_Identifier"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MartcastError = io_err.into();
        assert!(matches!(err, MartcastError::IoError(_)));
    }
}
