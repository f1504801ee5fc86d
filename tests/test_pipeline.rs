//! Integration test: preprocessing pipeline end-to-end

use martcast::prelude::*;
use polars::prelude::*;

fn training_df() -> DataFrame {
    df!(
        "Item_Identifier" => &["FDA15", "DRC01", "NCD19", "FDX07", "FDA15", "DRC01", "NCN55", "FDX07"],
        "Item_Weight" => &[Some(9.3), Some(5.92), None, Some(19.2), Some(9.3), Some(5.92), Some(8.93), None],
        "Item_Fat_Content" => &["Low Fat", "Regular", "low fat", "LF", "Low Fat", "reg", "Low Fat", "Regular"],
        "Item_Visibility" => &[0.016, 0.019, 0.0, 0.054, 0.021, 0.038, 0.062, 0.013],
        "Item_Type" => &["Dairy", "Soft Drinks", "Household", "Fruits and Vegetables", "Dairy", "Soft Drinks", "Others", "Fruits and Vegetables"],
        "Item_MRP" => &[249.81, 48.27, 53.86, 182.1, 249.81, 48.27, 55.16, 182.1],
        "Outlet_Identifier" => &["OUT049", "OUT018", "OUT049", "OUT010", "OUT049", "OUT018", "OUT010", "OUT018"],
        "Outlet_Establishment_Year" => &[1999i32, 2009, 1999, 1998, 1999, 2009, 1998, 2009],
        "Outlet_Size" => &[Some("Medium"), Some("Medium"), Some("Medium"), None, Some("Medium"), Some("Medium"), None, Some("Medium")],
        "Outlet_Location_Type" => &["Tier 1", "Tier 3", "Tier 1", "Tier 3", "Tier 1", "Tier 3", "Tier 3", "Tier 3"],
        "Outlet_Type" => &["Supermarket Type1", "Supermarket Type2", "Supermarket Type1", "Grocery Store", "Supermarket Type1", "Supermarket Type2", "Grocery Store", "Supermarket Type2"],
        "Item_Outlet_Sales" => &[3735.14, 443.42, 994.71, 732.38, 3654.96, 556.61, 343.55, 818.12],
    )
    .unwrap()
}

fn scoring_df() -> DataFrame {
    training_df().drop("Item_Outlet_Sales").unwrap()
}

#[test]
fn test_fit_transform_yields_complete_numeric_table() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    let (features, target) = pipeline.fit_transform(&training_df()).unwrap();

    assert_eq!(features.height(), 8);
    assert_eq!(target.len(), 8);
    for col in features.get_columns() {
        assert_eq!(col.null_count(), 0, "column {} has nulls", col.name());
        assert!(
            col.cast(&DataType::Float64).is_ok(),
            "column {} is not numeric",
            col.name()
        );
    }
}

#[test]
fn test_identifier_and_target_never_become_features() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    let (features, _) = pipeline.fit_transform(&training_df()).unwrap();

    assert!(features.column("Item_Identifier").is_err());
    assert!(features.column("Item_Outlet_Sales").is_err());
    assert!(features.column("Outlet_Establishment_Year").is_err());
    // The outlet identifier survives, label-encoded
    assert!(features.column("Outlet_Identifier").is_ok());
}

#[test]
fn test_scoring_table_aligns_to_training_schema() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    let (features, _) = pipeline.fit_transform(&training_df()).unwrap();

    let scored = pipeline.transform(&scoring_df()).unwrap();
    assert_eq!(scored.get_column_names(), features.get_column_names());
}

#[test]
fn test_category_unseen_at_fit_time_encodes_to_zeros() {
    // Fit without any "High" outlet size, then score a table carrying one
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    pipeline.fit_transform(&training_df()).unwrap();

    let mut scoring = scoring_df();
    scoring
        .with_column(Series::new(
            "Outlet_Size".into(),
            &["High", "Medium", "Medium", "Small", "Medium", "Medium", "Small", "Medium"],
        ))
        .unwrap();

    let scored = pipeline.transform(&scoring).unwrap();
    for name in scored.get_column_names() {
        if name.as_str().starts_with("Outlet_Size_") {
            let flags = scored.column(name.as_str()).unwrap().i32().unwrap();
            assert_eq!(flags.get(0).unwrap(), 0);
        }
    }
}

#[test]
fn test_unseen_outlet_identifier_fails_loudly() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    pipeline.fit_transform(&training_df()).unwrap();

    let mut scoring = scoring_df();
    scoring
        .with_column(Series::new(
            "Outlet_Identifier".into(),
            &["OUT999", "OUT018", "OUT049", "OUT010", "OUT049", "OUT018", "OUT010", "OUT018"],
        ))
        .unwrap();

    let err = pipeline.transform(&scoring).unwrap_err();
    assert!(matches!(
        err,
        MartcastError::UnseenCategoryError { column, value }
            if column == "Outlet_Identifier" && value == "OUT999"
    ));
}

#[test]
fn test_pipeline_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");

    let mut pipeline = SalesPipeline::new(PipelineConfig::default().with_random_state(7));
    pipeline.fit_transform(&training_df()).unwrap();
    pipeline.save(&path).unwrap();

    let restored = SalesPipeline::load(&path).unwrap();
    let a = pipeline.transform(&scoring_df()).unwrap();
    let b = restored.transform(&scoring_df()).unwrap();
    assert!(a.equals(&b));
}

#[test]
fn test_transform_is_deterministic() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    pipeline.fit_transform(&training_df()).unwrap();

    let a = pipeline.transform(&scoring_df()).unwrap();
    let b = pipeline.transform(&scoring_df()).unwrap();
    assert!(a.equals(&b));
}

#[test]
fn test_dropped_raw_column_is_schema_error() {
    let df = training_df().drop("Item_Visibility").unwrap();
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    let err = pipeline.fit_transform(&df).unwrap_err();
    assert!(matches!(err, MartcastError::SchemaError(c) if c == "Item_Visibility"));
}

#[test]
fn test_features_flow_into_models() {
    let mut pipeline = SalesPipeline::new(PipelineConfig::default());
    let (features, target) = pipeline.fit_transform(&training_df()).unwrap();

    let x = martcast::data::to_feature_matrix(&features).unwrap();
    let y: ndarray::Array1<f64> = target
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();

    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();
    let predictions = model.predict(&x).unwrap();
    assert_eq!(predictions.len(), 8);
    assert!(predictions.iter().all(|p| p.is_finite()));
}
