//! Derived feature columns appended to a cleaned table

use polars::prelude::*;

use super::columns::*;
use super::config::PipelineConfig;
use crate::data::require_columns;
use crate::error::Result;

/// Appends engineered columns to a cleaned table. Source columns are never
/// mutated and no derived column depends on the target.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    reference_year: i32,
    young_age_max: i32,
    mid_age_max: i32,
}

impl FeatureBuilder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            reference_year: config.reference_year,
            young_age_max: config.young_age_max,
            mid_age_max: config.mid_age_max,
        }
    }

    /// Append all derived columns
    pub fn build(&self, df: &DataFrame) -> Result<DataFrame> {
        require_columns(df, REQUIRED_RAW)?;

        let mut result = df.clone();
        result = self.add_outlet_age(&result)?;
        result = self.add_item_category(&result)?;
        result = self.add_price_per_unit_weight(&result)?;
        result = self.add_visibility_log(&result)?;
        result = self.add_outlet_age_category(&result)?;
        result = self.add_non_consumable_flag(&result)?;
        Ok(result)
    }

    /// `Outlet_Age` = reference_year - establishment year
    fn add_outlet_age(&self, df: &DataFrame) -> Result<DataFrame> {
        let years = df
            .column(OUTLET_ESTABLISHMENT_YEAR)?
            .cast(&DataType::Int32)?;
        let ages: Int32Chunked = years
            .i32()?
            .into_iter()
            .map(|year| year.map(|y| self.reference_year - y))
            .collect();

        let mut result = df.clone();
        result.with_column(ages.with_name(OUTLET_AGE.into()).into_series())?;
        Ok(result)
    }

    /// `Item_Category` from the identifier prefix: "FD" is Food, "DR" is
    /// Drinks, everything else Non-Consumable. The same 2-character rule is
    /// applied to every dataset.
    fn add_item_category(&self, df: &DataFrame) -> Result<DataFrame> {
        let ids = df.column(ITEM_ID)?.str()?;
        let categories: StringChunked = ids
            .into_iter()
            .map(|id| id.map(|id| item_category(id).to_string()))
            .collect();

        let mut result = df.clone();
        result.with_column(categories.with_name(ITEM_CATEGORY.into()).into_series())?;
        Ok(result)
    }

    /// `Price_per_Unit_Weight` = MRP / weight. A zero weight yields NaN
    /// rather than a panic; the pipeline rejects non-finite values at the
    /// model boundary.
    fn add_price_per_unit_weight(&self, df: &DataFrame) -> Result<DataFrame> {
        let mrp = df.column(ITEM_MRP)?.cast(&DataType::Float64)?;
        let weight = df.column(ITEM_WEIGHT)?.cast(&DataType::Float64)?;

        let ratio: Float64Chunked = mrp
            .f64()?
            .into_iter()
            .zip(weight.f64()?.into_iter())
            .map(|(price, weight)| match (price, weight) {
                (Some(p), Some(w)) => Some(if w == 0.0 { f64::NAN } else { p / w }),
                _ => None,
            })
            .collect();

        let mut result = df.clone();
        result.with_column(ratio.with_name(PRICE_PER_UNIT_WEIGHT.into()).into_series())?;
        Ok(result)
    }

    /// `Item_Visibility_Log` = ln(1 + visibility)
    fn add_visibility_log(&self, df: &DataFrame) -> Result<DataFrame> {
        let visibility = df.column(ITEM_VISIBILITY)?.cast(&DataType::Float64)?;
        let log_scores: Float64Chunked = visibility
            .f64()?
            .into_iter()
            .map(|v| v.map(f64::ln_1p))
            .collect();

        let mut result = df.clone();
        result.with_column(log_scores.with_name(ITEM_VISIBILITY_LOG.into()).into_series())?;
        Ok(result)
    }

    /// `Outlet_Age_Category`: Young / Mid / Old by the configured bounds
    fn add_outlet_age_category(&self, df: &DataFrame) -> Result<DataFrame> {
        let years = df
            .column(OUTLET_ESTABLISHMENT_YEAR)?
            .cast(&DataType::Int32)?;
        let buckets: StringChunked = years
            .i32()?
            .into_iter()
            .map(|year| {
                year.map(|y| {
                    let age = self.reference_year - y;
                    if age <= self.young_age_max {
                        "Young".to_string()
                    } else if age <= self.mid_age_max {
                        "Mid".to_string()
                    } else {
                        "Old".to_string()
                    }
                })
            })
            .collect();

        let mut result = df.clone();
        result.with_column(buckets.with_name(OUTLET_AGE_CATEGORY.into()).into_series())?;
        Ok(result)
    }

    /// `Non_Consumable` = 1 for Non-Consumable items, 0 otherwise
    fn add_non_consumable_flag(&self, df: &DataFrame) -> Result<DataFrame> {
        let categories = df.column(ITEM_CATEGORY)?.str()?;
        let flags: Int32Chunked = categories
            .into_iter()
            .map(|category| category.map(|c| i32::from(c == "Non-Consumable")))
            .collect();

        let mut result = df.clone();
        result.with_column(flags.with_name(NON_CONSUMABLE.into()).into_series())?;
        Ok(result)
    }
}

/// Classify an item identifier by its 2-character prefix
fn item_category(item_id: &str) -> &'static str {
    if item_id.starts_with("FD") {
        "Food"
    } else if item_id.starts_with("DR") {
        "Drinks"
    } else {
        "Non-Consumable"
    }
}
