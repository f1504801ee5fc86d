//! Cleaning of raw sales tables: imputation, label normalization, and the
//! visibility sentinel fix.

use polars::prelude::*;
use std::collections::HashMap;

use super::columns::*;
use crate::data::require_columns;
use crate::error::{MartcastError, Result};

/// Cleaner for raw sales rows.
///
/// Statistics (per-item mean weight, per-outlet-type mode size, positive
/// visibility median) are computed from the dataset being cleaned, so
/// cleaning is idempotent: a second pass over clean data is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Cleaner;

impl Cleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw table: after this, weight and size carry no nulls,
    /// fat-content labels are canonical, and visibility is strictly positive.
    pub fn clean(&self, df: &DataFrame) -> Result<DataFrame> {
        require_columns(df, REQUIRED_RAW)?;

        let mut result = df.clone();
        result = self.impute_weight(&result)?;
        result = self.impute_outlet_size(&result)?;
        result = self.normalize_fat_content(&result)?;
        result = self.fix_visibility_sentinel(&result)?;
        Ok(result)
    }

    /// Fill missing weights with the mean weight of the same item
    /// identifier, falling back to the global mean when an identifier has no
    /// observed weight at all.
    fn impute_weight(&self, df: &DataFrame) -> Result<DataFrame> {
        let ids = df.column(ITEM_ID)?.str()?.clone();
        let weights = df
            .column(ITEM_WEIGHT)?
            .cast(&DataType::Float64)?
            .f64()?
            .clone();

        if weights.null_count() == 0 {
            return Ok(df.clone());
        }

        let mut per_item: HashMap<String, (f64, usize)> = HashMap::new();
        let mut global_sum = 0.0;
        let mut global_count = 0usize;

        for (id, weight) in ids.into_iter().zip(weights.into_iter()) {
            if let (Some(id), Some(w)) = (id, weight) {
                let entry = per_item.entry(id.to_string()).or_insert((0.0, 0));
                entry.0 += w;
                entry.1 += 1;
                global_sum += w;
                global_count += 1;
            }
        }

        if global_count == 0 {
            return Err(MartcastError::DataQualityError(format!(
                "cannot impute '{ITEM_WEIGHT}': every value is missing"
            )));
        }
        let global_mean = global_sum / global_count as f64;

        let filled: Float64Chunked = ids
            .into_iter()
            .zip(weights.into_iter())
            .map(|(id, weight)| {
                weight.or_else(|| {
                    let item_mean = id
                        .and_then(|id| per_item.get(id))
                        .map(|(sum, count)| sum / *count as f64);
                    Some(item_mean.unwrap_or(global_mean))
                })
            })
            .collect();

        let mut result = df.clone();
        result.with_column(filled.with_name(ITEM_WEIGHT.into()).into_series())?;
        Ok(result)
    }

    /// Fill missing outlet sizes with the most frequent size among rows of
    /// the same outlet type. Ties and outlet types with no observed size
    /// resolve deterministically: equally frequent labels break toward the
    /// lexicographically smallest, and an unobserved outlet type falls back
    /// to the dataset-wide mode under the same rule.
    fn impute_outlet_size(&self, df: &DataFrame) -> Result<DataFrame> {
        let sizes = df.column(OUTLET_SIZE)?.str()?.clone();
        if sizes.null_count() == 0 {
            return Ok(df.clone());
        }
        let types = df.column(OUTLET_TYPE)?.str()?.clone();

        let mut per_type: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut global: HashMap<String, usize> = HashMap::new();

        for (outlet_type, size) in types.into_iter().zip(sizes.into_iter()) {
            if let (Some(t), Some(s)) = (outlet_type, size) {
                *per_type
                    .entry(t.to_string())
                    .or_default()
                    .entry(s.to_string())
                    .or_insert(0) += 1;
                *global.entry(s.to_string()).or_insert(0) += 1;
            }
        }

        let global_mode = mode_of(&global).ok_or_else(|| {
            MartcastError::DataQualityError(format!(
                "cannot impute '{OUTLET_SIZE}': every value is missing"
            ))
        })?;

        let filled: StringChunked = types
            .into_iter()
            .zip(sizes.into_iter())
            .map(|(outlet_type, size)| {
                size.map(|s| s.to_string()).or_else(|| {
                    let type_mode = outlet_type
                        .and_then(|t| per_type.get(t))
                        .and_then(mode_of);
                    Some(type_mode.unwrap_or_else(|| global_mode.clone()))
                })
            })
            .collect();

        let mut result = df.clone();
        result.with_column(filled.with_name(OUTLET_SIZE.into()).into_series())?;
        Ok(result)
    }

    /// Collapse known fat-content synonyms to canonical labels.
    /// Comparison is exact-string; unknown labels pass through unchanged.
    fn normalize_fat_content(&self, df: &DataFrame) -> Result<DataFrame> {
        let labels = df.column(ITEM_FAT_CONTENT)?.str()?;

        let normalized: StringChunked = labels
            .into_iter()
            .map(|label| {
                label.map(|l| match l {
                    "LF" | "low fat" => "Low Fat".to_string(),
                    "reg" => "Regular".to_string(),
                    other => other.to_string(),
                })
            })
            .collect();

        let mut result = df.clone();
        result.with_column(normalized.with_name(ITEM_FAT_CONTENT.into()).into_series())?;
        Ok(result)
    }

    /// Replace visibility values of exactly 0 with the median of the
    /// strictly-positive visibilities.
    fn fix_visibility_sentinel(&self, df: &DataFrame) -> Result<DataFrame> {
        let visibility = df
            .column(ITEM_VISIBILITY)?
            .cast(&DataType::Float64)?
            .f64()?
            .clone();

        let has_sentinel = visibility.into_iter().any(|v| v == Some(0.0));
        if !has_sentinel {
            return Ok(df.clone());
        }

        let mut positive: Vec<f64> = visibility
            .into_iter()
            .flatten()
            .filter(|v| *v > 0.0)
            .collect();
        if positive.is_empty() {
            return Err(MartcastError::DataQualityError(format!(
                "cannot fix '{ITEM_VISIBILITY}' sentinels: no positive values to take a median from"
            )));
        }
        positive.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if positive.len() % 2 == 0 {
            (positive[positive.len() / 2 - 1] + positive[positive.len() / 2]) / 2.0
        } else {
            positive[positive.len() / 2]
        };

        let fixed: Float64Chunked = visibility
            .into_iter()
            .map(|v| v.map(|v| if v == 0.0 { median } else { v }))
            .collect();

        let mut result = df.clone();
        result.with_column(fixed.with_name(ITEM_VISIBILITY.into()).into_series())?;
        Ok(result)
    }
}

/// Most frequent key; ties break toward the lexicographically smallest.
fn mode_of(counts: &HashMap<String, usize>) -> Option<String> {
    counts
        .iter()
        .max_by(|(label_a, count_a), (label_b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| label_b.cmp(label_a))
        })
        .map(|(label, _)| label.clone())
}
