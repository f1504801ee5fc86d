//! Pipeline configuration

use serde::{Deserialize, Serialize};

use crate::error::{MartcastError, Result};

/// Configuration for the sales pipeline.
///
/// The reference year and age-bucket bounds are configuration rather than
/// per-call-site literals so that training and scoring can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Year outlet age is measured against
    pub reference_year: i32,

    /// Outlet age (years) up to and including which an outlet is "Young"
    pub young_age_max: i32,

    /// Outlet age (years) up to and including which an outlet is "Mid";
    /// anything older is "Old"
    pub mid_age_max: i32,

    /// Fraction of the labeled table held out for validation
    pub validation_fraction: f64,

    /// Random seed for splits, subsampling, and randomized search
    pub random_state: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_year: 2025,
            young_age_max: 15,
            mid_age_max: 25,
            validation_fraction: 0.2,
            random_state: 42,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the reference year
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Builder method to set the age-bucket bounds
    pub fn with_age_buckets(mut self, young_max: i32, mid_max: i32) -> Self {
        self.young_age_max = young_max;
        self.mid_age_max = mid_max;
        self
    }

    /// Builder method to set the validation fraction
    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.young_age_max >= self.mid_age_max {
            return Err(MartcastError::ConfigError(format!(
                "young_age_max ({}) must be below mid_age_max ({})",
                self.young_age_max, self.mid_age_max
            )));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) || self.validation_fraction == 0.0 {
            return Err(MartcastError::ConfigError(format!(
                "validation_fraction must be in (0, 1), got {}",
                self.validation_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.reference_year, 2025);
        assert_eq!(config.young_age_max, 15);
        assert_eq!(config.mid_age_max, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_reference_year(2026)
            .with_age_buckets(10, 20)
            .with_random_state(7);

        assert_eq!(config.reference_year, 2026);
        assert_eq!(config.young_age_max, 10);
        assert_eq!(config.random_state, 7);
    }

    #[test]
    fn test_invalid_buckets_rejected() {
        let config = PipelineConfig::new().with_age_buckets(25, 15);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        let config = PipelineConfig::new().with_validation_fraction(1.5);
        assert!(config.validate().is_err());
    }
}
