//! # Calculator Configuration
//!
//! Run-wide settings for the carbon pipeline. Every field has a default, so
//! a configuration file only needs the values it changes.
//!
//! ## TOML Example
//!
//! ```toml
//! batch_size = 5
//! cache_max_age_secs = 86400
//! include_benefits = false
//! scope2_method = "market_based"
//! remote_provider_url = "https://epd.example.org/api"
//!
//! [fuel_factors]
//! kerosene = 2.54
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CarbonError, CarbonResult};
use crate::scopes::Scope2Method;

/// Default number of coefficient lookups issued concurrently
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Default cache lifetime for external coefficients (1 hour)
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 3600;

/// Share of the original A1-A5 charge re-incurred by each replacement
pub const DEFAULT_REPLACEMENT_INTENSITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    /// Coefficient lookups issued together per batch
    pub batch_size: usize,

    /// Time-to-live for cached external coefficients, in seconds
    pub cache_max_age_secs: u64,

    /// Maximum cached external coefficients
    pub cache_capacity: u64,

    /// Ask the external provider even when the local table has the key
    pub prefer_external: bool,

    /// Report module D (benefits beyond the system boundary)
    pub include_benefits: bool,

    /// Scope 2 accounting method; never mixed within one result
    pub scope2_method: Scope2Method,

    /// Share of the original A1-A5 charge re-incurred per replacement
    pub replacement_intensity: f64,

    /// Extra or overriding fuel factors (kg CO₂-e per unit of fuel)
    pub fuel_factors: BTreeMap<String, f64>,

    /// Base URL of a remote coefficient service
    pub remote_provider_url: Option<String>,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        CarbonConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            cache_capacity: 10_000,
            prefer_external: false,
            include_benefits: true,
            scope2_method: Scope2Method::LocationBased,
            replacement_intensity: DEFAULT_REPLACEMENT_INTENSITY,
            fuel_factors: BTreeMap::new(),
            remote_provider_url: None,
        }
    }
}

impl CarbonConfig {
    /// Parse a TOML configuration string.
    pub fn from_toml_str(contents: &str) -> CarbonResult<Self> {
        let config: CarbonConfig = toml::from_str(contents).map_err(|e| CarbonError::SerializationError {
            reason: format!("Invalid configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> CarbonResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CarbonError::file_error("read", path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> CarbonResult<()> {
        if self.batch_size == 0 {
            return Err(CarbonError::invalid_input(
                "batch_size",
                "0",
                "Batch size must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.replacement_intensity) {
            return Err(CarbonError::invalid_input(
                "replacement_intensity",
                self.replacement_intensity.to_string(),
                "Replacement intensity must be between 0 and 1",
            ));
        }
        for (fuel, factor) in &self.fuel_factors {
            if !factor.is_finite() || *factor < 0.0 {
                return Err(CarbonError::invalid_input(
                    format!("fuel_factors.{}", fuel),
                    factor.to_string(),
                    "Fuel factors must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CarbonConfig::default();
        assert_eq!(config.batch_size, 3);
        assert!(config.include_benefits);
        assert_eq!(config.scope2_method, Scope2Method::LocationBased);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CarbonConfig::from_toml_str(
            r#"
            batch_size = 5
            scope2_method = "market_based"

            [fuel_factors]
            kerosene = 2.54
            "#,
        )
        .unwrap();

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.scope2_method, Scope2Method::MarketBased);
        assert_eq!(config.fuel_factors.get("kerosene"), Some(&2.54));
        assert_eq!(config.cache_max_age_secs, DEFAULT_CACHE_MAX_AGE_SECS);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let result = CarbonConfig::from_toml_str("batch_size = 0");
        assert!(matches!(result, Err(CarbonError::InvalidInput { .. })));
    }

    #[test]
    fn test_bad_toml_is_serialization_error() {
        let result = CarbonConfig::from_toml_str("batch_size = \"three\"");
        assert!(matches!(result, Err(CarbonError::SerializationError { .. })));
    }
}
