//! # Materials
//!
//! Material categories, carbon coefficients and the coefficient lookup chain.
//!
//! ## Categories
//!
//! Every line item in a bill of materials belongs to one [`MaterialCategory`].
//! The category is a closed enum; each variant carries its lifecycle policy
//! (transport, construction and end-of-life fractions, recycling potential,
//! service life) as data via [`MaterialCategory::policy`].
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::materials::{MaterialCategory, MaterialKey};
//!
//! let key = MaterialKey::new(MaterialCategory::Concrete, "concrete-32mpa");
//! assert_eq!(key.to_string(), "concrete/concrete-32mpa");
//!
//! let policy = MaterialCategory::Steel.policy();
//! assert_eq!(policy.recycling_potential, 0.85);
//! ```

pub mod coefficient_source;
pub mod database;
#[cfg(not(target_arch = "wasm32"))]
pub mod remote;

pub use coefficient_source::{CoefficientProvider, CoefficientSource};
pub use database::{MaterialEntry, MaterialsDatabase};
#[cfg(not(target_arch = "wasm32"))]
pub use remote::HttpCoefficientProvider;

use serde::{Deserialize, Serialize};

use crate::errors::{CarbonError, CarbonResult};
use crate::units::normalize_unit;

/// Material category of a bill-of-materials line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Concrete,
    Steel,
    Timber,
    Masonry,
    Insulation,
    Glazing,
    Finishes,
    Other,
}

/// Lifecycle policy for a material category.
///
/// Fractions are applied to the A1-A3 product-stage figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// A4 transport overhead as a fraction of A1-A3
    pub transport_fraction: f64,
    /// A5 construction overhead as a fraction of A1-A3
    pub construction_fraction: f64,
    /// C1-C4 end-of-life processing as a fraction of A1-A3
    pub end_of_life_fraction: f64,
    /// Share of A1-A3 credited in module D when recovered
    pub recycling_potential: f64,
    /// Typical service life in years. `None` lasts the building's life.
    pub service_life_years: Option<f64>,
}

impl MaterialCategory {
    pub const ALL: [MaterialCategory; 8] = [
        MaterialCategory::Concrete,
        MaterialCategory::Steel,
        MaterialCategory::Timber,
        MaterialCategory::Masonry,
        MaterialCategory::Insulation,
        MaterialCategory::Glazing,
        MaterialCategory::Finishes,
        MaterialCategory::Other,
    ];

    /// Lifecycle policy for this category
    pub fn policy(&self) -> CategoryPolicy {
        match self {
            MaterialCategory::Concrete => CategoryPolicy {
                transport_fraction: 0.05,
                construction_fraction: 0.04,
                end_of_life_fraction: 0.03,
                recycling_potential: 0.15,
                service_life_years: None,
            },
            MaterialCategory::Steel => CategoryPolicy {
                transport_fraction: 0.03,
                construction_fraction: 0.02,
                end_of_life_fraction: 0.01,
                recycling_potential: 0.85,
                service_life_years: None,
            },
            MaterialCategory::Timber => CategoryPolicy {
                transport_fraction: 0.08,
                construction_fraction: 0.05,
                end_of_life_fraction: 0.04,
                recycling_potential: 0.40,
                service_life_years: Some(60.0),
            },
            MaterialCategory::Masonry => CategoryPolicy {
                transport_fraction: 0.06,
                construction_fraction: 0.04,
                end_of_life_fraction: 0.03,
                recycling_potential: 0.10,
                service_life_years: None,
            },
            MaterialCategory::Insulation => CategoryPolicy {
                transport_fraction: 0.04,
                construction_fraction: 0.03,
                end_of_life_fraction: 0.02,
                recycling_potential: 0.05,
                service_life_years: Some(30.0),
            },
            MaterialCategory::Glazing => CategoryPolicy {
                transport_fraction: 0.05,
                construction_fraction: 0.03,
                end_of_life_fraction: 0.02,
                recycling_potential: 0.20,
                service_life_years: Some(30.0),
            },
            MaterialCategory::Finishes => CategoryPolicy {
                transport_fraction: 0.04,
                construction_fraction: 0.05,
                end_of_life_fraction: 0.02,
                recycling_potential: 0.05,
                service_life_years: Some(15.0),
            },
            MaterialCategory::Other => CategoryPolicy {
                transport_fraction: 0.05,
                construction_fraction: 0.03,
                end_of_life_fraction: 0.02,
                recycling_potential: 0.0,
                service_life_years: None,
            },
        }
    }

    /// Identifier used in keys, URLs and JSON
    pub fn code(&self) -> &'static str {
        match self {
            MaterialCategory::Concrete => "concrete",
            MaterialCategory::Steel => "steel",
            MaterialCategory::Timber => "timber",
            MaterialCategory::Masonry => "masonry",
            MaterialCategory::Insulation => "insulation",
            MaterialCategory::Glazing => "glazing",
            MaterialCategory::Finishes => "finishes",
            MaterialCategory::Other => "other",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialCategory::Concrete => "Concrete",
            MaterialCategory::Steel => "Steel",
            MaterialCategory::Timber => "Timber",
            MaterialCategory::Masonry => "Masonry",
            MaterialCategory::Insulation => "Insulation",
            MaterialCategory::Glazing => "Glazing",
            MaterialCategory::Finishes => "Finishes",
            MaterialCategory::Other => "Other",
        }
    }
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lookup key for a coefficient: `(category, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialKey {
    pub category: MaterialCategory,
    pub material_type: String,
}

impl MaterialKey {
    pub fn new(category: MaterialCategory, material_type: impl Into<String>) -> Self {
        MaterialKey {
            category,
            material_type: material_type.into(),
        }
    }
}

impl std::fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.material_type)
    }
}

/// Data quality tag attached to a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// Embodied carbon coefficient for one unit of a material.
///
/// ## JSON Example
///
/// ```json
/// {
///   "rate": 320.0,
///   "unit": "m3",
///   "biogenic_storage": null,
///   "confidence": "high",
///   "source": "local",
///   "regional_multiplier": 1.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonCoefficient {
    /// Embodied rate, kg CO₂-e per unit (A1-A3)
    pub rate: f64,

    /// Unit the rate is expressed per (e.g., "m3", "t", "m2", "kg")
    pub unit: String,

    /// Carbon stored in bio-based material, kg CO₂-e per unit (≤ 0)
    #[serde(default)]
    pub biogenic_storage: Option<f64>,

    #[serde(default)]
    pub confidence: Confidence,

    /// Where the figure came from (e.g., "local", "remote:epd-hub")
    #[serde(default)]
    pub source: String,

    /// Regional multiplier already folded into `rate`
    #[serde(default = "unit_multiplier")]
    pub regional_multiplier: f64,
}

fn unit_multiplier() -> f64 {
    1.0
}

impl CarbonCoefficient {
    pub fn new(rate: f64, unit: impl Into<String>) -> Self {
        CarbonCoefficient {
            rate,
            unit: unit.into(),
            biogenic_storage: None,
            confidence: Confidence::Medium,
            source: String::new(),
            regional_multiplier: 1.0,
        }
    }

    /// Set biogenic storage (builder pattern)
    pub fn with_biogenic_storage(mut self, storage: f64) -> Self {
        self.biogenic_storage = Some(storage);
        self
    }

    /// Set confidence (builder pattern)
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set source tag (builder pattern)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Return a copy with the rate scaled by a regional multiplier.
    /// Biogenic storage is left unscaled.
    pub fn regionally_adjusted(&self, multiplier: f64) -> Self {
        CarbonCoefficient {
            rate: self.rate * multiplier,
            regional_multiplier: self.regional_multiplier * multiplier,
            ..self.clone()
        }
    }

    /// Whether this coefficient is expressed in the given unit
    pub fn unit_matches(&self, unit: &str) -> bool {
        normalize_unit(&self.unit) == normalize_unit(unit)
    }

    /// Check the figures before they reach the stage engine.
    ///
    /// The rate must be finite and non-negative; biogenic storage, when
    /// present, must be finite and ≤ 0.
    pub fn validate(&self, key: &MaterialKey) -> CarbonResult<()> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(CarbonError::invalid_input(
                format!("{}.rate", key),
                self.rate.to_string(),
                "Coefficient rate must be a non-negative number",
            ));
        }
        if let Some(storage) = self.biogenic_storage {
            if !storage.is_finite() || storage > 0.0 {
                return Err(CarbonError::invalid_input(
                    format!("{}.biogenic_storage", key),
                    storage.to_string(),
                    "Biogenic storage must be zero or negative",
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
    fn test_recycling_potentials() {
        assert_eq!(MaterialCategory::Steel.policy().recycling_potential, 0.85);
        assert_eq!(MaterialCategory::Concrete.policy().recycling_potential, 0.15);
        assert_eq!(MaterialCategory::Timber.policy().recycling_potential, 0.40);
    }

    #[test]
    fn test_policy_fractions_in_range() {
        for category in MaterialCategory::ALL {
            let policy = category.policy();
            for fraction in [
                policy.transport_fraction,
                policy.construction_fraction,
                policy.end_of_life_fraction,
                policy.recycling_potential,
            ] {
                assert!((0.0..=1.0).contains(&fraction), "{} fraction out of range", category);
            }
            if let Some(life) = policy.service_life_years {
                assert!(life > 0.0);
            }
        }
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&MaterialCategory::Insulation).unwrap();
        assert_eq!(json, "\"insulation\"");
        let parsed: MaterialCategory = serde_json::from_str("\"steel\"").unwrap();
        assert_eq!(parsed, MaterialCategory::Steel);
    }

    #[test]
    fn test_regional_adjustment_keeps_biogenic() {
        let coefficient = CarbonCoefficient::new(250.0, "m3").with_biogenic_storage(-700.0);
        let adjusted = coefficient.regionally_adjusted(0.92);

        assert!((adjusted.rate - 230.0).abs() < 1e-9);
        assert_eq!(adjusted.biogenic_storage, Some(-700.0));
        assert!((adjusted.regional_multiplier - 0.92).abs() < 1e-12);
    }

    #[test]
    fn test_unit_matching_normalizes_labels() {
        let coefficient = CarbonCoefficient::new(320.0, "m3");
        assert!(coefficient.unit_matches("M3"));
        assert!(coefficient.unit_matches(" m³ "));
        assert!(!coefficient.unit_matches("t"));
        assert!(CarbonCoefficient::new(2900.0, "t").unit_matches("tonnes"));
    }

    #[test]
    fn test_coefficient_defaults_from_json() {
        let coefficient: CarbonCoefficient = serde_json::from_str(r#"{ "rate": 2.5, "unit": "kg" }"#).unwrap();
        assert_eq!(coefficient.regional_multiplier, 1.0);
        assert_eq!(coefficient.confidence, Confidence::Medium);
        assert!(coefficient.biogenic_storage.is_none());
    }
}
