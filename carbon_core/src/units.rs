//! # Unit Types
//!
//! Lightweight wrappers for carbon quantities and normalization of the unit
//! labels used in bills of materials.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::units::{normalize_unit, KgCo2e, TonnesCo2e};
//!
//! let t: TonnesCo2e = KgCo2e(384_000.0).into();
//! assert_eq!(t.0, 384.0);
//!
//! assert_eq!(normalize_unit("m³"), "m3");
//! assert_eq!(normalize_unit("Tonnes"), "t");
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Mass of CO₂-equivalent in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KgCo2e(pub f64);

/// Mass of CO₂-equivalent in tonnes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TonnesCo2e(pub f64);

impl From<KgCo2e> for TonnesCo2e {
    fn from(kg: KgCo2e) -> Self {
        TonnesCo2e(kg.0 / 1000.0)
    }
}

impl From<TonnesCo2e> for KgCo2e {
    fn from(t: TonnesCo2e) -> Self {
        KgCo2e(t.0 * 1000.0)
    }
}

impl Add for KgCo2e {
    type Output = KgCo2e;
    fn add(self, rhs: KgCo2e) -> KgCo2e {
        KgCo2e(self.0 + rhs.0)
    }
}

impl Mul<f64> for KgCo2e {
    type Output = KgCo2e;
    fn mul(self, rhs: f64) -> KgCo2e {
        KgCo2e(self.0 * rhs)
    }
}

impl std::fmt::Display for KgCo2e {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} kg CO2-e", self.0)
    }
}

impl std::fmt::Display for TonnesCo2e {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} t CO2-e", self.0)
    }
}

/// Canonical form of a quantity unit label.
///
/// Lower-cases, trims, and folds common spellings (`m³`, `cubic metre`,
/// `tonne`, `kgs`) to `m3`, `m2`, `t`, `kg`. Unknown labels are returned
/// lower-cased.
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    match unit.as_str() {
        "m3" | "m³" | "m^3" | "cubic metre" | "cubic metres" | "cubic meter" | "cubic meters" => "m3".to_string(),
        "m2" | "m²" | "m^2" | "square metre" | "square metres" | "square meter" | "square meters" | "sqm" => {
            "m2".to_string()
        }
        "t" | "tonne" | "tonnes" | "ton" | "tons" => "t".to_string(),
        "kg" | "kgs" | "kilogram" | "kilograms" => "kg".to_string(),
        "m" | "lm" | "metre" | "metres" | "meter" | "meters" => "m".to_string(),
        _ => unit,
    }
}
