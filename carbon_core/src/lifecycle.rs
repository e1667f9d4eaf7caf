//! # Lifecycle Stage Engine
//!
//! EN 15978 stage breakdown for one material quantity.
//!
//! ## Stages
//!
//! | Stage | Meaning                    | Formula                                          |
//! |-------|----------------------------|--------------------------------------------------|
//! | A1-A3 | Product                    | rate × quantity                                  |
//! | A4    | Transport to site          | A1-A3 × transport fraction × transport penalty   |
//! | A5    | Construction / installation| A1-A3 × construction fraction × site penalty     |
//! | B1-B7 | Use (replacements)         | replacements × (A1-A3 + A4 + A5) × intensity     |
//! | C1-C4 | End of life                | A1-A3 × end-of-life fraction                     |
//! | D     | Benefits beyond boundary   | −A1-A3 × recycling potential (when enabled)      |
//!
//! `replacements = max(0, ceil(design life / service life) − 1)`.
//! Biogenic storage is reported as its own signed term, never folded into D.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::lifecycle::{compute_stages, StageFactors};
//! use carbon_core::materials::{CarbonCoefficient, MaterialCategory};
//!
//! let coefficient = CarbonCoefficient::new(320.0, "m3");
//! let factors = StageFactors::for_category(MaterialCategory::Concrete);
//! let stages = compute_stages(&coefficient, 1200.0, 50, &factors);
//!
//! assert_eq!(stages.a1_a3, 384_000.0);
//! assert!(stages.d < 0.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_REPLACEMENT_INTENSITY;
use crate::materials::{CarbonCoefficient, MaterialCategory};

/// Factors for one stage computation.
///
/// Built from a category's [`CategoryPolicy`](crate::materials::CategoryPolicy)
/// and then adjusted for region and run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageFactors {
    pub transport_fraction: f64,
    /// Regional A4 multiplier
    pub transport_penalty: f64,
    pub construction_fraction: f64,
    /// Regional A5 multiplier
    pub construction_penalty: f64,
    pub end_of_life_fraction: f64,
    pub recycling_potential: f64,
    pub service_life_years: Option<f64>,
    /// Share of the original A1-A5 charge re-incurred per replacement
    pub replacement_intensity: f64,
    pub include_benefits: bool,
}

impl StageFactors {
    /// Factors from the category policy, with no regional penalties and
    /// benefits enabled.
    pub fn for_category(category: MaterialCategory) -> Self {
        let policy = category.policy();
        StageFactors {
            transport_fraction: policy.transport_fraction,
            transport_penalty: 1.0,
            construction_fraction: policy.construction_fraction,
            construction_penalty: 1.0,
            end_of_life_fraction: policy.end_of_life_fraction,
            recycling_potential: policy.recycling_potential,
            service_life_years: policy.service_life_years,
            replacement_intensity: DEFAULT_REPLACEMENT_INTENSITY,
            include_benefits: true,
        }
    }

    /// Set the regional transport penalty (builder pattern)
    pub fn with_transport_penalty(mut self, penalty: f64) -> Self {
        self.transport_penalty = penalty;
        self
    }

    /// Set the regional construction penalty (builder pattern)
    pub fn with_construction_penalty(mut self, penalty: f64) -> Self {
        self.construction_penalty = penalty;
        self
    }

    /// Set the replacement intensity (builder pattern)
    pub fn with_replacement_intensity(mut self, intensity: f64) -> Self {
        self.replacement_intensity = intensity;
        self
    }

    /// Enable or disable module D (builder pattern)
    pub fn with_benefits(mut self, include: bool) -> Self {
        self.include_benefits = include;
        self
    }

    /// Number of replacements over the design life.
    ///
    /// A missing or non-positive service life means the material lasts the
    /// building's life.
    pub fn replacements(&self, design_life_years: u32) -> u32 {
        let life = f64::from(design_life_years);
        let service_life = match self.service_life_years {
            Some(years) if years > 0.0 => years,
            _ => life,
        };
        ((life / service_life).ceil() - 1.0).max(0.0) as u32
    }
}

/// Stage breakdown in kg CO₂-e. Every term is independently inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub a1_a3: f64,
    pub a4: f64,
    pub a5: f64,
    pub b1_b7: f64,
    pub c1_c4: f64,
    /// Always ≤ 0
    pub d: f64,
    /// Carbon stored in bio-based material (≤ 0), separate from D
    pub biogenic_storage: f64,
    pub replacements: u32,
}

impl StageBreakdown {
    /// A1-A3 + A4 + B1-B7 + C1-C4: the material's embodied share
    pub fn embodied(&self) -> f64 {
        self.a1_a3 + self.a4 + self.b1_b7 + self.c1_c4
    }

    /// A1-A5 (upfront carbon)
    pub fn upfront(&self) -> f64 {
        self.a1_a3 + self.a4 + self.a5
    }

    /// A1 to C4, excluding D and biogenic storage
    pub fn gross(&self) -> f64 {
        self.a1_a3 + self.a4 + self.a5 + self.b1_b7 + self.c1_c4
    }

    /// Gross plus D and biogenic storage
    pub fn net(&self) -> f64 {
        self.gross() + self.d + self.biogenic_storage
    }

    /// Element-wise sum; replacement counts are not summed
    pub fn accumulate(&mut self, other: &StageBreakdown) {
        self.a1_a3 += other.a1_a3;
        self.a4 += other.a4;
        self.a5 += other.a5;
        self.b1_b7 += other.b1_b7;
        self.c1_c4 += other.c1_c4;
        self.d += other.d;
        self.biogenic_storage += other.biogenic_storage;
    }
}

/// Compute the stage breakdown for one material quantity.
///
/// Quantity and coefficient validation happen upstream; this function
/// assumes a positive quantity, a non-negative rate and non-positive
/// biogenic storage.
pub fn compute_stages(
    coefficient: &CarbonCoefficient,
    quantity: f64,
    design_life_years: u32,
    factors: &StageFactors,
) -> StageBreakdown {
    let a1_a3 = coefficient.rate * quantity;
    let a4 = a1_a3 * factors.transport_fraction * factors.transport_penalty;
    let a5 = a1_a3 * factors.construction_fraction * factors.construction_penalty;

    let replacements = factors.replacements(design_life_years);
    let b1_b7 = f64::from(replacements) * (a1_a3 + a4 + a5) * factors.replacement_intensity;

    let c1_c4 = a1_a3 * factors.end_of_life_fraction;

    let d = if factors.include_benefits {
        -(a1_a3 * factors.recycling_potential)
    } else {
        0.0
    };

    let biogenic_storage = coefficient
        .biogenic_storage
        .map(|storage| storage * quantity)
        .unwrap_or(0.0);

    StageBreakdown {
        a1_a3,
        a4,
        a5,
        b1_b7,
        c1_c4,
        d,
        biogenic_storage,
        replacements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_concrete_scenario() {
        let coefficient = CarbonCoefficient::new(320.0, "m3");
        let factors = StageFactors::for_category(MaterialCategory::Concrete);
        let stages = compute_stages(&coefficient, 1200.0, 50, &factors);

        assert_eq!(stages.a1_a3, 384_000.0);
        assert_relative_eq!(stages.d, -57_600.0, max_relative = 1e-12);
        assert_relative_eq!(stages.a4, 384_000.0 * 0.05);
        assert_relative_eq!(stages.a5, 384_000.0 * 0.04);
        assert_relative_eq!(stages.c1_c4, 384_000.0 * 0.03);
        assert_eq!(stages.replacements, 0);
        assert_eq!(stages.b1_b7, 0.0);
        assert_eq!(stages.biogenic_storage, 0.0);
    }

    #[test]
    fn test_benefits_disabled() {
        let coefficient = CarbonCoefficient::new(320.0, "m3");
        let factors = StageFactors::for_category(MaterialCategory::Concrete).with_benefits(false);
        let stages = compute_stages(&coefficient, 1200.0, 50, &factors);
        assert_eq!(stages.d, 0.0);
    }

    #[test]
    fn test_replacements() {
        let finishes = StageFactors::for_category(MaterialCategory::Finishes);
        // 50 / 15 = 3.33 → ceil 4 → 3 replacements
        assert_eq!(finishes.replacements(50), 3);
        // 15 / 15 = 1 → 0 replacements
        assert_eq!(finishes.replacements(15), 0);
        // Shorter than service life
        assert_eq!(finishes.replacements(10), 0);

        let concrete = StageFactors::for_category(MaterialCategory::Concrete);
        assert_eq!(concrete.replacements(100), 0);
    }

    #[test]
    fn test_non_positive_service_life_falls_back() {
        let mut factors = StageFactors::for_category(MaterialCategory::Glazing);
        factors.service_life_years = Some(0.0);
        assert_eq!(factors.replacements(50), 0);
    }

    #[test]
    fn test_replacement_charge() {
        let coefficient = CarbonCoefficient::new(35.0, "m2");
        let factors = StageFactors::for_category(MaterialCategory::Glazing);
        let stages = compute_stages(&coefficient, 100.0, 50, &factors);

        // 50 / 30 → ceil 2 → 1 replacement
        assert_eq!(stages.replacements, 1);
        let expected = (stages.a1_a3 + stages.a4 + stages.a5) * 0.8;
        assert_relative_eq!(stages.b1_b7, expected);
    }

    #[test]
    fn test_transport_penalty_scales_a4_only() {
        let coefficient = CarbonCoefficient::new(2900.0, "t");
        let base = StageFactors::for_category(MaterialCategory::Steel);
        let remote = base.with_transport_penalty(1.4);

        let near = compute_stages(&coefficient, 10.0, 50, &base);
        let far = compute_stages(&coefficient, 10.0, 50, &remote);

        assert_eq!(near.a1_a3, far.a1_a3);
        assert_eq!(near.a5, far.a5);
        assert_relative_eq!(far.a4, near.a4 * 1.4);
    }

    #[test]
    fn test_construction_penalty_scales_a5_only() {
        let coefficient = CarbonCoefficient::new(35.0, "m2");
        let base = StageFactors::for_category(MaterialCategory::Glazing);
        let remote = base.with_construction_penalty(1.2);

        let near = compute_stages(&coefficient, 100.0, 50, &base);
        let far = compute_stages(&coefficient, 100.0, 50, &remote);

        assert_eq!(near.a1_a3, far.a1_a3);
        assert_eq!(near.a4, far.a4);
        assert_relative_eq!(far.a5, near.a5 * 1.2);
        assert!(far.b1_b7 > near.b1_b7);
    }

    #[test]
    fn test_biogenic_separate_from_d() {
        let coefficient = CarbonCoefficient::new(220.0, "m3").with_biogenic_storage(-650.0);
        let factors = StageFactors::for_category(MaterialCategory::Timber);
        let stages = compute_stages(&coefficient, 10.0, 50, &factors);

        assert_eq!(stages.biogenic_storage, -6500.0);
        assert_relative_eq!(stages.d, -(2200.0 * 0.40));
        assert_relative_eq!(stages.net(), stages.gross() + stages.d + stages.biogenic_storage);
    }

    #[test]
    fn test_accumulate() {
        let coefficient = CarbonCoefficient::new(100.0, "t");
        let factors = StageFactors::for_category(MaterialCategory::Steel);
        let one = compute_stages(&coefficient, 1.0, 50, &factors);

        let mut total = StageBreakdown::default();
        total.accumulate(&one);
        total.accumulate(&one);

        assert_eq!(total.a1_a3, 200.0);
        assert_relative_eq!(total.d, 2.0 * one.d);
    }

    proptest! {
        #[test]
        fn prop_a1_a3_is_rate_times_quantity(
            rate in 0.0f64..10_000.0,
            quantity in 0.001f64..100_000.0,
            life in 1u32..150,
            category_index in 0usize..8,
        ) {
            let category = MaterialCategory::ALL[category_index];
            let coefficient = CarbonCoefficient::new(rate, "unit");
            let stages = compute_stages(&coefficient, quantity, life, &StageFactors::for_category(category));

            prop_assert_eq!(stages.a1_a3, rate * quantity);
            prop_assert!(stages.d <= 0.0);
            prop_assert!(stages.b1_b7 >= 0.0);
        }
    }
}
