//! # Compliance Checks
//!
//! Compares building performance against climate-zone and building-type
//! thresholds modelled on NCC Section J, and estimates an operational
//! star rating on a NABERS-style half-star scale.
//!
//! ## Sections
//!
//! | Section          | Metric(s)                          | Threshold keyed by |
//! |------------------|------------------------------------|--------------------|
//! | Fabric           | wall R ≥, roof R ≥                 | climate zone       |
//! | Glazing          | window-to-wall ratio ≤, U-value ≤  | climate zone       |
//! | Air sealing      | ACH @ 50 Pa ≤                      | climate zone       |
//! | Lighting         | lighting power density ≤           | building type      |
//! | Embodied carbon  | kg CO₂-e/m² ≤                      | building type      |
//!
//! A section with no input data is **skipped**, which is distinct from
//! passed but does not fail the overall result. Overall compliance is the AND
//! of every section that was assessed.
//!
//! The embodied-carbon limits and the star-rating tiers are separate
//! benchmark tables: the first caps upfront material carbon per m², the
//! second rates annual operational emissions per m².
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::compliance::{BuildingPerformance, ComplianceChecker};
//! use carbon_core::project::BuildingType;
//! use carbon_core::regional::ClimateZone;
//!
//! let data = BuildingPerformance {
//!     building_type: Some(BuildingType::Office),
//!     embodied_carbon_intensity: Some(820.0),
//!     ..Default::default()
//! };
//!
//! let result = ComplianceChecker::new().check(&data, ClimateZone::new(5).unwrap());
//! assert!(!result.overall_pass);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcWarning, CarbonError, CarbonResult};
use crate::project::BuildingType;
use crate::regional::ClimateZone;

/// Building type whose benchmarks stand in for untabulated types
pub const DEFAULT_PROFILE: BuildingType = BuildingType::Office;

/// Half-star tiers from 6★ down to 1★, office emissions thresholds in
/// kg CO₂-e/m²/yr
const OFFICE_STAR_TIERS: [(f64, f64); 11] = [
    (6.0, 30.0),
    (5.5, 45.0),
    (5.0, 60.0),
    (4.5, 75.0),
    (4.0, 90.0),
    (3.5, 105.0),
    (3.0, 120.0),
    (2.5, 135.0),
    (2.0, 150.0),
    (1.5, 165.0),
    (1.0, 180.0),
];

/// Measured or designed building performance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingPerformance {
    /// `None` uses the default profile
    pub building_type: Option<BuildingType>,
    /// Total wall R-value, m²K/W
    pub wall_r_value: Option<f64>,
    /// Total roof R-value, m²K/W
    pub roof_r_value: Option<f64>,
    /// Window-to-wall ratio, 0-1
    pub window_to_wall_ratio: Option<f64>,
    /// Whole-window U-value, W/m²K
    pub glazing_u_value: Option<f64>,
    /// Air changes per hour at 50 Pa
    pub air_changes_per_hour: Option<f64>,
    /// Lighting power density, W/m²
    pub lighting_power_density: Option<f64>,
    /// Embodied carbon, kg CO₂-e/m²
    pub embodied_carbon_intensity: Option<f64>,
    /// Annual operational emissions, kg CO₂-e/m²/yr
    pub operational_intensity: Option<f64>,
}

impl BuildingPerformance {
    pub fn validate(&self) -> CarbonResult<()> {
        let fields = [
            ("performance.wall_r_value", self.wall_r_value),
            ("performance.roof_r_value", self.roof_r_value),
            ("performance.window_to_wall_ratio", self.window_to_wall_ratio),
            ("performance.glazing_u_value", self.glazing_u_value),
            ("performance.air_changes_per_hour", self.air_changes_per_hour),
            ("performance.lighting_power_density", self.lighting_power_density),
            ("performance.embodied_carbon_intensity", self.embodied_carbon_intensity),
            ("performance.operational_intensity", self.operational_intensity),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(CarbonError::invalid_input(field, value.to_string(), "Must be non-negative"));
                }
            }
        }
        if let Some(wwr) = self.window_to_wall_ratio {
            if wwr > 1.0 {
                return Err(CarbonError::invalid_input(
                    "performance.window_to_wall_ratio",
                    wwr.to_string(),
                    "Window-to-wall ratio cannot exceed 1",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceSection {
    Fabric,
    Glazing,
    AirSealing,
    Lighting,
    EmbodiedCarbon,
}

impl ComplianceSection {
    pub fn display_name(&self) -> &'static str {
        match self {
            ComplianceSection::Fabric => "Thermal fabric",
            ComplianceSection::Glazing => "Glazing",
            ComplianceSection::AirSealing => "Air sealing",
            ComplianceSection::Lighting => "Lighting",
            ComplianceSection::EmbodiedCarbon => "Embodied carbon",
        }
    }
}

/// Outcome of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Passed,
    Failed,
    /// No input data; assessment skipped
    Skipped,
}

/// Direction of a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    AtLeast,
    AtMost,
}

/// One metric compared against its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub metric: String,
    pub actual: f64,
    pub threshold: f64,
    pub limit: Limit,
    pub passed: bool,
    /// 0-100, 100 at or better than the threshold
    pub score: f64,
}

impl MetricCheck {
    fn evaluate(metric: &str, actual: f64, threshold: f64, limit: Limit) -> Self {
        let (passed, ratio) = match limit {
            Limit::AtMost => (actual <= threshold, if actual > 0.0 { threshold / actual } else { 1.0 }),
            Limit::AtLeast => (actual >= threshold, if threshold > 0.0 { actual / threshold } else { 1.0 }),
        };
        MetricCheck {
            metric: metric.to_string(),
            actual,
            threshold,
            limit,
            passed,
            score: (ratio * 100.0).clamp(0.0, 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    pub section: ComplianceSection,
    pub status: SectionStatus,
    /// Mean metric score; `None` when skipped
    pub score: Option<f64>,
    pub checks: Vec<MetricCheck>,
}

impl SectionResult {
    fn from_checks(section: ComplianceSection, checks: Vec<MetricCheck>) -> Self {
        if checks.is_empty() {
            return SectionResult {
                section,
                status: SectionStatus::Skipped,
                score: None,
                checks,
            };
        }
        let status = if checks.iter().all(|c| c.passed) {
            SectionStatus::Passed
        } else {
            SectionStatus::Failed
        };
        let score = checks.iter().map(|c| c.score).sum::<f64>() / checks.len() as f64;
        SectionResult {
            section,
            status,
            score: Some(score),
            checks,
        }
    }

    /// False only for a failed section; skipped sections do not fail
    pub fn passes(&self) -> bool {
        self.status != SectionStatus::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub climate_zone: ClimateZone,
    /// Profile whose benchmarks were applied
    pub profile: BuildingType,
    pub sections: Vec<SectionResult>,
    /// AND of every assessed section
    pub overall_pass: bool,
    /// 0-6 in half stars; `None` without operational data
    pub star_rating: Option<f64>,
    pub warnings: Vec<CalcWarning>,
}

impl ComplianceResult {
    pub fn section(&self, section: ComplianceSection) -> Option<&SectionResult> {
        self.sections.iter().find(|s| s.section == section)
    }

    pub fn assessed_sections(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.status != SectionStatus::Skipped)
            .count()
    }
}

/// Benchmarks for one building type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkProfile {
    /// Embodied carbon limit, kg CO₂-e/m²
    pub embodied_limit: f64,
    /// Lighting power density limit, W/m²
    pub lighting_limit: f64,
    /// Multiplier on the office star-rating tiers
    pub star_scale: f64,
}

/// Benchmarks for a building type. `Other` has none.
pub fn benchmark_profile(building_type: BuildingType) -> Option<BenchmarkProfile> {
    let (embodied_limit, lighting_limit, star_scale) = match building_type {
        BuildingType::Office => (800.0, 4.5, 1.0),
        BuildingType::Residential => (600.0, 5.0, 0.8),
        BuildingType::Retail => (700.0, 14.0, 1.5),
        BuildingType::Education => (650.0, 4.5, 0.9),
        BuildingType::Healthcare => (900.0, 6.0, 2.0),
        BuildingType::Industrial => (500.0, 3.0, 1.2),
        BuildingType::Hospitality => (750.0, 8.0, 1.6),
        BuildingType::MixedUse => (750.0, 6.0, 1.2),
        BuildingType::Other => return None,
    };
    Some(BenchmarkProfile {
        embodied_limit,
        lighting_limit,
        star_scale,
    })
}

/// Climate-zone threshold tables, indexed by zone 1-8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceChecker {
    pub min_wall_r: [f64; 8],
    pub min_roof_r: [f64; 8],
    pub max_window_to_wall: [f64; 8],
    pub max_glazing_u: [f64; 8],
    pub max_air_changes: [f64; 8],
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        ComplianceChecker {
            min_wall_r: [2.8, 2.4, 2.8, 2.8, 2.8, 2.8, 3.8, 3.8],
            min_roof_r: [4.2, 3.7, 3.7, 3.2, 3.2, 3.2, 4.8, 4.8],
            max_window_to_wall: [0.30, 0.35, 0.35, 0.40, 0.40, 0.40, 0.45, 0.45],
            max_glazing_u: [5.8, 5.8, 5.8, 4.3, 4.3, 4.3, 3.3, 3.3],
            max_air_changes: [15.0, 15.0, 15.0, 10.0, 10.0, 10.0, 7.0, 7.0],
        }
    }
}

impl ComplianceChecker {
    pub fn new() -> Self {
        ComplianceChecker::default()
    }

    /// Check building performance in a climate zone.
    pub fn check(&self, data: &BuildingPerformance, climate_zone: ClimateZone) -> ComplianceResult {
        let z = climate_zone.index();
        let mut warnings = Vec::new();

        let requested = data.building_type.unwrap_or(DEFAULT_PROFILE);
        let (profile_type, profile) = match benchmark_profile(requested) {
            Some(profile) => (requested, profile),
            None => {
                warnings.push(CalcWarning::DefaultBuildingProfile {
                    building_type: requested.display_name().to_string(),
                    profile: DEFAULT_PROFILE.display_name().to_string(),
                });
                (DEFAULT_PROFILE, default_profile())
            }
        };

        let mut fabric = Vec::new();
        if let Some(r) = data.wall_r_value {
            fabric.push(MetricCheck::evaluate("wall_r_value", r, self.min_wall_r[z], Limit::AtLeast));
        }
        if let Some(r) = data.roof_r_value {
            fabric.push(MetricCheck::evaluate("roof_r_value", r, self.min_roof_r[z], Limit::AtLeast));
        }

        let mut glazing = Vec::new();
        if let Some(wwr) = data.window_to_wall_ratio {
            glazing.push(MetricCheck::evaluate("window_to_wall_ratio", wwr, self.max_window_to_wall[z], Limit::AtMost));
        }
        if let Some(u) = data.glazing_u_value {
            glazing.push(MetricCheck::evaluate("glazing_u_value", u, self.max_glazing_u[z], Limit::AtMost));
        }

        let sealing: Vec<_> = data
            .air_changes_per_hour
            .map(|ach| MetricCheck::evaluate("air_changes_per_hour", ach, self.max_air_changes[z], Limit::AtMost))
            .into_iter()
            .collect();

        let lighting: Vec<_> = data
            .lighting_power_density
            .map(|lpd| MetricCheck::evaluate("lighting_power_density", lpd, profile.lighting_limit, Limit::AtMost))
            .into_iter()
            .collect();

        let embodied: Vec<_> = data
            .embodied_carbon_intensity
            .map(|ec| MetricCheck::evaluate("embodied_carbon_intensity", ec, profile.embodied_limit, Limit::AtMost))
            .into_iter()
            .collect();

        let sections = vec![
            SectionResult::from_checks(ComplianceSection::Fabric, fabric),
            SectionResult::from_checks(ComplianceSection::Glazing, glazing),
            SectionResult::from_checks(ComplianceSection::AirSealing, sealing),
            SectionResult::from_checks(ComplianceSection::Lighting, lighting),
            SectionResult::from_checks(ComplianceSection::EmbodiedCarbon, embodied),
        ];
        let overall_pass = sections.iter().all(SectionResult::passes);

        let star_rating = data
            .operational_intensity
            .map(|intensity| star_rating_for(intensity, &profile));

        ComplianceResult {
            climate_zone,
            profile: profile_type,
            sections,
            overall_pass,
            star_rating,
            warnings,
        }
    }
}

fn default_profile() -> BenchmarkProfile {
    // DEFAULT_PROFILE is a tabulated type
    benchmark_profile(DEFAULT_PROFILE).unwrap_or(BenchmarkProfile {
        embodied_limit: 800.0,
        lighting_limit: 4.5,
        star_scale: 1.0,
    })
}

/// Star rating for an annual operational intensity (kg CO₂-e/m²/yr).
///
/// Returns the highest tier whose threshold is at or above the intensity;
/// intensities above the 1★ threshold rate 0★.
pub fn star_rating_for(intensity: f64, profile: &BenchmarkProfile) -> f64 {
    OFFICE_STAR_TIERS
        .iter()
        .find(|(_, threshold)| threshold * profile.star_scale >= intensity)
        .map(|(rating, _)| *rating)
        .unwrap_or(0.0)
}

/// Star rating for a building type, falling back to the default profile.
pub fn star_rating(intensity: f64, building_type: BuildingType) -> f64 {
    let profile = benchmark_profile(building_type).unwrap_or_else(default_profile);
    star_rating_for(intensity, &profile)
}
