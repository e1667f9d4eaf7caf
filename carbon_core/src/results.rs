//! # Results
//!
//! Pure aggregation of pipeline outputs into one immutable [`ProjectResult`].
//!
//! ## Totals
//!
//! | Figure        | Definition                                        |
//! |---------------|---------------------------------------------------|
//! | embodied      | Σ (A1-A3 + A4 + B1-B7 + C1-C4) over material lines |
//! | construction  | Σ A5                                              |
//! | operational   | annual operational × design life                  |
//! | waste         | scope 3 `waste` category                          |
//! | whole of life | embodied + construction + operational + waste     |
//!
//! Module D and biogenic storage are reported alongside but excluded from
//! whole of life.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::ComplianceResult;
use crate::errors::{CalcWarning, CarbonError, CarbonResult};
use crate::lifecycle::StageBreakdown;
use crate::materials::{CarbonCoefficient, MaterialCategory};
use crate::optimization::{total_potential_savings, Recommendation};
use crate::project::{BuildingType, EnergyProfile, Project};
use crate::regional::RegionalContext;
use crate::scopes::{ScopesResult, NATURAL_GAS_FACTOR};
use crate::units::{KgCo2e, TonnesCo2e};

/// Scope 3 category holding waste emissions
pub const WASTE_CATEGORY: &str = "waste";

/// Stage results for one bill-of-materials line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLineResult {
    /// Position in the submitted bill of materials
    pub index: usize,
    pub label: Option<String>,
    pub category: MaterialCategory,
    pub material_type: String,
    pub quantity: f64,
    pub unit: String,
    /// Coefficient used, after regional adjustment
    pub coefficient: CarbonCoefficient,
    /// Material is itself the low-carbon alternative
    pub low_carbon: bool,
    pub stages: StageBreakdown,
}

/// Annual operational emissions, kg CO₂-e per year.
///
/// Grid electricity net of on-site renewables at the regional grid factor,
/// plus reticulated gas.
pub fn annual_operational(energy: &EnergyProfile, grid_factor: f64) -> f64 {
    let electricity = energy.annual_electricity_kwh * grid_factor * (1.0 - energy.renewable_fraction);
    let gas = energy.annual_gas_mj * NATURAL_GAS_FACTOR;
    electricity + gas
}

/// Whole-of-life totals, kg CO₂-e.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarbonTotals {
    pub embodied: f64,
    pub construction: f64,
    pub operational_annual: f64,
    pub operational: f64,
    pub waste: f64,
    pub whole_of_life: f64,
    /// Module D, ≤ 0
    pub benefits: f64,
    /// ≤ 0
    pub biogenic_storage: f64,
}

impl CarbonTotals {
    pub fn new(stages: &StageBreakdown, operational_annual: f64, design_life_years: u32, waste: f64) -> Self {
        let embodied = stages.embodied();
        let construction = stages.a5;
        let operational = operational_annual * f64::from(design_life_years);
        CarbonTotals {
            embodied,
            construction,
            operational_annual,
            operational,
            waste,
            whole_of_life: embodied + operational + construction + waste,
            benefits: stages.d,
            biogenic_storage: stages.biogenic_storage,
        }
    }

    /// Whole of life after module D and biogenic storage
    pub fn net(&self) -> f64 {
        self.whole_of_life + self.benefits + self.biogenic_storage
    }
}

/// Per-m² figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intensities {
    /// kg CO₂-e/m²
    pub embodied: f64,
    /// kg CO₂-e/m² (A1-A5)
    pub upfront: f64,
    /// kg CO₂-e/m²/yr
    pub operational_annual: f64,
    /// kg CO₂-e/m²
    pub whole_of_life: f64,
}

impl Intensities {
    pub fn new(totals: &CarbonTotals, stages: &StageBreakdown, gross_floor_area_m2: f64) -> Self {
        Intensities {
            embodied: totals.embodied / gross_floor_area_m2,
            upfront: stages.upfront() / gross_floor_area_m2,
            operational_annual: totals.operational_annual / gross_floor_area_m2,
            whole_of_life: totals.whole_of_life / gross_floor_area_m2,
        }
    }
}

/// Embodied carbon of one material category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: MaterialCategory,
    pub embodied: f64,
    /// Share of material embodied carbon, 0-100
    pub percentage: f64,
    pub line_count: usize,
}

/// Per-category breakdown in category order. Percentages sum to 100 when
/// there is any embodied carbon and are 0 otherwise.
pub fn category_breakdown(lines: &[MaterialLineResult]) -> Vec<CategoryShare> {
    let mut grouped: BTreeMap<MaterialCategory, (f64, usize)> = BTreeMap::new();
    for line in lines {
        let entry = grouped.entry(line.category).or_insert((0.0, 0));
        entry.0 += line.stages.embodied();
        entry.1 += 1;
    }

    let total: f64 = grouped.values().map(|(embodied, _)| embodied).sum();
    grouped
        .into_iter()
        .map(|(category, (embodied, line_count))| CategoryShare {
            category,
            embodied,
            percentage: if total > 0.0 { embodied / total * 100.0 } else { 0.0 },
            line_count,
        })
        .collect()
}

/// Final report of one run. Two runs on the same input differ only in
/// `calculated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub project_id: Uuid,
    pub project_name: String,
    pub building_type: BuildingType,
    pub gross_floor_area_m2: f64,
    pub design_life_years: u32,
    pub totals: CarbonTotals,
    pub intensities: Intensities,
    pub stages: StageBreakdown,
    pub category_breakdown: Vec<CategoryShare>,
    pub lines: Vec<MaterialLineResult>,
    pub scopes: ScopesResult,
    pub compliance: ComplianceResult,
    pub recommendations: Vec<Recommendation>,
    pub total_potential_savings: f64,
    pub regional: RegionalContext,
    pub warnings: Vec<CalcWarning>,
    pub calculated_at: DateTime<Utc>,
}

impl ProjectResult {
    /// Equality ignoring `calculated_at`
    pub fn same_outcome(&self, other: &ProjectResult) -> bool {
        let mut other = other.clone();
        other.calculated_at = self.calculated_at;
        *self == other
    }

    /// Multi-line text summary
    pub fn summary(&self) -> String {
        let t = |kg: f64| TonnesCo2e::from(KgCo2e(kg));
        let mut out = format!(
            "{} ({}, {:.0} m², {} yr)\n",
            self.project_name, self.building_type, self.gross_floor_area_m2, self.design_life_years
        );
        out.push_str(&format!(
            "  Whole of life: {} ({:.0} kg/m²)\n",
            t(self.totals.whole_of_life),
            self.intensities.whole_of_life
        ));
        out.push_str(&format!(
            "  Embodied {} | Construction {} | Operational {} | Waste {}\n",
            t(self.totals.embodied),
            t(self.totals.construction),
            t(self.totals.operational),
            t(self.totals.waste)
        ));
        out.push_str(&format!(
            "  Scope 1 {} | Scope 2 {} | Scope 3 {}\n",
            t(self.scopes.scope1.total),
            t(self.scopes.scope2.total),
            t(self.scopes.scope3.total)
        ));
        let stars = self
            .compliance
            .star_rating
            .map(|s| format!("{:.1}★", s))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "  Compliance: {} | Star rating: {}\n",
            if self.compliance.overall_pass { "PASS" } else { "FAIL" },
            stars
        ));
        out.push_str(&format!(
            "  {} recommendations, potential savings {}\n",
            self.recommendations.len(),
            t(self.total_potential_savings)
        ));
        for warning in &self.warnings {
            out.push_str(&format!("  warning: {}\n", warning));
        }
        out
    }
}

/// Everything the compiler aggregates.
#[derive(Debug, Clone)]
pub struct CompileInput<'a> {
    pub project: &'a Project,
    pub lines: Vec<MaterialLineResult>,
    pub stages: StageBreakdown,
    pub totals: CarbonTotals,
    pub scopes: ScopesResult,
    pub compliance: ComplianceResult,
    pub recommendations: Vec<Recommendation>,
    pub regional: RegionalContext,
    pub warnings: Vec<CalcWarning>,
}

/// Assembles a [`ProjectResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsCompiler;

impl ResultsCompiler {
    pub fn new() -> Self {
        ResultsCompiler
    }

    /// Compile the final result. Fails rather than emit non-finite figures.
    pub fn compile(&self, input: CompileInput<'_>) -> CarbonResult<ProjectResult> {
        let project = input.project;
        let totals = input.totals;
        for (name, value) in [
            ("embodied", totals.embodied),
            ("construction", totals.construction),
            ("operational", totals.operational),
            ("waste", totals.waste),
            ("whole_of_life", totals.whole_of_life),
        ] {
            if !value.is_finite() {
                return Err(CarbonError::internal(format!("{} total is not finite", name)));
            }
        }

        let intensities = Intensities::new(&totals, &input.stages, project.gross_floor_area_m2);
        let category_breakdown = category_breakdown(&input.lines);
        let total_potential_savings = total_potential_savings(&input.recommendations);

        Ok(ProjectResult {
            project_id: project.id,
            project_name: project.name.clone(),
            building_type: project.building_type,
            gross_floor_area_m2: project.gross_floor_area_m2,
            design_life_years: project.design_life_years,
            totals,
            intensities,
            stages: input.stages,
            category_breakdown,
            lines: input.lines,
            scopes: input.scopes,
            compliance: input.compliance,
            recommendations: input.recommendations,
            total_potential_savings,
            regional: input.regional,
            warnings: input.warnings,
            calculated_at: Utc::now(),
        })
    }
}
