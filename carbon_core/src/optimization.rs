//! # Optimization Recommendations
//!
//! Rule-based reduction measures ranked by estimated savings.
//!
//! Two rule families:
//!
//! - **Material substitutions**: for each category with a lower-carbon
//!   alternative, savings = embodied carbon of that category's conventional
//!   (non low-carbon) lines × the substitution's reduction share.
//! - **Design and system measures**: savings = a fixed share of operational
//!   carbon over the design life.
//!
//! Recommendations are sorted descending by savings with a stable sort, so
//! ties keep rule order. The total potential is the plain sum of every
//! recommendation even where measures overlap.

use serde::{Deserialize, Serialize};

use crate::materials::MaterialCategory;
use crate::regional::RegionalContext;
use crate::results::MaterialLineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostImpact {
    Saving,
    Neutral,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
}

/// What a recommendation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum RecommendationCategory {
    Material(MaterialCategory),
    Design,
    Systems,
    Renewables,
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationCategory::Material(category) => write!(f, "{}", category.display_name()),
            RecommendationCategory::Design => write!(f, "Design"),
            RecommendationCategory::Systems => write!(f, "Building systems"),
            RecommendationCategory::Renewables => write!(f, "Renewables"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    /// kg CO₂-e, ≥ 0
    pub carbon_savings: f64,
    pub cost_impact: CostImpact,
    pub difficulty: Difficulty,
    /// A local supplier offers the alternative
    pub locally_available: bool,
}

/// Lower-carbon alternative for a material category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub category: MaterialCategory,
    pub title: String,
    pub description: String,
    /// Share of conventional embodied carbon avoided, 0-1
    pub reduction: f64,
    pub cost_impact: CostImpact,
    pub difficulty: Difficulty,
}

/// Design or system measure that trims operational carbon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMeasure {
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    /// Share of lifetime operational carbon avoided, 0-1
    pub reduction: f64,
    /// Scale the share by the grid-supplied electricity fraction
    pub scales_with_grid_share: bool,
    pub cost_impact: CostImpact,
    pub difficulty: Difficulty,
}

fn substitution(
    category: MaterialCategory,
    title: &str,
    description: &str,
    reduction: f64,
    cost_impact: CostImpact,
    difficulty: Difficulty,
) -> Substitution {
    Substitution {
        category,
        title: title.to_string(),
        description: description.to_string(),
        reduction,
        cost_impact,
        difficulty,
    }
}

fn measure(
    category: RecommendationCategory,
    title: &str,
    description: &str,
    reduction: f64,
    cost_impact: CostImpact,
    difficulty: Difficulty,
) -> DesignMeasure {
    DesignMeasure {
        category,
        title: title.to_string(),
        description: description.to_string(),
        reduction,
        scales_with_grid_share: false,
        cost_impact,
        difficulty,
    }
}

/// Inputs the recommender reads from a compiled run.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationInput<'a> {
    pub lines: &'a [MaterialLineResult],
    /// Operational carbon over the design life, kg CO₂-e
    pub operational_lifetime: f64,
    pub renewable_fraction: f64,
    pub context: &'a RegionalContext,
}

/// Generates ranked recommendations from rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommender {
    pub substitutions: Vec<Substitution>,
    pub design_measures: Vec<DesignMeasure>,
}

impl Default for OptimizationRecommender {
    fn default() -> Self {
        use MaterialCategory as M;
        let substitutions = vec![
            substitution(
                M::Concrete,
                "Specify geopolymer concrete",
                "Replace Portland cement mixes with geopolymer or high-SCM concrete where structural grades allow.",
                0.40,
                CostImpact::Neutral,
                Difficulty::Moderate,
            ),
            substitution(
                M::Steel,
                "Use recycled steel",
                "Source electric-arc-furnace steel with high recycled content.",
                0.60,
                CostImpact::Low,
                Difficulty::Easy,
            ),
            substitution(
                M::Masonry,
                "Use recycled masonry",
                "Specify reclaimed brick or recycled-aggregate blocks.",
                0.25,
                CostImpact::Neutral,
                Difficulty::Moderate,
            ),
            substitution(
                M::Insulation,
                "Switch to bio-based insulation",
                "Replace foam and mineral insulation with wool or other bio-based products.",
                0.30,
                CostImpact::Low,
                Difficulty::Easy,
            ),
            substitution(
                M::Glazing,
                "Select low-carbon glazing",
                "Choose glazing units with recycled cullet and low-carbon frames.",
                0.15,
                CostImpact::Medium,
                Difficulty::Moderate,
            ),
            substitution(
                M::Finishes,
                "Use recycled-content finishes",
                "Specify recycled-content carpet, plasterboard and tiles.",
                0.20,
                CostImpact::Neutral,
                Difficulty::Easy,
            ),
        ];

        let design_measures = vec![
            measure(
                RecommendationCategory::Design,
                "Optimise window-to-wall ratio",
                "Reduce glazed area on high-exposure facades and add external shading.",
                0.08,
                CostImpact::Neutral,
                Difficulty::Moderate,
            ),
            measure(
                RecommendationCategory::Design,
                "Upgrade envelope insulation",
                "Increase wall and roof R-values above the minimum for the climate zone.",
                0.12,
                CostImpact::Medium,
                Difficulty::Moderate,
            ),
            measure(
                RecommendationCategory::Systems,
                "Install smart HVAC controls",
                "Add zoning, occupancy sensing and economy-cycle control to HVAC plant.",
                0.15,
                CostImpact::Low,
                Difficulty::Easy,
            ),
            DesignMeasure {
                scales_with_grid_share: true,
                ..measure(
                    RecommendationCategory::Renewables,
                    "Add on-site solar PV",
                    "Offset grid electricity with rooftop photovoltaics.",
                    0.25,
                    CostImpact::High,
                    Difficulty::Moderate,
                )
            },
        ];

        OptimizationRecommender {
            substitutions,
            design_measures,
        }
    }
}

impl OptimizationRecommender {
    pub fn new() -> Self {
        OptimizationRecommender::default()
    }

    /// Build recommendations ranked by savings, highest first.
    pub fn recommend(&self, input: &OptimizationInput<'_>) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for sub in &self.substitutions {
            let conventional: f64 = input
                .lines
                .iter()
                .filter(|line| line.category == sub.category && !line.low_carbon)
                .map(|line| line.stages.embodied())
                .sum();
            let savings = conventional * sub.reduction;
            if savings > 0.0 {
                recommendations.push(Recommendation {
                    title: sub.title.clone(),
                    description: sub.description.clone(),
                    category: RecommendationCategory::Material(sub.category),
                    carbon_savings: savings,
                    cost_impact: sub.cost_impact,
                    difficulty: sub.difficulty,
                    locally_available: input.context.low_carbon_available(sub.category),
                });
            }
        }

        let grid_share = (1.0 - input.renewable_fraction).clamp(0.0, 1.0);
        for m in &self.design_measures {
            let share = if m.scales_with_grid_share {
                m.reduction * grid_share
            } else {
                m.reduction
            };
            let savings = input.operational_lifetime * share;
            if savings > 0.0 {
                recommendations.push(Recommendation {
                    title: m.title.clone(),
                    description: m.description.clone(),
                    category: m.category,
                    carbon_savings: savings,
                    cost_impact: m.cost_impact,
                    difficulty: m.difficulty,
                    locally_available: true,
                });
            }
        }

        recommendations.sort_by(|a, b| b.carbon_savings.total_cmp(&a.carbon_savings));
        tracing::debug!(count = recommendations.len(), "recommendations ranked");
        recommendations
    }
}

/// Plain sum of savings; overlapping measures are not deduplicated.
pub fn total_potential_savings(recommendations: &[Recommendation]) -> f64 {
    recommendations.iter().map(|r| r.carbon_savings).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{compute_stages, StageFactors};
    use crate::materials::CarbonCoefficient;
    use crate::project::{BuildingType, Project};
    use crate::regional::RegionalAdjuster;
    use approx::assert_relative_eq;

    fn line(category: MaterialCategory, rate: f64, quantity: f64, low_carbon: bool) -> MaterialLineResult {
        let coefficient = CarbonCoefficient::new(rate, "unit");
        let stages = compute_stages(&coefficient, quantity, 50, &StageFactors::for_category(category));
        MaterialLineResult {
            index: 0,
            label: None,
            category,
            material_type: format!("{}-test", category.code()),
            quantity,
            unit: "unit".to_string(),
            coefficient,
            low_carbon,
            stages,
        }
    }

    fn context(city: &str) -> RegionalContext {
        let project = Project::new("Test", city, 1000.0, BuildingType::Office);
        RegionalAdjuster::new().enrich(&project).context
    }

    #[test]
    fn test_concrete_substitution_savings() {
        let lines = vec![line(MaterialCategory::Concrete, 320.0, 1200.0, false)];
        let ctx = context("Sydney");
        let input = OptimizationInput {
            lines: &lines,
            operational_lifetime: 0.0,
            renewable_fraction: 0.0,
            context: &ctx,
        };
        let recs = OptimizationRecommender::new().recommend(&input);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RecommendationCategory::Material(MaterialCategory::Concrete));
        assert_relative_eq!(recs[0].carbon_savings, lines[0].stages.embodied() * 0.40);
        assert!(recs[0].locally_available);
    }

    #[test]
    fn test_low_carbon_lines_excluded() {
        let lines = vec![
            line(MaterialCategory::Steel, 900.0, 10.0, true),
            line(MaterialCategory::Timber, 220.0, 50.0, false),
        ];
        let ctx = context("Sydney");
        let input = OptimizationInput {
            lines: &lines,
            operational_lifetime: 0.0,
            renewable_fraction: 0.0,
            context: &ctx,
        };
        assert!(OptimizationRecommender::new().recommend(&input).is_empty());
    }

    #[test]
    fn test_sorted_descending_and_total_is_sum() {
        let lines = vec![
            line(MaterialCategory::Concrete, 320.0, 1200.0, false),
            line(MaterialCategory::Steel, 2900.0, 80.0, false),
            line(MaterialCategory::Insulation, 3.3, 5000.0, false),
            line(MaterialCategory::Finishes, 12.0, 2000.0, false),
        ];
        let ctx = context("Darwin");
        let input = OptimizationInput {
            lines: &lines,
            operational_lifetime: 2_000_000.0,
            renewable_fraction: 0.2,
            context: &ctx,
        };
        let recs = OptimizationRecommender::new().recommend(&input);

        assert_eq!(recs.len(), 8);
        for pair in recs.windows(2) {
            assert!(pair[0].carbon_savings >= pair[1].carbon_savings);
        }
        let total: f64 = recs.iter().map(|r| r.carbon_savings).sum();
        assert_eq!(total_potential_savings(&recs), total);

        let solar = recs
            .iter()
            .find(|r| r.category == RecommendationCategory::Renewables)
            .unwrap();
        assert_relative_eq!(solar.carbon_savings, 2_000_000.0 * 0.25 * 0.8);

        // NT has no low-carbon steel supplier
        let steel = recs
            .iter()
            .find(|r| r.category == RecommendationCategory::Material(MaterialCategory::Steel))
            .unwrap();
        assert!(!steel.locally_available);
    }

    #[test]
    fn test_ties_keep_rule_order() {
        let recommender = OptimizationRecommender {
            substitutions: Vec::new(),
            design_measures: vec![
                measure(RecommendationCategory::Design, "first", "", 0.1, CostImpact::Low, Difficulty::Easy),
                measure(RecommendationCategory::Systems, "second", "", 0.1, CostImpact::Low, Difficulty::Easy),
            ],
        };
        let ctx = context("Sydney");
        let input = OptimizationInput {
            lines: &[],
            operational_lifetime: 1000.0,
            renewable_fraction: 0.0,
            context: &ctx,
        };
        let recs = recommender.recommend(&input);
        assert_eq!(recs[0].title, "first");
        assert_eq!(recs[1].title, "second");
    }

    #[test]
    fn test_fully_renewable_drops_solar() {
        let ctx = context("Sydney");
        let input = OptimizationInput {
            lines: &[],
            operational_lifetime: 1000.0,
            renewable_fraction: 1.0,
            context: &ctx,
        };
        let recs = OptimizationRecommender::new().recommend(&input);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.category != RecommendationCategory::Renewables));
    }
}
