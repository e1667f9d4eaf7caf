//! # Carbon Intelligence Core
//!
//! The pipeline entry point. [`CarbonIntelligenceCore::calculate_project`]
//! runs one project through every stage exactly once:
//!
//! ```text
//! validate ─► enrich ─► resolve coefficients (batched) ─► lifecycle stages
//!          ─► aggregate ─► scopes ─► compliance ─► optimization ─► compile
//! ```
//!
//! Validation errors are returned as-is before any calculation starts. A
//! failure in any later stage is wrapped in [`CarbonError::Calculation`]
//! with the project id and stage; no partial result is ever returned.
//!
//! Coefficient lookups run in batches of `batch_size`: every lookup in a
//! batch is spawned on a [`JoinSet`] and all of them finish before the next
//! batch starts.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::engine::CarbonIntelligenceCore;
//! use carbon_core::materials::MaterialCategory;
//! use carbon_core::project::{BuildingType, MaterialLineItem, Project};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let core = CarbonIntelligenceCore::builtin();
//! let project = Project::new("Office tower", "Sydney", 10_000.0, BuildingType::Office)
//!     .with_material(MaterialLineItem::new(MaterialCategory::Concrete, "concrete-32mpa", 1200.0, "m3"));
//!
//! let result = core.calculate_project(&project).await.unwrap();
//! assert_eq!(result.stages.a1_a3, 384_000.0);
//! # });
//! ```

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::compliance::{BuildingPerformance, ComplianceChecker, ComplianceResult};
use crate::config::CarbonConfig;
use crate::errors::{CalcWarning, CarbonError, CarbonResult, PipelineStage};
use crate::lifecycle::{compute_stages, StageBreakdown, StageFactors};
use crate::materials::{CarbonCoefficient, CoefficientSource, MaterialsDatabase};
use crate::optimization::{OptimizationInput, OptimizationRecommender};
use crate::project::Project;
use crate::regional::{ClimateZone, RegionalAdjuster, RegionalContext};
use crate::results::{annual_operational, CarbonTotals, CompileInput, MaterialLineResult, ProjectResult, ResultsCompiler, WASTE_CATEGORY};
use crate::scopes::ScopesAggregator;

/// Composes the pipeline components. Every collaborator is injected; the
/// only state shared between runs is the coefficient cache.
pub struct CarbonIntelligenceCore {
    config: CarbonConfig,
    coefficients: Arc<CoefficientSource>,
    regional: RegionalAdjuster,
    scopes: ScopesAggregator,
    compliance: ComplianceChecker,
    optimizer: OptimizationRecommender,
    compiler: ResultsCompiler,
}

impl CarbonIntelligenceCore {
    pub fn new(config: CarbonConfig, coefficients: CoefficientSource) -> Self {
        let scopes = ScopesAggregator::new().with_fuel_factors(&config.fuel_factors);
        CarbonIntelligenceCore {
            config,
            coefficients: Arc::new(coefficients),
            regional: RegionalAdjuster::new(),
            scopes,
            compliance: ComplianceChecker::new(),
            optimizer: OptimizationRecommender::new(),
            compiler: ResultsCompiler::new(),
        }
    }

    /// Default configuration over the built-in materials table
    pub fn builtin() -> Self {
        let config = CarbonConfig::default();
        let coefficients = CoefficientSource::with_config(MaterialsDatabase::builtin(), &config);
        CarbonIntelligenceCore::new(config, coefficients)
    }

    /// Build from configuration, attaching the HTTP provider when a remote
    /// URL is configured.
    pub fn from_config(config: CarbonConfig, database: MaterialsDatabase) -> CarbonResult<Self> {
        config.validate()?;
        #[allow(unused_mut)]
        let mut coefficients = CoefficientSource::with_config(database, &config);

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(url) = &config.remote_provider_url {
            let provider = crate::materials::HttpCoefficientProvider::new(url.clone())?;
            coefficients = coefficients.with_provider(Arc::new(provider));
        }

        Ok(CarbonIntelligenceCore::new(config, coefficients))
    }

    /// Replace the regional adjuster (builder pattern)
    pub fn with_regional_adjuster(mut self, regional: RegionalAdjuster) -> Self {
        self.regional = regional;
        self
    }

    /// Replace the compliance checker (builder pattern)
    pub fn with_compliance_checker(mut self, compliance: ComplianceChecker) -> Self {
        self.compliance = compliance;
        self
    }

    /// Replace the recommender (builder pattern)
    pub fn with_optimizer(mut self, optimizer: OptimizationRecommender) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn config(&self) -> &CarbonConfig {
        &self.config
    }

    pub fn coefficients(&self) -> &CoefficientSource {
        &self.coefficients
    }

    /// Run the full pipeline for one project.
    pub async fn calculate_project(&self, project: &Project) -> CarbonResult<ProjectResult> {
        project.validate()?;

        let project_id = project.id.to_string();
        let wrap = |stage: PipelineStage| {
            let project_id = project_id.clone();
            move |source: CarbonError| CarbonError::calculation(project_id, stage, source)
        };

        tracing::debug!(project = %project.id, stage = %PipelineStage::RegionalEnrichment, "calculation started");
        let enriched = self.regional.enrich(project);
        let context = enriched.context;
        let mut warnings = enriched.warnings;

        tracing::debug!(stage = %PipelineStage::CoefficientResolution, lines = project.materials.len(), "resolving coefficients");
        let coefficients = self
            .resolve_coefficients(project, &context)
            .await
            .map_err(wrap(PipelineStage::CoefficientResolution))?;

        tracing::debug!(stage = %PipelineStage::LifecycleStages, "stage");
        let lines = self
            .lifecycle(project, &context, coefficients)
            .map_err(wrap(PipelineStage::LifecycleStages))?;

        tracing::debug!(stage = %PipelineStage::Aggregation, "stage");
        let mut stages = StageBreakdown::default();
        for line in &lines {
            stages.accumulate(&line.stages);
        }

        tracing::debug!(stage = %PipelineStage::Scopes, "stage");
        let (scopes, scope_warnings) = self
            .scopes
            .aggregate(&project.activity, context.grid_factor, self.config.scope2_method, stages.a1_a3)
            .map_err(wrap(PipelineStage::Scopes))?;
        warnings.extend(scope_warnings);

        let operational = annual_operational(&project.energy, context.grid_factor);
        let totals = CarbonTotals::new(
            &stages,
            operational,
            project.design_life_years,
            scopes.scope3.category(WASTE_CATEGORY),
        );

        tracing::debug!(stage = %PipelineStage::Compliance, "stage");
        let compliance = self.compliance.check(&performance_for(project, &totals), context.climate_zone);
        warnings.extend(compliance.warnings.iter().cloned());

        tracing::debug!(stage = %PipelineStage::Optimization, "stage");
        let recommendations = self.optimizer.recommend(&OptimizationInput {
            lines: &lines,
            operational_lifetime: totals.operational,
            renewable_fraction: project.energy.renewable_fraction,
            context: &context,
        });

        tracing::debug!(stage = %PipelineStage::Compilation, "stage");
        let result = self
            .compiler
            .compile(CompileInput {
                project,
                lines,
                stages,
                totals,
                scopes,
                compliance,
                recommendations,
                regional: context,
                warnings,
            })
            .map_err(wrap(PipelineStage::Compilation))?;

        tracing::debug!(
            project = %project.id,
            whole_of_life = result.totals.whole_of_life,
            warnings = result.warnings.len(),
            "calculation complete"
        );
        Ok(result)
    }

    /// Standalone compliance check for what-if inputs.
    ///
    /// Input that fails [`BuildingPerformance::validate`] is still graded;
    /// the result then carries an `InvalidPerformanceData` warning.
    pub fn check_ncc_compliance(&self, building: &BuildingPerformance, climate_zone: ClimateZone) -> ComplianceResult {
        graded_with_validation(&self.compliance, building, climate_zone)
    }

    /// Resolve one coefficient per line, in line order.
    async fn resolve_coefficients(
        &self,
        project: &Project,
        context: &RegionalContext,
    ) -> CarbonResult<Vec<CarbonCoefficient>> {
        let mut resolved: Vec<Option<CarbonCoefficient>> = vec![None; project.materials.len()];
        let batch_size = self.config.batch_size.max(1);

        for (batch_index, batch) in project.materials.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            let mut tasks = JoinSet::new();

            for (i, item) in batch.iter().enumerate() {
                let source = Arc::clone(&self.coefficients);
                let key = item.key();
                let state = context.state;
                tasks.spawn(async move { (offset + i, source.get(&key, Some(state)).await) });
            }

            while let Some(joined) = tasks.join_next().await {
                let (index, coefficient) =
                    joined.map_err(|e| CarbonError::internal(format!("coefficient lookup task failed: {}", e)))?;
                resolved[index] = Some(coefficient?);
            }
        }

        project
            .materials
            .iter()
            .zip(resolved)
            .map(|(item, coefficient)| {
                let coefficient = coefficient.ok_or_else(|| CarbonError::missing_coefficient(item.category.code(), item.material_type.clone()))?;
                if !coefficient.unit_matches(&item.unit) {
                    return Err(CarbonError::UnitMismatch {
                        material_type: item.material_type.clone(),
                        item_unit: item.unit.clone(),
                        coefficient_unit: coefficient.unit.clone(),
                    });
                }
                Ok(coefficient)
            })
            .collect()
    }

    fn lifecycle(
        &self,
        project: &Project,
        context: &RegionalContext,
        coefficients: Vec<CarbonCoefficient>,
    ) -> CarbonResult<Vec<MaterialLineResult>> {
        let database = self.coefficients.database();

        project
            .materials
            .iter()
            .zip(coefficients)
            .enumerate()
            .map(|(index, (item, coefficient))| {
                let factors = StageFactors::for_category(item.category)
                    .with_transport_penalty(context.transport_penalty(item.category))
                    .with_construction_penalty(context.construction_penalty)
                    .with_replacement_intensity(self.config.replacement_intensity)
                    .with_benefits(self.config.include_benefits);
                let stages = compute_stages(&coefficient, item.quantity, project.design_life_years, &factors);
                if !stages.net().is_finite() {
                    return Err(CarbonError::internal(format!("non-finite stage result for line {}", index)));
                }

                Ok(MaterialLineResult {
                    index,
                    label: item.label.clone(),
                    category: item.category,
                    material_type: item.material_type.clone(),
                    quantity: item.quantity,
                    unit: item.unit.clone(),
                    low_carbon: database.is_low_carbon(&item.key()),
                    coefficient,
                    stages,
                })
            })
            .collect()
    }
}

/// Compliance inputs for a run: the submitted performance data with the
/// building type and computed intensities filled in.
fn performance_for(project: &Project, totals: &CarbonTotals) -> BuildingPerformance {
    let gfa = project.gross_floor_area_m2;
    let mut performance = project.performance.clone();
    performance.building_type = Some(project.building_type);
    performance.embodied_carbon_intensity = Some(totals.embodied / gfa);
    if totals.operational_annual > 0.0 {
        performance.operational_intensity = Some(totals.operational_annual / gfa);
    }
    performance
}

/// Standalone compliance check against the default thresholds.
///
/// Same validation reporting as [`CarbonIntelligenceCore::check_ncc_compliance`].
pub fn check_ncc_compliance(building: &BuildingPerformance, climate_zone: ClimateZone) -> ComplianceResult {
    graded_with_validation(&ComplianceChecker::new(), building, climate_zone)
}

fn graded_with_validation(
    checker: &ComplianceChecker,
    building: &BuildingPerformance,
    climate_zone: ClimateZone,
) -> ComplianceResult {
    let mut result = checker.check(building, climate_zone);
    if let Err(err) = building.validate() {
        tracing::warn!(error = %err, "grading performance data that failed validation");
        let field = match &err {
            CarbonError::InvalidInput { field, .. } | CarbonError::MissingField { field } => field.clone(),
            _ => String::new(),
        };
        result.warnings.push(CalcWarning::InvalidPerformanceData {
            field,
            reason: err.to_string(),
        });
    }
    result
}
