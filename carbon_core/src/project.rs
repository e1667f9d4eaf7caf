//! # Project Data Structures
//!
//! The `Project` struct is the submission for one calculation run: identity,
//! location, floor area, bill of materials, energy profile, activity data
//! and building performance. Projects are plain JSON documents.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── id, name, schema_version
//! ├── location: Location (city, state)
//! ├── gross_floor_area_m2, building_type, design_life_years, climate_zone
//! ├── materials: Vec<MaterialLineItem>
//! ├── energy: EnergyProfile (operational energy)
//! ├── activity: ActivityData (GHG Protocol scope inputs)
//! └── performance: BuildingPerformance (compliance inputs)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::project::{BuildingType, MaterialLineItem, Project};
//! use carbon_core::materials::MaterialCategory;
//!
//! let project = Project::new("Harbour Offices", "Sydney", 10_000.0, BuildingType::Office)
//!     .with_material(MaterialLineItem::new(MaterialCategory::Concrete, "concrete-32mpa", 1200.0, "m3"));
//!
//! assert!(project.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::BuildingPerformance;
use crate::errors::{CarbonError, CarbonResult};
use crate::materials::{MaterialCategory, MaterialKey};
use crate::scopes::ActivityData;

/// Current schema version for project files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Default design life in years
pub const DEFAULT_DESIGN_LIFE_YEARS: u32 = 50;

fn schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_design_life() -> u32 {
    DEFAULT_DESIGN_LIFE_YEARS
}

/// Project submitted for a calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub name: String,

    #[serde(default = "schema_version")]
    pub schema_version: String,

    pub location: Location,

    /// Gross floor area in m²
    pub gross_floor_area_m2: f64,

    pub building_type: BuildingType,

    #[serde(default = "default_design_life")]
    pub design_life_years: u32,

    /// Explicit NCC climate zone (1-8); overrides the location lookup
    #[serde(default)]
    pub climate_zone: Option<u8>,

    pub materials: Vec<MaterialLineItem>,

    #[serde(default)]
    pub energy: EnergyProfile,

    #[serde(default)]
    pub activity: ActivityData,

    #[serde(default)]
    pub performance: BuildingPerformance,
}

impl Project {
    /// Create a project with an empty bill of materials.
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        gross_floor_area_m2: f64,
        building_type: BuildingType,
    ) -> Self {
        Project {
            id: Uuid::new_v4(),
            name: name.into(),
            schema_version: schema_version(),
            location: Location::new(city),
            gross_floor_area_m2,
            building_type,
            design_life_years: DEFAULT_DESIGN_LIFE_YEARS,
            climate_zone: None,
            materials: Vec::new(),
            energy: EnergyProfile::default(),
            activity: ActivityData::default(),
            performance: BuildingPerformance::default(),
        }
    }

    /// Add a material line (builder pattern)
    pub fn with_material(mut self, item: MaterialLineItem) -> Self {
        self.materials.push(item);
        self
    }

    /// Set the state of the location (builder pattern)
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.location.state = Some(state.into());
        self
    }

    /// Set the operational energy profile (builder pattern)
    pub fn with_energy(mut self, energy: EnergyProfile) -> Self {
        self.energy = energy;
        self
    }

    /// Set scope activity data (builder pattern)
    pub fn with_activity(mut self, activity: ActivityData) -> Self {
        self.activity = activity;
        self
    }

    /// Set compliance inputs (builder pattern)
    pub fn with_performance(mut self, performance: BuildingPerformance) -> Self {
        self.performance = performance;
        self
    }

    /// Validate the submission. Runs once, before any calculation.
    pub fn validate(&self) -> CarbonResult<()> {
        if self.name.trim().is_empty() {
            return Err(CarbonError::missing_field("name"));
        }
        if !self.gross_floor_area_m2.is_finite() || self.gross_floor_area_m2 <= 0.0 {
            return Err(CarbonError::invalid_input(
                "gross_floor_area_m2",
                self.gross_floor_area_m2.to_string(),
                "Floor area must be positive",
            ));
        }
        if self.design_life_years == 0 {
            return Err(CarbonError::invalid_input(
                "design_life_years",
                "0",
                "Design life must be at least one year",
            ));
        }
        if let Some(zone) = self.climate_zone {
            if !(1..=8).contains(&zone) {
                return Err(CarbonError::invalid_input(
                    "climate_zone",
                    zone.to_string(),
                    "Climate zone must be between 1 and 8",
                ));
            }
        }
        if self.materials.is_empty() {
            return Err(CarbonError::missing_field("materials"));
        }
        for (index, item) in self.materials.iter().enumerate() {
            item.validate(index)?;
        }
        self.energy.validate()?;
        self.activity.validate()?;
        self.performance.validate()?;
        Ok(())
    }
}

/// Project location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    /// State or territory code or name (e.g., "NSW", "Victoria")
    #[serde(default)]
    pub state: Option<String>,
}

impl Location {
    pub fn new(city: impl Into<String>) -> Self {
        Location {
            city: city.into(),
            state: None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{}, {}", self.city, state),
            None => write!(f, "{}", self.city),
        }
    }
}

/// Building classification used for benchmarks and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Office,
    Residential,
    Retail,
    Education,
    Healthcare,
    Industrial,
    Hospitality,
    MixedUse,
    /// No tabulated benchmarks; the office profile is used
    Other,
}

impl BuildingType {
    pub fn display_name(&self) -> &'static str {
        match self {
            BuildingType::Office => "Office",
            BuildingType::Residential => "Residential",
            BuildingType::Retail => "Retail",
            BuildingType::Education => "Education",
            BuildingType::Healthcare => "Healthcare",
            BuildingType::Industrial => "Industrial",
            BuildingType::Hospitality => "Hospitality",
            BuildingType::MixedUse => "Mixed Use",
            BuildingType::Other => "Other",
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One line of the bill of materials.
///
/// ## JSON Example
///
/// ```json
/// { "category": "concrete", "material_type": "concrete-32mpa", "quantity": 1200.0, "unit": "m3" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLineItem {
    pub category: MaterialCategory,
    pub material_type: String,
    pub quantity: f64,
    pub unit: String,
    /// Optional user label (e.g., "Level 2 slab")
    #[serde(default)]
    pub label: Option<String>,
}

impl MaterialLineItem {
    pub fn new(category: MaterialCategory, material_type: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        MaterialLineItem {
            category,
            material_type: material_type.into(),
            quantity,
            unit: unit.into(),
            label: None,
        }
    }

    pub fn key(&self) -> MaterialKey {
        MaterialKey::new(self.category, self.material_type.clone())
    }

    fn validate(&self, index: usize) -> CarbonResult<()> {
        if self.material_type.trim().is_empty() {
            return Err(CarbonError::missing_field(format!("materials[{}].material_type", index)));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(CarbonError::invalid_input(
                format!("materials[{}].quantity", index),
                self.quantity.to_string(),
                "Quantity must be positive",
            ));
        }
        Ok(())
    }
}

/// Annual operational energy use.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyProfile {
    /// Grid electricity, kWh per year
    pub annual_electricity_kwh: f64,
    /// Reticulated natural gas, MJ per year
    pub annual_gas_mj: f64,
    /// Share of electricity met by on-site renewables (0-1)
    pub renewable_fraction: f64,
}

impl EnergyProfile {
    fn validate(&self) -> CarbonResult<()> {
        for (field, value) in [
            ("energy.annual_electricity_kwh", self.annual_electricity_kwh),
            ("energy.annual_gas_mj", self.annual_gas_mj),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CarbonError::invalid_input(field, value.to_string(), "Energy use must be non-negative"));
            }
        }
        if !(0.0..=1.0).contains(&self.renewable_fraction) {
            return Err(CarbonError::invalid_input(
                "energy.renewable_fraction",
                self.renewable_fraction.to_string(),
                "Renewable fraction must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_project() -> Project {
        Project::new("Test Tower", "Sydney", 10_000.0, BuildingType::Office)
            .with_material(MaterialLineItem::new(MaterialCategory::Concrete, "concrete-32mpa", 1200.0, "m3"))
    }

    #[test]
    fn test_project_creation() {
        let project = valid_project();
        assert_eq!(project.design_life_years, 50);
        assert_eq!(project.schema_version, SCHEMA_VERSION);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_zero_floor_area_rejected() {
        let mut project = valid_project();
        project.gross_floor_area_m2 = 0.0;
        let err = project.validate().unwrap_err();
        assert!(matches!(err, CarbonError::InvalidInput { ref field, .. } if field == "gross_floor_area_m2"));
    }

    #[test]
    fn test_empty_materials_rejected() {
        let project = Project::new("Empty", "Sydney", 100.0, BuildingType::Office);
        assert_eq!(project.validate().unwrap_err(), CarbonError::missing_field("materials"));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let project = valid_project().with_material(MaterialLineItem::new(
            MaterialCategory::Steel,
            "steel-structural",
            0.0,
            "t",
        ));
        let err = project.validate().unwrap_err();
        assert!(matches!(err, CarbonError::InvalidInput { ref field, .. } if field == "materials[1].quantity"));
    }

    #[test]
    fn test_climate_zone_range() {
        let mut project = valid_project();
        project.climate_zone = Some(9);
        assert!(project.validate().is_err());
        project.climate_zone = Some(8);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_renewable_fraction_range() {
        let project = valid_project().with_energy(EnergyProfile {
            annual_electricity_kwh: 1000.0,
            annual_gas_mj: 0.0,
            renewable_fraction: 1.5,
        });
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "name": "Minimal",
            "location": { "city": "Melbourne" },
            "gross_floor_area_m2": 500.0,
            "building_type": "residential",
            "materials": [
                { "category": "timber", "material_type": "timber-clt", "quantity": 40.0, "unit": "m3" }
            ]
        }"#;

        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.design_life_years, DEFAULT_DESIGN_LIFE_YEARS);
        assert_eq!(project.schema_version, SCHEMA_VERSION);
        assert_eq!(project.building_type, BuildingType::Residential);
        assert!(project.climate_zone.is_none());
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_building_type_serialization() {
        let json = serde_json::to_string(&BuildingType::MixedUse).unwrap();
        assert_eq!(json, "\"mixed_use\"");
    }
}
