//! Local materials table.
//!
//! Built-in cradle-to-gate coefficients for common Australian construction
//! materials, keyed by `(category, type)`. Custom tables can be layered on top
//! from JSON:
//!
//! ```json
//! [
//!   {
//!     "category": "concrete",
//!     "material_type": "concrete-65mpa",
//!     "description": "65 MPa high-strength concrete",
//!     "coefficient": { "rate": 480.0, "unit": "m3" },
//!     "low_carbon": false
//!   }
//! ]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{CarbonCoefficient, Confidence, MaterialCategory, MaterialKey};
use crate::errors::{CarbonError, CarbonResult};

/// One row of the materials table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub category: MaterialCategory,
    pub material_type: String,
    #[serde(default)]
    pub description: String,
    pub coefficient: CarbonCoefficient,
    /// Already a lower-carbon variant; no substitution is proposed for it
    #[serde(default)]
    pub low_carbon: bool,
}

impl MaterialEntry {
    pub fn new(category: MaterialCategory, material_type: impl Into<String>, coefficient: CarbonCoefficient) -> Self {
        MaterialEntry {
            category,
            material_type: material_type.into(),
            description: String::new(),
            coefficient,
            low_carbon: false,
        }
    }

    /// Mark as a lower-carbon variant (builder pattern)
    pub fn with_low_carbon(mut self, low_carbon: bool) -> Self {
        self.low_carbon = low_carbon;
        self
    }

    pub fn key(&self) -> MaterialKey {
        MaterialKey::new(self.category, self.material_type.clone())
    }
}

static BUILTIN_ENTRIES: Lazy<Vec<MaterialEntry>> = Lazy::new(|| {
    use MaterialCategory::*;

    let row = |category, material_type: &str, description: &str, rate, unit: &str, low_carbon| MaterialEntry {
        category,
        material_type: material_type.to_string(),
        description: description.to_string(),
        coefficient: CarbonCoefficient::new(rate, unit)
            .with_confidence(Confidence::High)
            .with_source("local"),
        low_carbon,
    };

    let mut entries = vec![
        // Concrete (per m³)
        row(Concrete, "concrete-20mpa", "20 MPa ready-mix concrete", 250.0, "m3", false),
        row(Concrete, "concrete-25mpa", "25 MPa ready-mix concrete", 280.0, "m3", false),
        row(Concrete, "concrete-32mpa", "32 MPa ready-mix concrete", 320.0, "m3", false),
        row(Concrete, "concrete-40mpa", "40 MPa ready-mix concrete", 370.0, "m3", false),
        row(Concrete, "concrete-50mpa", "50 MPa ready-mix concrete", 420.0, "m3", false),
        row(Concrete, "concrete-precast", "Precast concrete panel", 350.0, "m3", false),
        row(Concrete, "concrete-geopolymer", "Geopolymer concrete", 190.0, "m3", true),
        row(Concrete, "concrete-slag-blend", "50% GGBFS blended concrete", 215.0, "m3", true),
        // Steel (per tonne)
        row(Steel, "steel-structural", "Hot-rolled structural sections", 2900.0, "t", false),
        row(Steel, "steel-reinforcing", "Reinforcing bar and mesh", 2300.0, "t", false),
        row(Steel, "steel-sheet", "Galvanised sheet and purlins", 2800.0, "t", false),
        row(Steel, "steel-recycled", "Electric-arc-furnace recycled steel", 900.0, "t", true),
        // Masonry (per tonne)
        row(Masonry, "masonry-clay-brick", "Fired clay brick", 240.0, "t", false),
        row(Masonry, "masonry-concrete-block", "Concrete masonry block", 120.0, "t", false),
        row(Masonry, "masonry-recycled-brick", "Reclaimed clay brick", 40.0, "t", true),
        // Insulation (per kg)
        row(Insulation, "insulation-glasswool", "Glasswool batts", 1.35, "kg", false),
        row(Insulation, "insulation-eps", "Expanded polystyrene board", 3.3, "kg", false),
        row(Insulation, "insulation-pir", "Polyisocyanurate board", 4.3, "kg", false),
        row(Insulation, "insulation-wool", "Sheep wool batts", 0.4, "kg", true),
        // Glazing (per m²)
        row(Glazing, "glazing-single", "Single-glazed aluminium window", 25.0, "m2", false),
        row(Glazing, "glazing-double", "Double-glazed IGU", 35.0, "m2", false),
        row(Glazing, "glazing-triple", "Triple-glazed IGU", 50.0, "m2", false),
        // Finishes (per m²)
        row(Finishes, "finishes-plasterboard", "13 mm plasterboard lining", 6.0, "m2", false),
        row(Finishes, "finishes-carpet", "Nylon broadloom carpet", 12.0, "m2", false),
        row(Finishes, "finishes-ceramic-tile", "Ceramic floor tile", 15.0, "m2", false),
        row(Finishes, "finishes-recycled-carpet", "Recycled-content carpet tile", 5.5, "m2", true),
        // Other (per kg)
        row(Other, "aluminium-framing", "Extruded aluminium framing", 16.0, "kg", false),
        row(Other, "copper-pipe", "Copper pipework", 3.8, "kg", false),
    ];

    // Timber carries biogenic storage (per m³)
    let timber = |material_type: &str, description: &str, rate, storage, low_carbon| MaterialEntry {
        category: Timber,
        material_type: material_type.to_string(),
        description: description.to_string(),
        coefficient: CarbonCoefficient::new(rate, "m3")
            .with_biogenic_storage(storage)
            .with_confidence(Confidence::Medium)
            .with_source("local"),
        low_carbon,
    };
    entries.extend([
        timber("timber-softwood", "Kiln-dried softwood framing", 250.0, -700.0, false),
        timber("timber-hardwood", "Seasoned hardwood", 300.0, -900.0, false),
        timber("timber-clt", "Cross-laminated timber", 220.0, -650.0, true),
        timber("timber-glulam", "Glued laminated timber", 300.0, -650.0, true),
        timber("timber-lvl", "Laminated veneer lumber", 400.0, -600.0, false),
    ]);

    entries
});

/// Local coefficient table.
#[derive(Debug, Clone, Default)]
pub struct MaterialsDatabase {
    entries: HashMap<MaterialKey, MaterialEntry>,
}

impl MaterialsDatabase {
    /// Empty table
    pub fn new() -> Self {
        MaterialsDatabase::default()
    }

    /// Table pre-filled with the built-in coefficients
    pub fn builtin() -> Self {
        let mut database = MaterialsDatabase::new();
        for entry in BUILTIN_ENTRIES.iter() {
            database.insert(entry.clone());
        }
        database
    }

    /// Add or replace an entry (builder pattern)
    pub fn with_entry(mut self, entry: MaterialEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: MaterialEntry) {
        self.entries.insert(entry.key(), entry);
    }

    /// Parse a JSON array of entries and layer it over this table.
    pub fn merge_json(&mut self, json: &str) -> CarbonResult<usize> {
        let entries: Vec<MaterialEntry> = serde_json::from_str(json).map_err(|e| CarbonError::SerializationError {
            reason: format!("Invalid materials table: {}", e),
        })?;

        let count = entries.len();
        for entry in entries {
            entry.coefficient.validate(&entry.key())?;
            self.insert(entry);
        }
        Ok(count)
    }

    /// Load a JSON table from disk and layer it over the built-in table.
    pub fn load_with_builtin(path: &Path) -> CarbonResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CarbonError::file_error("read", path.display().to_string(), e.to_string()))?;
        let mut database = MaterialsDatabase::builtin();
        database.merge_json(&contents)?;
        Ok(database)
    }

    pub fn get(&self, key: &MaterialKey) -> Option<&MaterialEntry> {
        self.entries.get(key)
    }

    pub fn coefficient(&self, key: &MaterialKey) -> Option<&CarbonCoefficient> {
        self.entries.get(key).map(|entry| &entry.coefficient)
    }

    /// Whether the key names a lower-carbon variant. Unknown keys are not.
    pub fn is_low_carbon(&self, key: &MaterialKey) -> bool {
        self.entries.get(key).map(|entry| entry.low_carbon).unwrap_or(false)
    }

    /// Entries in one category, sorted by type identifier
    pub fn entries_in(&self, category: MaterialCategory) -> Vec<&MaterialEntry> {
        let mut entries: Vec<_> = self.entries.values().filter(|e| e.category == category).collect();
        entries.sort_by(|a, b| a.material_type.cmp(&b.material_type));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
