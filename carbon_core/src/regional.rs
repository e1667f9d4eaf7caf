//! # Regional Adjustment
//!
//! Resolves a project location to an Australian state/territory and NCC
//! climate zone, and attaches the regional data the pipeline needs: grid
//! emission factor, transport penalties and supplier availability.
//!
//! ## Resolution order
//!
//! | Step | Source                         | Warning            |
//! |------|--------------------------------|--------------------|
//! | 1    | explicit `project.climate_zone`| only if state unknown |
//! | 2    | city table                     | none               |
//! | 3    | state reference zone           | `RegionalFallback` |
//! | 4    | `DEFAULT_STATE` / `DEFAULT_CLIMATE_ZONE` | `RegionalFallback` |
//!
//! Unknown locations never fail; they resolve deterministically to the
//! defaults and the decision is reported on the result.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::project::{BuildingType, Project};
//! use carbon_core::regional::{RegionalAdjuster, DEFAULT_CLIMATE_ZONE};
//!
//! let project = Project::new("Lost City", "Atlantis", 100.0, BuildingType::Office);
//! let enriched = RegionalAdjuster::new().enrich(&project);
//!
//! assert_eq!(enriched.context.climate_zone.value(), DEFAULT_CLIMATE_ZONE);
//! assert_eq!(enriched.warnings.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::CalcWarning;
use crate::materials::MaterialCategory;
use crate::project::Project;

/// Climate zone used when a location cannot be resolved (temperate, Sydney)
pub const DEFAULT_CLIMATE_ZONE: u8 = 5;

/// State used when a location cannot be resolved
pub const DEFAULT_STATE: State = State::Nsw;

/// Australian states and territories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    Nsw,
    Vic,
    Qld,
    Wa,
    Sa,
    Tas,
    Act,
    Nt,
}

impl State {
    pub fn code(&self) -> &'static str {
        match self {
            State::Nsw => "NSW",
            State::Vic => "VIC",
            State::Qld => "QLD",
            State::Wa => "WA",
            State::Sa => "SA",
            State::Tas => "TAS",
            State::Act => "ACT",
            State::Nt => "NT",
        }
    }

    /// Location-based grid emission factor, kg CO₂-e per kWh (scope 2)
    pub fn grid_factor(&self) -> f64 {
        match self {
            State::Nsw | State::Act => 0.68,
            State::Vic => 0.79,
            State::Qld => 0.71,
            State::Wa => 0.51,
            State::Sa => 0.23,
            State::Tas => 0.15,
            State::Nt => 0.54,
        }
    }

    /// Freight remoteness multiplier applied to A4 transport
    pub fn transport_multiplier(&self) -> f64 {
        match self {
            State::Nsw | State::Vic => 1.0,
            State::Act => 1.05,
            State::Qld | State::Sa => 1.1,
            State::Tas => 1.2,
            State::Wa => 1.25,
            State::Nt => 1.4,
        }
    }

    /// Site labour and plant multiplier applied to A5 construction
    pub fn construction_multiplier(&self) -> f64 {
        match self {
            State::Nsw | State::Vic => 1.0,
            State::Act => 1.03,
            State::Qld | State::Sa => 1.05,
            State::Tas => 1.08,
            State::Wa => 1.1,
            State::Nt => 1.2,
        }
    }

    /// Climate zone of the state's capital, used when only the state is known
    pub fn reference_climate_zone(&self) -> u8 {
        match self {
            State::Nsw | State::Wa | State::Sa => 5,
            State::Vic => 6,
            State::Qld => 2,
            State::Tas | State::Act => 7,
            State::Nt => 1,
        }
    }
}

impl FromStr for State {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nsw" | "new south wales" => Ok(State::Nsw),
            "vic" | "victoria" => Ok(State::Vic),
            "qld" | "queensland" => Ok(State::Qld),
            "wa" | "western australia" => Ok(State::Wa),
            "sa" | "south australia" => Ok(State::Sa),
            "tas" | "tasmania" => Ok(State::Tas),
            "act" | "australian capital territory" => Ok(State::Act),
            "nt" | "northern territory" => Ok(State::Nt),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// NCC climate zone, 1 (hot humid) to 8 (alpine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ClimateZone(u8);

impl TryFrom<u8> for ClimateZone {
    type Error = String;

    fn try_from(zone: u8) -> Result<Self, Self::Error> {
        ClimateZone::new(zone).ok_or_else(|| format!("climate zone {} outside 1-8", zone))
    }
}

impl From<ClimateZone> for u8 {
    fn from(zone: ClimateZone) -> u8 {
        zone.0
    }
}

impl ClimateZone {
    /// Returns `None` outside 1..=8
    pub fn new(zone: u8) -> Option<Self> {
        (1..=8).contains(&zone).then_some(ClimateZone(zone))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Zero-based index into per-zone threshold tables
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl Default for ClimateZone {
    fn default() -> Self {
        ClimateZone(DEFAULT_CLIMATE_ZONE)
    }
}

impl std::fmt::Display for ClimateZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// (state, category) embodied-rate multipliers. Absent pairs mean 1.0.
static MATERIAL_MULTIPLIERS: Lazy<HashMap<(State, MaterialCategory), f64>> = Lazy::new(|| {
    use MaterialCategory::*;
    HashMap::from([
        ((State::Vic, Concrete), 1.03),
        ((State::Wa, Concrete), 1.05),
        ((State::Wa, Steel), 1.08),
        ((State::Nt, Concrete), 1.12),
        ((State::Nt, Steel), 1.10),
        ((State::Nt, Glazing), 1.06),
        ((State::Tas, Concrete), 1.06),
        ((State::Tas, Timber), 0.92),
        ((State::Qld, Timber), 0.95),
        ((State::Sa, Steel), 0.97),
    ])
});

/// Regional multiplier for a material category, if one is tabulated.
pub fn material_multiplier(state: State, category: MaterialCategory) -> Option<f64> {
    MATERIAL_MULTIPLIERS.get(&(state, category)).copied()
}

/// Supplier offering a material category in a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    /// Offers a lower-carbon variant of the category (geopolymer, EAF steel, …)
    pub low_carbon_option: bool,
    /// Typical haul distance to site, km
    pub typical_distance_km: f64,
}

static SUPPLIERS: Lazy<HashMap<(State, MaterialCategory), Vec<Supplier>>> = Lazy::new(|| {
    use MaterialCategory::*;

    let supplier = |name: &str, low_carbon_option, typical_distance_km| Supplier {
        name: name.to_string(),
        low_carbon_option,
        typical_distance_km,
    };

    let mut table = HashMap::new();
    for state in [State::Nsw, State::Vic, State::Qld, State::Wa, State::Sa, State::Tas, State::Act, State::Nt] {
        let metro = matches!(state, State::Nsw | State::Vic | State::Qld | State::Wa);
        let haul = 60.0 * state.transport_multiplier();

        table.insert(
            (state, Concrete),
            vec![
                supplier("Metro ready-mix batching plant", metro, haul * 0.5),
                supplier("Regional precast yard", false, haul * 2.0),
            ],
        );
        table.insert(
            (state, Steel),
            vec![
                supplier("Integrated mill distributor", false, haul * 8.0),
                supplier("Electric-arc-furnace recycler", matches!(state, State::Nsw | State::Vic), haul * 4.0),
            ],
        );
        table.insert(
            (state, Timber),
            vec![supplier("Plantation softwood mill", state != State::Nt, haul * 3.0)],
        );
        table.insert(
            (state, Masonry),
            vec![supplier("Brickworks and salvage yard", metro || state == State::Sa, haul)],
        );
        table.insert(
            (state, Insulation),
            vec![supplier("Insulation wholesaler", true, haul * 2.0)],
        );
        table.insert(
            (state, Glazing),
            vec![supplier("IGU fabricator", metro, haul * 2.0)],
        );
        table.insert(
            (state, Finishes),
            vec![supplier("Interior finishes distributor", true, haul)],
        );
    }
    table
});

/// City → (state, climate zone)
static CITY_TABLE: Lazy<Vec<(&'static str, State, u8)>> = Lazy::new(|| {
    vec![
        ("sydney", State::Nsw, 5),
        ("newcastle", State::Nsw, 5),
        ("wollongong", State::Nsw, 5),
        ("thredbo", State::Nsw, 8),
        ("melbourne", State::Vic, 6),
        ("geelong", State::Vic, 6),
        ("ballarat", State::Vic, 7),
        ("brisbane", State::Qld, 2),
        ("gold coast", State::Qld, 2),
        ("cairns", State::Qld, 1),
        ("townsville", State::Qld, 1),
        ("perth", State::Wa, 5),
        ("adelaide", State::Sa, 5),
        ("hobart", State::Tas, 7),
        ("launceston", State::Tas, 7),
        ("canberra", State::Act, 7),
        ("darwin", State::Nt, 1),
        ("alice springs", State::Nt, 3),
    ]
});

/// How the climate zone was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneResolution {
    Explicit,
    CityTable,
    StateReference,
    Default,
}

/// Derived regional data attached to a project for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalContext {
    pub state: State,
    pub climate_zone: ClimateZone,
    pub resolution: ZoneResolution,
    /// kg CO₂-e per kWh
    pub grid_factor: f64,
    /// A4 multiplier per material category
    pub transport_penalties: BTreeMap<MaterialCategory, f64>,
    /// A5 multiplier, same for every category
    pub construction_penalty: f64,
    pub suppliers: BTreeMap<MaterialCategory, Vec<Supplier>>,
}

impl RegionalContext {
    pub fn transport_penalty(&self, category: MaterialCategory) -> f64 {
        self.transport_penalties.get(&category).copied().unwrap_or(1.0)
    }

    /// Whether any local supplier offers a lower-carbon variant
    pub fn low_carbon_available(&self, category: MaterialCategory) -> bool {
        self.suppliers
            .get(&category)
            .map(|list| list.iter().any(|s| s.low_carbon_option))
            .unwrap_or(false)
    }
}

/// A project paired with its regional context. The project is borrowed,
/// never modified.
#[derive(Debug, Clone)]
pub struct EnrichedProject<'a> {
    pub project: &'a Project,
    pub context: RegionalContext,
    pub warnings: Vec<CalcWarning>,
}

/// Maps locations to regional context.
#[derive(Debug, Clone)]
pub struct RegionalAdjuster {
    cities: HashMap<String, (State, u8)>,
}

impl Default for RegionalAdjuster {
    fn default() -> Self {
        RegionalAdjuster::new()
    }
}

impl RegionalAdjuster {
    /// Adjuster with the built-in city table
    pub fn new() -> Self {
        let cities = CITY_TABLE
            .iter()
            .map(|(city, state, zone)| (city.to_string(), (*state, *zone)))
            .collect();
        RegionalAdjuster { cities }
    }

    /// Add or replace a city mapping (builder pattern). Zones outside 1..=8
    /// are ignored.
    pub fn with_city(mut self, city: &str, state: State, zone: u8) -> Self {
        if ClimateZone::new(zone).is_some() {
            self.cities.insert(normalize(city), (state, zone));
        }
        self
    }

    /// Look up a city in the table
    pub fn lookup_city(&self, city: &str) -> Option<(State, ClimateZone)> {
        self.cities
            .get(&normalize(city))
            .and_then(|(state, zone)| ClimateZone::new(*zone).map(|z| (*state, z)))
    }

    /// Attach regional context to a project.
    pub fn enrich<'a>(&self, project: &'a Project) -> EnrichedProject<'a> {
        let mut warnings = Vec::new();
        let location = project.location.to_string();

        let city_hit = self.lookup_city(&project.location.city);
        let named_state = project
            .location
            .state
            .as_deref()
            .and_then(|s| State::from_str(s).ok());
        let explicit_zone = project.climate_zone.and_then(ClimateZone::new);

        let (state, climate_zone, resolution) = match (explicit_zone, city_hit, named_state) {
            (Some(zone), Some((state, _)), _) | (Some(zone), None, Some(state)) => {
                (state, zone, ZoneResolution::Explicit)
            }
            (Some(zone), None, None) => {
                warnings.push(CalcWarning::RegionalFallback {
                    location: location.clone(),
                    state: DEFAULT_STATE.code().to_string(),
                    climate_zone: zone.value(),
                    reason: "state unresolved; default state used for grid and transport factors".to_string(),
                });
                (DEFAULT_STATE, zone, ZoneResolution::Explicit)
            }
            (None, Some((state, zone)), _) => (state, zone, ZoneResolution::CityTable),
            (None, None, Some(state)) => {
                let zone = ClimateZone(state.reference_climate_zone());
                warnings.push(CalcWarning::RegionalFallback {
                    location: location.clone(),
                    state: state.code().to_string(),
                    climate_zone: zone.value(),
                    reason: "city not in table; state reference zone used".to_string(),
                });
                (state, zone, ZoneResolution::StateReference)
            }
            (None, None, None) => {
                let zone = ClimateZone(DEFAULT_CLIMATE_ZONE);
                warnings.push(CalcWarning::RegionalFallback {
                    location: location.clone(),
                    state: DEFAULT_STATE.code().to_string(),
                    climate_zone: zone.value(),
                    reason: "location unknown; default zone used".to_string(),
                });
                (DEFAULT_STATE, zone, ZoneResolution::Default)
            }
        };

        for warning in &warnings {
            tracing::warn!(project = %project.id, "{}", warning);
        }

        EnrichedProject {
            project,
            context: build_context(state, climate_zone, resolution),
            warnings,
        }
    }
}

fn build_context(state: State, climate_zone: ClimateZone, resolution: ZoneResolution) -> RegionalContext {
    let remoteness = state.transport_multiplier();

    let transport_penalties = MaterialCategory::ALL
        .iter()
        .map(|category| {
            // Concrete and masonry are batched or fired close to site
            let penalty = match category {
                MaterialCategory::Concrete | MaterialCategory::Masonry => 1.0 + (remoteness - 1.0) / 2.0,
                _ => remoteness,
            };
            (*category, penalty)
        })
        .collect();

    let suppliers = MaterialCategory::ALL
        .iter()
        .filter_map(|category| {
            SUPPLIERS
                .get(&(state, *category))
                .map(|list| (*category, list.clone()))
        })
        .collect();

    RegionalContext {
        state,
        climate_zone,
        resolution,
        grid_factor: state.grid_factor(),
        transport_penalties,
        construction_penalty: state.construction_multiplier(),
        suppliers,
    }
}

fn normalize(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
