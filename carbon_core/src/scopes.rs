//! # GHG Protocol Scopes
//!
//! Maps raw activity data to Scope 1, 2 and 3 totals.
//!
//! | Scope | Categories                                                   |
//! |-------|--------------------------------------------------------------|
//! | 1     | `stationary_combustion`, `mobile_combustion`                 |
//! | 2     | `purchased_electricity`                                      |
//! | 3     | `purchased_materials`, `upstream_transport`, `waste`, `employee_commuting` |
//!
//! Every [`ScopeResult`] is built from its category map, so the total is the
//! sum of the categories by construction.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::scopes::{ActivityData, FuelUse, ScopesAggregator, Scope2Method};
//!
//! let activity = ActivityData {
//!     stationary_fuels: vec![FuelUse::new("diesel", 5000.0)],
//!     ..Default::default()
//! };
//!
//! let aggregator = ScopesAggregator::new();
//! let (scopes, warnings) = aggregator
//!     .aggregate(&activity, 0.68, Scope2Method::LocationBased, 0.0)
//!     .unwrap();
//!
//! assert!((scopes.scope1.category("stationary_combustion") - 13_400.0).abs() < 1e-6);
//! assert!(warnings.is_empty());
//! ```

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcWarning, CarbonError, CarbonResult};

/// Natural gas factor, kg CO₂-e per MJ
pub const NATURAL_GAS_FACTOR: f64 = 0.0515;

/// Default fuel factors, kg CO₂-e per litre (per MJ for natural gas)
static DEFAULT_FUEL_FACTORS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("diesel", 2.68),
        ("petrol", 2.31),
        ("lpg", 1.51),
        ("natural_gas", NATURAL_GAS_FACTOR),
        ("fuel_oil", 2.95),
    ])
});

/// Scope 2 accounting method. Chosen explicitly per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope2Method {
    /// Grid-average factor for the project's state
    #[default]
    LocationBased,
    /// Contractual factor supplied in the activity data
    MarketBased,
}

/// Quantity of a fuel burnt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelUse {
    /// Fuel identifier (e.g., "diesel", "petrol", "lpg", "natural_gas")
    pub fuel: String,
    /// Litres, or MJ for natural gas
    pub quantity: f64,
}

impl FuelUse {
    pub fn new(fuel: impl Into<String>, quantity: f64) -> Self {
        FuelUse {
            fuel: fuel.into(),
            quantity,
        }
    }
}

/// Fuel used by a fleet vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleUse {
    #[serde(default)]
    pub description: String,
    pub fuel: String,
    /// Litres consumed
    pub fuel_consumed: f64,
}

/// Transport mode and its emission unit model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    RigidTruck,
    ArticulatedTruck,
    Rail,
    Sea,
    AirFreight,
    Car,
    Bus,
    Train,
    Flight,
    Bicycle,
}

/// How a transport leg's emissions scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitModel {
    /// distance × weight × factor
    TonneKm,
    /// distance × factor
    PassengerKm,
}

impl TransportMode {
    /// Unit model for this mode. Decided by the mode, never by magnitudes.
    pub fn unit_model(&self) -> UnitModel {
        match self {
            TransportMode::RigidTruck
            | TransportMode::ArticulatedTruck
            | TransportMode::Rail
            | TransportMode::Sea
            | TransportMode::AirFreight => UnitModel::TonneKm,
            TransportMode::Car
            | TransportMode::Bus
            | TransportMode::Train
            | TransportMode::Flight
            | TransportMode::Bicycle => UnitModel::PassengerKm,
        }
    }

    /// kg CO₂-e per tonne-km or per passenger-km
    pub fn factor(&self) -> f64 {
        match self {
            TransportMode::RigidTruck => 0.20,
            TransportMode::ArticulatedTruck => 0.08,
            TransportMode::Rail => 0.025,
            TransportMode::Sea => 0.012,
            TransportMode::AirFreight => 1.1,
            TransportMode::Car => 0.17,
            TransportMode::Bus => 0.10,
            TransportMode::Train => 0.04,
            TransportMode::Flight => 0.15,
            TransportMode::Bicycle => 0.0,
        }
    }
}

/// One upstream transport leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportLeg {
    pub mode: TransportMode,
    pub distance_km: f64,
    /// Required for tonne-km modes, ignored for passenger modes
    #[serde(default)]
    pub weight_tonnes: Option<f64>,
}

/// Waste disposal route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalMethod {
    Landfill,
    Recycling,
    Composting,
    Incineration,
}

impl DisposalMethod {
    /// kg CO₂-e per tonne
    pub fn factor(&self) -> f64 {
        match self {
            DisposalMethod::Landfill => 470.0,
            DisposalMethod::Recycling => 21.0,
            DisposalMethod::Composting => 35.0,
            DisposalMethod::Incineration => 920.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteStream {
    pub method: DisposalMethod,
    pub tonnes: f64,
}

/// Employee commuting for one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commuting {
    pub employees: u32,
    /// Round-trip distance per employee per day, km
    pub distance_km: f64,
    pub working_days: u32,
    pub mode: TransportMode,
}

/// Raw activity data for scope accounting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityData {
    pub stationary_fuels: Vec<FuelUse>,
    pub vehicles: Vec<VehicleUse>,
    pub purchased_electricity_kwh: f64,
    /// Contractual factor (kg CO₂-e per kWh) for market-based scope 2
    pub market_factor: Option<f64>,
    pub transport: Vec<TransportLeg>,
    pub waste: Vec<WasteStream>,
    pub commuting: Vec<Commuting>,
}

impl ActivityData {
    pub fn validate(&self) -> CarbonResult<()> {
        let non_negative = |field: String, value: f64| -> CarbonResult<()> {
            if !value.is_finite() || value < 0.0 {
                return Err(CarbonError::invalid_input(field, value.to_string(), "Must be non-negative"));
            }
            Ok(())
        };

        for (i, fuel) in self.stationary_fuels.iter().enumerate() {
            non_negative(format!("activity.stationary_fuels[{}].quantity", i), fuel.quantity)?;
        }
        for (i, vehicle) in self.vehicles.iter().enumerate() {
            non_negative(format!("activity.vehicles[{}].fuel_consumed", i), vehicle.fuel_consumed)?;
        }
        non_negative("activity.purchased_electricity_kwh".to_string(), self.purchased_electricity_kwh)?;
        if let Some(factor) = self.market_factor {
            non_negative("activity.market_factor".to_string(), factor)?;
        }
        for (i, leg) in self.transport.iter().enumerate() {
            non_negative(format!("activity.transport[{}].distance_km", i), leg.distance_km)?;
            match (leg.mode.unit_model(), leg.weight_tonnes) {
                (UnitModel::TonneKm, None) => {
                    return Err(CarbonError::missing_field(format!("activity.transport[{}].weight_tonnes", i)));
                }
                (_, Some(weight)) => non_negative(format!("activity.transport[{}].weight_tonnes", i), weight)?,
                (UnitModel::PassengerKm, None) => {}
            }
        }
        for (i, stream) in self.waste.iter().enumerate() {
            non_negative(format!("activity.waste[{}].tonnes", i), stream.tonnes)?;
        }
        for (i, commute) in self.commuting.iter().enumerate() {
            non_negative(format!("activity.commuting[{}].distance_km", i), commute.distance_km)?;
            if commute.mode.unit_model() != UnitModel::PassengerKm {
                return Err(CarbonError::invalid_input(
                    format!("activity.commuting[{}].mode", i),
                    format!("{:?}", commute.mode),
                    "Commuting requires a passenger transport mode",
                ));
            }
        }
        Ok(())
    }
}

/// One scope's total and category subtotals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeResult {
    pub total: f64,
    pub categories: BTreeMap<String, f64>,
}

impl ScopeResult {
    /// Build from category subtotals; the total is their sum.
    pub fn from_categories(categories: BTreeMap<String, f64>) -> Self {
        let total = categories.values().sum();
        ScopeResult { total, categories }
    }

    /// Subtotal for a category, 0.0 when absent
    pub fn category(&self, name: &str) -> f64 {
        self.categories.get(name).copied().unwrap_or(0.0)
    }
}

/// Scope 1, 2 and 3 results for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopesResult {
    pub scope1: ScopeResult,
    pub scope2: ScopeResult,
    pub scope3: ScopeResult,
    /// Method used for every scope 2 figure in this result
    pub scope2_method: Scope2Method,
}

impl ScopesResult {
    pub fn total(&self) -> f64 {
        self.scope1.total + self.scope2.total + self.scope3.total
    }
}

/// Applies emission factors to activity data.
#[derive(Debug, Clone)]
pub struct ScopesAggregator {
    fuel_factors: HashMap<String, f64>,
}

impl Default for ScopesAggregator {
    fn default() -> Self {
        ScopesAggregator::new()
    }
}

impl ScopesAggregator {
    /// Aggregator with the default fuel factor table
    pub fn new() -> Self {
        let fuel_factors = DEFAULT_FUEL_FACTORS
            .iter()
            .map(|(fuel, factor)| (fuel.to_string(), *factor))
            .collect();
        ScopesAggregator { fuel_factors }
    }

    /// Add or override fuel factors (builder pattern)
    pub fn with_fuel_factors<'a>(mut self, factors: impl IntoIterator<Item = (&'a String, &'a f64)>) -> Self {
        for (fuel, factor) in factors {
            self.fuel_factors.insert(fuel.to_ascii_lowercase(), *factor);
        }
        self
    }

    pub fn fuel_factor(&self, fuel: &str) -> Option<f64> {
        self.fuel_factors.get(&fuel.trim().to_ascii_lowercase()).copied()
    }

    /// Aggregate activity data into scope results.
    ///
    /// `materials_a1_a3` is the summed product-stage carbon from the
    /// lifecycle engine; it becomes scope 3 `purchased_materials`.
    pub fn aggregate(
        &self,
        activity: &ActivityData,
        grid_factor: f64,
        method: Scope2Method,
        materials_a1_a3: f64,
    ) -> CarbonResult<(ScopesResult, Vec<CalcWarning>)> {
        let mut warnings = Vec::new();

        let scope1 = self.scope1(activity, &mut warnings);
        let scope2 = Self::scope2(activity, grid_factor, method)?;
        let scope3 = Self::scope3(activity, materials_a1_a3)?;

        Ok((
            ScopesResult {
                scope1,
                scope2,
                scope3,
                scope2_method: method,
            },
            warnings,
        ))
    }

    fn scope1(&self, activity: &ActivityData, warnings: &mut Vec<CalcWarning>) -> ScopeResult {
        let mut burn = |fuel: &str, quantity: f64| -> f64 {
            match self.fuel_factor(fuel) {
                Some(factor) => quantity * factor,
                None => {
                    let warning = CalcWarning::MissingEmissionFactor {
                        fuel: fuel.to_string(),
                        scope: 1,
                    };
                    tracing::warn!("{}", warning);
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                    0.0
                }
            }
        };

        let stationary: f64 = activity
            .stationary_fuels
            .iter()
            .map(|use_| burn(&use_.fuel, use_.quantity))
            .sum();
        let mobile: f64 = activity
            .vehicles
            .iter()
            .map(|vehicle| burn(&vehicle.fuel, vehicle.fuel_consumed))
            .sum();

        ScopeResult::from_categories(BTreeMap::from([
            ("stationary_combustion".to_string(), stationary),
            ("mobile_combustion".to_string(), mobile),
        ]))
    }

    fn scope2(activity: &ActivityData, grid_factor: f64, method: Scope2Method) -> CarbonResult<ScopeResult> {
        let factor = match method {
            Scope2Method::LocationBased => grid_factor,
            Scope2Method::MarketBased => activity
                .market_factor
                .ok_or_else(|| CarbonError::missing_field("activity.market_factor"))?,
        };

        Ok(ScopeResult::from_categories(BTreeMap::from([(
            "purchased_electricity".to_string(),
            activity.purchased_electricity_kwh * factor,
        )])))
    }

    fn scope3(activity: &ActivityData, materials_a1_a3: f64) -> CarbonResult<ScopeResult> {
        let mut transport = 0.0;
        for (i, leg) in activity.transport.iter().enumerate() {
            transport += match leg.mode.unit_model() {
                UnitModel::TonneKm => {
                    let weight = leg
                        .weight_tonnes
                        .ok_or_else(|| CarbonError::missing_field(format!("activity.transport[{}].weight_tonnes", i)))?;
                    leg.distance_km * weight * leg.mode.factor()
                }
                UnitModel::PassengerKm => leg.distance_km * leg.mode.factor(),
            };
        }

        let waste: f64 = activity
            .waste
            .iter()
            .map(|stream| stream.tonnes * stream.method.factor())
            .sum();

        let commuting: f64 = activity
            .commuting
            .iter()
            .map(|c| f64::from(c.employees) * c.distance_km * f64::from(c.working_days) * c.mode.factor())
            .sum();

        Ok(ScopeResult::from_categories(BTreeMap::from([
            ("purchased_materials".to_string(), materials_a1_a3),
            ("upstream_transport".to_string(), transport),
            ("waste".to_string(), waste),
            ("employee_commuting".to_string(), commuting),
        ])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn assert_sums(result: &ScopeResult) {
        let sum: f64 = result.categories.values().sum();
        assert!((result.total - sum).abs() < 1e-6);
    }

    #[test]
    fn test_diesel_scenario() {
        let activity = ActivityData {
            stationary_fuels: vec![FuelUse::new("diesel", 5000.0)],
            ..Default::default()
        };
        let (scopes, warnings) = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::LocationBased, 0.0)
            .unwrap();

        assert_relative_eq!(scopes.scope1.category("stationary_combustion"), 13_400.0);
        assert!(warnings.is_empty());
        assert_sums(&scopes.scope1);
    }

    #[test]
    fn test_unknown_fuel_contributes_zero_with_warning() {
        let activity = ActivityData {
            stationary_fuels: vec![FuelUse::new("kerosene", 100.0), FuelUse::new("diesel", 10.0)],
            vehicles: vec![VehicleUse {
                description: "Site ute".to_string(),
                fuel: "kerosene".to_string(),
                fuel_consumed: 50.0,
            }],
            ..Default::default()
        };
        let (scopes, warnings) = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::LocationBased, 0.0)
            .unwrap();

        assert_relative_eq!(scopes.scope1.total, 26.8);
        assert_eq!(scopes.scope1.category("mobile_combustion"), 0.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), "MISSING_EMISSION_FACTOR");
    }

    #[test]
    fn test_custom_fuel_factor() {
        let extra = BTreeMap::from([("Kerosene".to_string(), 2.54)]);
        let aggregator = ScopesAggregator::new().with_fuel_factors(&extra);
        assert_eq!(aggregator.fuel_factor("kerosene"), Some(2.54));
        assert_eq!(aggregator.fuel_factor(" Diesel "), Some(2.68));
    }

    #[test]
    fn test_natural_gas_matches_operational_factor() {
        assert_eq!(ScopesAggregator::new().fuel_factor("natural_gas"), Some(NATURAL_GAS_FACTOR));
    }

    #[test]
    fn test_scope2_location_based() {
        let activity = ActivityData {
            purchased_electricity_kwh: 100_000.0,
            market_factor: Some(0.1),
            ..Default::default()
        };
        let (scopes, _) = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::LocationBased, 0.0)
            .unwrap();

        assert_relative_eq!(scopes.scope2.total, 68_000.0);
        assert_eq!(scopes.scope2_method, Scope2Method::LocationBased);
    }

    #[test]
    fn test_scope2_market_based() {
        let activity = ActivityData {
            purchased_electricity_kwh: 100_000.0,
            market_factor: Some(0.1),
            ..Default::default()
        };
        let (scopes, _) = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::MarketBased, 0.0)
            .unwrap();

        assert_relative_eq!(scopes.scope2.total, 10_000.0);
        assert_eq!(scopes.scope2_method, Scope2Method::MarketBased);
    }

    #[test]
    fn test_market_based_without_factor_fails() {
        let activity = ActivityData {
            purchased_electricity_kwh: 100_000.0,
            ..Default::default()
        };
        let err = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::MarketBased, 0.0)
            .unwrap_err();
        assert_eq!(err, CarbonError::missing_field("activity.market_factor"));
    }

    #[test]
    fn test_scope3_categories() {
        let activity = ActivityData {
            transport: vec![
                TransportLeg { mode: TransportMode::ArticulatedTruck, distance_km: 200.0, weight_tonnes: Some(30.0) },
                TransportLeg { mode: TransportMode::Flight, distance_km: 700.0, weight_tonnes: None },
            ],
            waste: vec![WasteStream { method: DisposalMethod::Landfill, tonnes: 10.0 }],
            commuting: vec![Commuting { employees: 20, distance_km: 30.0, working_days: 230, mode: TransportMode::Car }],
            ..Default::default()
        };
        let (scopes, _) = ScopesAggregator::new()
            .aggregate(&activity, 0.68, Scope2Method::LocationBased, 384_000.0)
            .unwrap();

        let scope3 = &scopes.scope3;
        assert_eq!(scope3.category("purchased_materials"), 384_000.0);
        assert_relative_eq!(scope3.category("upstream_transport"), 200.0 * 30.0 * 0.08 + 700.0 * 0.15);
        assert_relative_eq!(scope3.category("waste"), 4_700.0);
        assert_relative_eq!(scope3.category("employee_commuting"), 20.0 * 30.0 * 230.0 * 0.17);
        assert_sums(scope3);
    }

    #[test]
    fn test_freight_leg_requires_weight() {
        let activity = ActivityData {
            transport: vec![TransportLeg { mode: TransportMode::Rail, distance_km: 100.0, weight_tonnes: None }],
            ..Default::default()
        };
        assert!(activity.validate().is_err());
    }

    #[test]
    fn test_commuting_rejects_freight_mode() {
        let activity = ActivityData {
            commuting: vec![Commuting { employees: 5, distance_km: 10.0, working_days: 200, mode: TransportMode::Sea }],
            ..Default::default()
        };
        assert!(activity.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_scope_totals_equal_category_sums(
            diesel in 0.0f64..1e6,
            petrol in 0.0f64..1e6,
            kwh in 0.0f64..1e7,
            landfill in 0.0f64..1e4,
            km in 0.0f64..1e4,
            materials in 0.0f64..1e8,
        ) {
            let activity = ActivityData {
                stationary_fuels: vec![FuelUse::new("diesel", diesel)],
                vehicles: vec![VehicleUse { description: String::new(), fuel: "petrol".to_string(), fuel_consumed: petrol }],
                purchased_electricity_kwh: kwh,
                transport: vec![TransportLeg { mode: TransportMode::RigidTruck, distance_km: km, weight_tonnes: Some(12.0) }],
                waste: vec![WasteStream { method: DisposalMethod::Landfill, tonnes: landfill }],
                ..Default::default()
            };
            let (scopes, _) = ScopesAggregator::new()
                .aggregate(&activity, 0.79, Scope2Method::LocationBased, materials)
                .unwrap();

            for scope in [&scopes.scope1, &scopes.scope2, &scopes.scope3] {
                let sum: f64 = scope.categories.values().sum();
                prop_assert!((scope.total - sum).abs() < 1e-6);
            }
        }
    }
}
