//! # Error Types
//!
//! Structured error and warning types for carbon_core. Errors are fatal for
//! the run that raised them; warnings are non-fatal decisions (fallbacks,
//! skipped factors) that travel alongside a successful result.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::errors::{CarbonError, CarbonResult};
//!
//! fn validate_floor_area(gfa_m2: f64) -> CarbonResult<()> {
//!     if gfa_m2 <= 0.0 {
//!         return Err(CarbonError::InvalidInput {
//!             field: "gross_floor_area_m2".to_string(),
//!             value: gfa_m2.to_string(),
//!             reason: "Floor area must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for carbon_core operations
pub type CarbonResult<T> = Result<T, CarbonError>;

/// Pipeline stage names, carried by [`CarbonError::Calculation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    RegionalEnrichment,
    CoefficientResolution,
    LifecycleStages,
    Aggregation,
    Scopes,
    Compliance,
    Optimization,
    Compilation,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::RegionalEnrichment => "regional_enrichment",
            PipelineStage::CoefficientResolution => "coefficient_resolution",
            PipelineStage::LifecycleStages => "lifecycle_stages",
            PipelineStage::Aggregation => "aggregation",
            PipelineStage::Scopes => "scopes",
            PipelineStage::Compliance => "compliance",
            PipelineStage::Optimization => "optimization",
            PipelineStage::Compilation => "compilation",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Structured error type for carbon calculations.
///
/// Each variant provides specific context about what went wrong,
/// enabling programmatic error handling by callers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CarbonError {
    /// An input value is invalid (out of range, non-finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No coefficient could be resolved for a material key
    #[error("No carbon coefficient for material '{category}/{material_type}'")]
    MissingCoefficient {
        category: String,
        material_type: String,
    },

    /// A line item's unit does not match the unit of its coefficient
    #[error("Unit mismatch for '{material_type}': line item uses '{item_unit}', coefficient is per '{coefficient_unit}'")]
    UnitMismatch {
        material_type: String,
        item_unit: String,
        coefficient_unit: String,
    },

    /// An external coefficient provider failed
    #[error("Coefficient provider '{provider}' failed: {reason}")]
    ProviderFailed { provider: String, reason: String },

    /// A pipeline stage failed; wraps the underlying error
    #[error("Calculation failed for project {project_id} during {stage}: {source}")]
    Calculation {
        project_id: String,
        stage: PipelineStage,
        #[source]
        source: Box<CarbonError>,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON / TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CarbonError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CarbonError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CarbonError::MissingField {
            field: field.into(),
        }
    }

    /// Create a MissingCoefficient error
    pub fn missing_coefficient(category: impl Into<String>, material_type: impl Into<String>) -> Self {
        CarbonError::MissingCoefficient {
            category: category.into(),
            material_type: material_type.into(),
        }
    }

    /// Create a ProviderFailed error
    pub fn provider_failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        CarbonError::ProviderFailed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error as a stage failure for the given project
    pub fn calculation(project_id: impl Into<String>, stage: PipelineStage, source: CarbonError) -> Self {
        CarbonError::Calculation {
            project_id: project_id.into(),
            stage,
            source: Box::new(source),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CarbonError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CarbonError::Internal {
            message: message.into(),
        }
    }

    /// True for errors raised by input validation before any calculation.
    pub fn is_validation(&self) -> bool {
        matches!(self, CarbonError::InvalidInput { .. } | CarbonError::MissingField { .. })
    }

    /// Follow `Calculation` wrappers down to the original error.
    pub fn root_cause(&self) -> &CarbonError {
        match self {
            CarbonError::Calculation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CarbonError::InvalidInput { .. } => "INVALID_INPUT",
            CarbonError::MissingField { .. } => "MISSING_FIELD",
            CarbonError::MissingCoefficient { .. } => "MISSING_COEFFICIENT",
            CarbonError::UnitMismatch { .. } => "UNIT_MISMATCH",
            CarbonError::ProviderFailed { .. } => "PROVIDER_FAILED",
            CarbonError::Calculation { .. } => "CALCULATION_FAILED",
            CarbonError::FileError { .. } => "FILE_ERROR",
            CarbonError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CarbonError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CarbonError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Non-fatal conditions recorded on a result.
///
/// Every default the pipeline falls back to is reported here rather than
/// applied silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum CalcWarning {
    /// The project location could not be resolved and a default was used
    RegionalFallback {
        location: String,
        state: String,
        climate_zone: u8,
        reason: String,
    },

    /// No emission factor is known for a fuel; it contributed zero
    MissingEmissionFactor { fuel: String, scope: u8 },

    /// Building type has no tabulated profile; the default profile was used
    DefaultBuildingProfile {
        building_type: String,
        profile: String,
    },

    /// Standalone compliance input failed validation but was graded anyway
    InvalidPerformanceData { field: String, reason: String },
}

impl CalcWarning {
    /// Short code, mirroring [`CarbonError::error_code`]
    pub fn code(&self) -> &'static str {
        match self {
            CalcWarning::RegionalFallback { .. } => "REGIONAL_FALLBACK",
            CalcWarning::MissingEmissionFactor { .. } => "MISSING_EMISSION_FACTOR",
            CalcWarning::DefaultBuildingProfile { .. } => "DEFAULT_BUILDING_PROFILE",
            CalcWarning::InvalidPerformanceData { .. } => "INVALID_PERFORMANCE_DATA",
        }
    }
}

impl std::fmt::Display for CalcWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcWarning::RegionalFallback { location, state, climate_zone, reason } => write!(
                f,
                "Location '{}' resolved to {} climate zone {} ({})",
                location, state, climate_zone, reason
            ),
            CalcWarning::MissingEmissionFactor { fuel, scope } => {
                write!(f, "No scope {} emission factor for fuel '{}'; counted as zero", scope, fuel)
            }
            CalcWarning::DefaultBuildingProfile { building_type, profile } => {
                write!(f, "Building type '{}' has no profile; using '{}'", building_type, profile)
            }
            CalcWarning::InvalidPerformanceData { field, reason } => {
                write!(f, "Performance data '{}' is invalid ({}); graded as submitted", field, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CarbonError::invalid_input("gross_floor_area_m2", "-5.0", "Floor area must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CarbonError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CarbonError::missing_field("materials").error_code(), "MISSING_FIELD");
        assert_eq!(
            CarbonError::missing_coefficient("steel", "steel-unobtainium").error_code(),
            "MISSING_COEFFICIENT"
        );
    }

    #[test]
    fn test_calculation_wraps_root_cause() {
        let missing = CarbonError::missing_coefficient("concrete", "concrete-99mpa");
        let wrapped = CarbonError::calculation("P-1", PipelineStage::CoefficientResolution, missing.clone());

        assert_eq!(wrapped.error_code(), "CALCULATION_FAILED");
        assert_eq!(wrapped.root_cause(), &missing);
        assert!(wrapped.to_string().contains("coefficient_resolution"));
        assert!(wrapped.to_string().contains("concrete-99mpa"));
        assert!(!wrapped.is_validation());
    }

    #[test]
    fn test_missing_coefficient_names_key() {
        let err = CarbonError::missing_coefficient("steel", "steel-unobtainium");
        assert_eq!(err.to_string(), "No carbon coefficient for material 'steel/steel-unobtainium'");
    }

    #[test]
    fn test_warning_codes() {
        let warning = CalcWarning::MissingEmissionFactor {
            fuel: "kerosene".to_string(),
            scope: 1,
        };
        assert_eq!(warning.code(), "MISSING_EMISSION_FACTOR");
        assert!(warning.to_string().contains("kerosene"));
    }
}
