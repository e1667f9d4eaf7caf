//! # carbon_core - Building Life-Cycle Carbon Engine
//!
//! `carbon_core` computes a building project's life-cycle carbon footprint from
//! a bill of materials and an energy profile, reports it under GHG Protocol
//! scopes, checks it against climate-zone thresholds and ranks reduction
//! measures. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Injected collaborators**: coefficient source, regional adjuster and
//!   checkers are built by the caller and passed in
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Observable fallbacks**: every default applied is reported as a warning
//!
//! ## Quick Start
//!
//! ```rust
//! use carbon_core::engine::CarbonIntelligenceCore;
//! use carbon_core::materials::MaterialCategory;
//! use carbon_core::project::{BuildingType, MaterialLineItem, Project};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let project = Project::new("Library", "Canberra", 4_000.0, BuildingType::Education)
//!     .with_material(MaterialLineItem::new(MaterialCategory::Timber, "timber-clt", 600.0, "m3"));
//!
//! let result = CarbonIntelligenceCore::builtin().calculate_project(&project).await.unwrap();
//! println!("{}", result.summary());
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - Pipeline entry points
//! - [`project`] - Project submission types
//! - [`materials`] - Categories, coefficients, materials table and lookup chain
//! - [`regional`] - Climate zones, grid and transport factors, suppliers
//! - [`lifecycle`] - EN 15978 stage breakdown
//! - [`scopes`] - GHG Protocol scope 1/2/3 aggregation
//! - [`compliance`] - Section J style checks and star rating
//! - [`optimization`] - Ranked reduction recommendations
//! - [`results`] - Final report assembly
//! - [`config`] - Run configuration (TOML)
//! - [`errors`] - Structured error and warning types
//! - [`file_io`] - JSON project/result files with atomic saves

pub mod compliance;
pub mod config;
pub mod engine;
pub mod errors;
pub mod file_io;
pub mod lifecycle;
pub mod materials;
pub mod optimization;
pub mod project;
pub mod regional;
pub mod results;
pub mod scopes;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use compliance::{BuildingPerformance, ComplianceResult};
pub use config::CarbonConfig;
pub use engine::{check_ncc_compliance, CarbonIntelligenceCore};
pub use errors::{CalcWarning, CarbonError, CarbonResult};
pub use file_io::{load_project, save_result};
pub use project::{BuildingType, MaterialLineItem, Project};
pub use results::ProjectResult;
