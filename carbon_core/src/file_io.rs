//! # File I/O Module
//!
//! Project and result files are JSON.
//!
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **Version validation**: project files carry a `schema_version`
//!
//! ## Example
//!
//! ```rust,no_run
//! use carbon_core::file_io::{load_project, save_result};
//! use carbon_core::engine::CarbonIntelligenceCore;
//! use std::path::Path;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let project = load_project(Path::new("tower.json")).unwrap();
//! let result = CarbonIntelligenceCore::builtin().calculate_project(&project).await.unwrap();
//! save_result(&result, Path::new("tower.result.json")).unwrap();
//! # });
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::{CarbonError, CarbonResult};
use crate::project::{Project, SCHEMA_VERSION};
use crate::results::ProjectResult;

/// Temp path next to the target: `name.ext.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Serialize to pretty JSON and write atomically.
///
/// 1. Write to a temporary file beside the target
/// 2. Sync to disk (fsync)
/// 3. Rename over the target
fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> CarbonResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CarbonError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CarbonError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CarbonError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .sync_all()
        .map_err(|e| CarbonError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CarbonError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Save a project with atomic write semantics.
pub fn save_project(project: &Project, path: &Path) -> CarbonResult<()> {
    write_json_atomic(project, path)
}

/// Save a calculation result with atomic write semantics.
pub fn save_result(result: &ProjectResult, path: &Path) -> CarbonResult<()> {
    write_json_atomic(result, path)?;
    tracing::debug!(path = %path.display(), "result saved");
    Ok(())
}

/// Parse a project from JSON and check its schema version.
pub fn parse_project(json: &str) -> CarbonResult<Project> {
    let project: Project = serde_json::from_str(json).map_err(|e| CarbonError::SerializationError {
        reason: format!("Invalid project JSON: {}", e),
    })?;
    validate_version(&project.schema_version)?;
    Ok(project)
}

/// Load a project from a file.
///
/// # Returns
///
/// * `Ok(Project)` - Successfully loaded project (not yet validated)
/// * `Err(CarbonError::VersionMismatch)` - File version is incompatible
/// * `Err(CarbonError::SerializationError)` - Invalid JSON
/// * `Err(CarbonError::FileError)` - I/O error
pub fn load_project(path: &Path) -> CarbonResult<Project> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CarbonError::file_error("read", path.display().to_string(), e.to_string()))?;

    parse_project(&contents).map_err(|e| match e {
        CarbonError::SerializationError { reason } => CarbonError::SerializationError {
            reason: format!("{} ({})", reason, path.display()),
        },
        other => other,
    })
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CarbonResult<()> {
    let mismatch = || CarbonError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // 0.x: files from a newer minor version are rejected
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CarbonIntelligenceCore;
    use crate::materials::MaterialCategory;
    use crate::project::{BuildingType, MaterialLineItem};
    use std::env::temp_dir;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("carbon_core_test_{}_{}.json", name, std::process::id()))
    }

    fn tower() -> Project {
        Project::new("Tower", "Melbourne", 5000.0, BuildingType::Office).with_material(MaterialLineItem::new(
            MaterialCategory::Steel,
            "steel-reinforcing",
            40.0,
            "t",
        ))
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(tmp_path_for(Path::new("/a/b/result.json")), Path::new("/a/b/result.json.tmp"));
    }

    #[test]
    fn test_save_and_load_project() {
        let path = temp_path("project");
        let project = tower();
        save_project(&project, &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
        assert!(!tmp_path_for(&path).exists());

        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_save_result_atomic() {
        let path = temp_path("result");
        let result = CarbonIntelligenceCore::builtin().calculate_project(&tower()).await.unwrap();

        save_result(&result, &path).unwrap();
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());

        let json = fs::read_to_string(&path).unwrap();
        let reloaded: ProjectResult = serde_json::from_str(&json).unwrap();
        assert!(reloaded.same_outcome(&result));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_project(Path::new("/nonexistent/carbon/project.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_parse_minimal_project_applies_defaults() {
        let json = r#"{
            "name": "Warehouse",
            "location": { "city": "Perth" },
            "gross_floor_area_m2": 2500.0,
            "building_type": "industrial",
            "materials": [
                { "category": "concrete", "material_type": "concrete-25mpa", "quantity": 300.0, "unit": "m3" }
            ]
        }"#;
        let project = parse_project(json).unwrap();

        assert_eq!(project.design_life_years, 50);
        assert_eq!(project.schema_version, SCHEMA_VERSION);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
