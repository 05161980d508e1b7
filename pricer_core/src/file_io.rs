//! # File I/O Module
//!
//! Reads and writes pricing configuration documents and job records.
//!
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target, so a
//!   storefront reading the file never sees half a document
//! - **Lenient loads**: documents go through [`PricingConfig::from_value`]
//! - **Version validation**: a document written by a newer, incompatible
//!   schema is rejected instead of being misread
//!
//! ## Example
//!
//! ```rust,no_run
//! use pricer_core::config::PricingConfig;
//! use pricer_core::file_io::{load_config, save_config};
//! use std::path::Path;
//!
//! let path = Path::new("pricing.json");
//! save_config(&PricingConfig::default(), path)?;
//!
//! let config = load_config(path)?;
//! assert_eq!(config.rules.rate_per_hour, 150.0);
//! # Ok::<(), pricer_core::errors::PricingError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{PricingConfig, SCHEMA_VERSION};
use crate::errors::{PricingError, PricingResult};
use crate::job::JobInput;

/// Save a configuration document with atomic write semantics.
///
/// 1. Serialize to pretty JSON
/// 2. Write to `<path>.tmp`
/// 3. Sync to disk
/// 4. Rename over `path`
pub fn save_config(config: &PricingConfig, path: &Path) -> PricingResult<()> {
    let json = serde_json::to_string_pretty(config)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        PricingError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        PricingError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        PricingError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PricingError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "pricing config saved");
    Ok(())
}

/// Load a configuration document.
///
/// # Returns
///
/// * `Ok(PricingConfig)` - resolved document; bad fields took defaults
/// * `Err(PricingError::VersionMismatch)` - written by an incompatible schema
/// * `Err(PricingError::SerializationError)` - not JSON at all
/// * `Err(PricingError::FileError)` - I/O error
pub fn load_config(path: &Path) -> PricingResult<PricingConfig> {
    let raw = read_json(path)?;
    if let Some(version) = raw.get("version").and_then(Value::as_str) {
        validate_version(version)?;
    }
    Ok(PricingConfig::from_value(&raw))
}

/// Load a job record; fails when a required field is missing.
pub fn load_job(path: &Path) -> PricingResult<JobInput> {
    JobInput::from_value(&read_json(path)?)
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> PricingResult<Value> {
    let mut file = File::open(path)
        .map_err(|e| PricingError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| PricingError::file_error("read", path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| PricingError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// `pricing.json` -> `pricing.json.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Check that a document version is readable by this schema.
///
/// Major versions must match. On 0.x the document's minor version may not
/// be newer than ours.
pub fn validate_version(file_version: &str) -> PricingResult<()> {
    let mismatch = || PricingError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.trim().parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }

    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_path(name: &str) -> PathBuf {
        temp_dir().join(format!("pricer_test_{}.json", name))
    }

    #[test]
    fn test_tmp_path_generation() {
        assert_eq!(
            tmp_path_for(Path::new("/etc/pricer/pricing.json")),
            Path::new("/etc/pricer/pricing.json.tmp")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip");
        let mut config = PricingConfig::default();
        config.rules.rate_per_hour = 175.0;
        config.rules.rounding.enabled = true;

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_path("atomic");
        save_config(&PricingConfig::default(), &path).unwrap();

        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_admin_document_without_version() {
        let path = temp_path("admin_doc");
        fs::write(&path, r#"{ "materialPrices": { "pla": 0.45 }, "tenant_pricing": { "rate_per_hour": "130" } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.material_prices.price_per_gram("pla"), 0.45);
        assert_eq!(config.rules.rate_per_hour, 130.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let path = temp_path("newer");
        fs::write(&path, r#"{ "version": "0.9.0" }"#).unwrap();

        let err = load_config(&path).unwrap_err();
        assert_eq!(err.error_code(), "VERSION_MISMATCH");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_errors() {
        let missing = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(missing.error_code(), "FILE_ERROR");

        let path = temp_path("not_json");
        fs::write(&path, "material_grams = 10").unwrap();
        assert_eq!(load_config(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_job() {
        let path = temp_path("job");
        fs::write(&path, r#"{ "material": "petg", "material_grams": 12, "print_time_seconds": 600 }"#).unwrap();
        assert_eq!(load_job(&path).unwrap().material, "petg");

        fs::write(&path, r#"{ "material": "petg" }"#).unwrap();
        assert_eq!(load_job(&path).unwrap_err().error_code(), "MISSING_FIELD");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.0.5").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
