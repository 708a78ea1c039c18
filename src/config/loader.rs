//! Manifest loading.
//!
//! Manifests are YAML by default. Files with a `.json` extension are parsed
//! as JSON; serde_yaml would accept most of them too, but its error
//! messages point at the wrong constructs for JSON input.

use crate::config::schema::InstallManifest;
use crate::error::{PrereqError, Result};
use std::fs;
use std::path::Path;

/// Default manifest file name, looked up in the working directory.
pub const DEFAULT_MANIFEST: &str = "prereqs.yml";

/// Load, parse, and validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<InstallManifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PrereqError::ManifestNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PrereqError::Io(e)
        }
    })?;

    let manifest = if is_json(path) {
        parse_manifest_json(&content, path)?
    } else {
        parse_manifest(&content, path)?
    };
    manifest.validate()?;
    Ok(manifest)
}

/// Parse YAML content into an `InstallManifest`.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_manifest(content: &str, source_path: &Path) -> Result<InstallManifest> {
    serde_yaml::from_str(content).map_err(|e| PrereqError::ManifestParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse JSON content into an `InstallManifest`.
pub fn parse_manifest_json(content: &str, source_path: &Path) -> Result<InstallManifest> {
    serde_json::from_str(content).map_err(|e| PrereqError::ManifestParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// JSON Schema for the manifest format.
pub fn manifest_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(InstallManifest);
    schema.to_value()
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
