//! Manifest loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File loading and JSON Schema generation in [`loader`]
//!
//! # Example
//!
//! ```
//! use prereqs::config::{load_manifest, ProgressStrategy};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("prereqs.yml");
//! fs::write(&path, "steps:\n  - name: Check node\n    commands: [node --version]\n").unwrap();
//!
//! let manifest = load_manifest(&path).unwrap();
//! assert_eq!(manifest.steps[0].strategy, ProgressStrategy::Immediate);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    load_manifest, manifest_schema, parse_manifest, parse_manifest_json, DEFAULT_MANIFEST,
};
pub use schema::{InstallManifest, InstallStep, Milestone, ProgressStrategy, Settings};
