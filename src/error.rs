//! Error types for prerequisite operations.
//!
//! This module defines [`PrereqError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `PrereqError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `PrereqError::Other`) for unexpected errors
//! - Step failures carry the step name and exit code so the host can render them
//! - Template/version mismatches are not errors: they resolve to zero commands

use std::path::PathBuf;
use thiserror::Error;

use crate::versions::VersionConflict;

/// Core error type for prerequisite operations.
#[derive(Debug, Error)]
pub enum PrereqError {
    /// Manifest file not found at expected location.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// Failed to parse manifest file.
    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParseError { path: PathBuf, message: String },

    /// A step definition cannot be executed as declared.
    #[error("Invalid step '{step}': {message}")]
    InvalidStep { step: String, message: String },

    /// A version string could not be parsed.
    #[error("Invalid version: '{value}'")]
    InvalidVersion { value: String },

    /// Version requirements cannot be satisfied together.
    #[error(transparent)]
    VersionConflict(#[from] VersionConflict),

    /// The process runner could not start a command.
    #[error("Failed to start command '{command}': {message}")]
    SpawnFailed { command: String, message: String },

    /// A step's command failed or could not be started.
    #[error("Step '{step}' failed: {message}")]
    StepFailed {
        step: String,
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrereqError {
    /// Exit code of the failed command, if the error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            PrereqError::StepFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

/// Result type alias for prerequisite operations.
pub type Result<T> = std::result::Result<T, PrereqError>;
