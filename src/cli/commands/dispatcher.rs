//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::{PrereqError, Result};

use super::plan::PlanCommand;
use super::run::RunCommand;
use super::schema::SchemaCommand;

/// Exit code for a failed step or an unsatisfiable version plan.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a missing or invalid manifest.
pub const EXIT_MANIFEST: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Exit code for an error that escaped a command.
pub fn exit_code_for(error: &PrereqError) -> i32 {
    match error {
        PrereqError::ManifestNotFound { .. }
        | PrereqError::ManifestParseError { .. }
        | PrereqError::InvalidStep { .. }
        | PrereqError::InvalidVersion { .. } => EXIT_MANIFEST,
        _ => EXIT_FAILURE,
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    manifest: PathBuf,
}

impl CommandDispatcher {
    /// Create a dispatcher for the given manifest path.
    pub fn new(manifest: PathBuf) -> Self {
        Self { manifest }
    }

    /// Get the manifest path.
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Dispatch and execute a command.
    ///
    /// Without a subcommand, runs the manifest.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                RunCommand::new(&self.manifest, args.clone(), cli.quiet).execute()
            }
            Some(Commands::Plan(args)) => PlanCommand::new(&self.manifest, args.clone()).execute(),
            Some(Commands::Schema) => SchemaCommand.execute(),
            None => RunCommand::new(&self.manifest, RunArgs::default(), cli.quiet).execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versions::{Version, VersionConflict, VersionConstraint};

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(EXIT_MANIFEST);
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn manifest_errors_exit_with_2() {
        let err = PrereqError::ManifestNotFound {
            path: PathBuf::from("prereqs.yml"),
        };
        assert_eq!(exit_code_for(&err), EXIT_MANIFEST);

        let err = PrereqError::InvalidStep {
            step: "x".into(),
            message: "bad".into(),
        };
        assert_eq!(exit_code_for(&err), EXIT_MANIFEST);
    }

    #[test]
    fn run_errors_exit_with_1() {
        let err = PrereqError::StepFailed {
            step: "Install".into(),
            command: "false".into(),
            exit_code: Some(1),
            message: "'false' exited with code 1".into(),
        };
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);

        let constraint = VersionConstraint::new("node", Version::new(20));
        let conflict = VersionConflict::Incompatible {
            family: "node".into(),
            first: Box::new(constraint.clone()),
            second: Box::new(constraint),
        };
        assert_eq!(exit_code_for(&conflict.into()), EXIT_FAILURE);
    }

    #[test]
    fn dispatcher_keeps_manifest_path() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("tools.yml"));
        assert_eq!(dispatcher.manifest(), Path::new("tools.yml"));
    }
}
