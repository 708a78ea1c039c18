//! Run command implementation.
//!
//! The `prereqs run` command resolves the manifest's version plan and
//! executes every step with live progress.

use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::load_manifest;
use crate::error::{PrereqError, Result};
use crate::progress::{NullSink, ProgressSink};
use crate::runner::Orchestrator;
use crate::shell::ShellRunner;
use crate::steps::{ExecutorSettings, StepExecutor};
use crate::timer::SystemTimer;
use crate::ui::{PrereqTheme, ProgressRenderer};

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE, EXIT_MANIFEST};

/// The run command implementation.
pub struct RunCommand {
    manifest: PathBuf,
    args: RunArgs,
    quiet: bool,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(manifest: &Path, args: RunArgs, quiet: bool) -> Self {
        Self {
            manifest: manifest.to_path_buf(),
            args,
            quiet,
        }
    }
}

impl Command for RunCommand {
    fn execute(&self) -> Result<CommandResult> {
        let theme = PrereqTheme::detect();

        let manifest = match load_manifest(&self.manifest) {
            Ok(m) => m,
            Err(PrereqError::ManifestNotFound { path }) => {
                eprintln!(
                    "{}",
                    theme.format_error(&format!("No manifest found at {}", path.display()))
                );
                return Ok(CommandResult::failure(EXIT_MANIFEST));
            }
            Err(e) => return Err(e),
        };

        let mut settings = ExecutorSettings::from(&manifest.settings);
        if let Some(ms) = self.args.tick_ms {
            settings.tick_interval = std::time::Duration::from_millis(ms.max(1));
        }
        let base = self
            .manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let runner = ShellRunner::new();
        let timer = SystemTimer::new();
        let orchestrator = Orchestrator::new(StepExecutor::with_settings(&runner, &timer, settings))
            .with_resolver(manifest.resolver())
            .with_options(manifest.settings.command_options(&base));

        let mut renderer;
        let mut null = NullSink;
        let sink: &mut dyn ProgressSink = if self.quiet {
            &mut null
        } else {
            renderer = ProgressRenderer::new(theme.clone());
            &mut renderer
        };

        match orchestrator.run_constraints(&manifest.constraints, &manifest.steps, sink) {
            Ok(report) => {
                if !self.quiet {
                    let mut summary = format!("{} step(s) completed", report.completed());
                    if report.skipped() > 0 {
                        summary.push_str(&format!(", {} skipped", report.skipped()));
                    }
                    println!("{}", theme.format_success(&summary));
                }
                Ok(CommandResult::success())
            }
            Err(e @ (PrereqError::StepFailed { .. } | PrereqError::VersionConflict(_))) => {
                eprintln!("{}", theme.format_error(&e.to_string()));
                Ok(CommandResult::failure(EXIT_FAILURE))
            }
            Err(e) => Err(e),
        }
    }
}
