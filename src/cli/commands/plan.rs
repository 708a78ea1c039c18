//! Plan command implementation.
//!
//! The `prereqs plan` command resolves versions and lists the step
//! invocations a run would execute, without running anything.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::PlanArgs;
use crate::config::{load_manifest, InstallManifest};
use crate::error::{PrereqError, Result};
use crate::runner::Orchestrator;
use crate::steps::resolve_commands;
use crate::ui::PrereqTheme;
use crate::versions::VersionPlan;

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE, EXIT_MANIFEST};

/// One planned step invocation.
#[derive(Debug, Serialize)]
pub struct PlannedStep {
    pub name: String,
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub commands: Vec<String>,
}

/// A resolved plan and the steps it expands to.
#[derive(Debug, Serialize)]
pub struct PlanView {
    pub versions: VersionPlan,
    pub steps: Vec<PlannedStep>,
}

impl PlanView {
    /// Resolve `manifest` into a plan view.
    pub fn build(manifest: &InstallManifest) -> Result<Self> {
        let versions = manifest.resolver().resolve(&manifest.constraints)?;
        let steps = Orchestrator::invocations(&versions, &manifest.steps)
            .into_iter()
            .map(|invocation| {
                let version = invocation.version.map(|v| v.to_string());
                PlannedStep {
                    name: invocation.display_name(),
                    strategy: invocation.step.strategy.to_string(),
                    family: invocation.family.clone(),
                    commands: resolve_commands(invocation.step, version.as_deref())
                        .into_iter()
                        .map(|c| c.command)
                        .collect(),
                    version,
                }
            })
            .collect();
        Ok(Self { versions, steps })
    }

    /// Human-readable rendering.
    pub fn render(&self, theme: &PrereqTheme) -> String {
        let mut out = String::new();
        out.push_str(&theme.format_header("Versions"));
        out.push('\n');
        if self.versions.is_empty() {
            out.push_str(&format!("  {}\n", theme.dim.apply_to("(none)")));
        }
        for (family, version) in self.versions.iter() {
            out.push_str(&format!("  {} {}\n", theme.key.apply_to(family), version));
        }

        out.push('\n');
        out.push_str(&theme.format_header("Steps"));
        out.push('\n');
        let count = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            out.push_str(&format!(
                "  {} {} {}\n",
                theme.format_counter(index, count),
                step.name,
                theme.dim.apply_to(format!("({})", step.strategy))
            ));
            if step.commands.is_empty() {
                out.push_str(&format!("      {}\n", theme.dim.apply_to("nothing to run")));
            }
            for command in &step.commands {
                out.push_str(&format!("      {}\n", theme.dim.apply_to(command)));
            }
        }
        out
    }
}

/// The plan command implementation.
pub struct PlanCommand {
    manifest: PathBuf,
    args: PlanArgs,
}

impl PlanCommand {
    pub fn new(manifest: &Path, args: PlanArgs) -> Self {
        Self {
            manifest: manifest.to_path_buf(),
            args,
        }
    }
}

impl Command for PlanCommand {
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

        let view = match PlanView::build(&manifest) {
            Ok(view) => view,
            Err(e @ PrereqError::VersionConflict(_)) => {
                eprintln!("{}", theme.format_error(&e.to_string()));
                return Ok(CommandResult::failure(EXIT_FAILURE));
            }
            Err(e) => return Err(e),
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&view)
                .map_err(|e| PrereqError::Other(e.into()))?;
            println!("{}", json);
        } else {
            print!("{}", view.render(&theme));
        }
        Ok(CommandResult::success())
    }
}
