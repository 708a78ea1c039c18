//! Command template resolution.
//!
//! Turns a step definition plus an optional version into the concrete
//! command lines to run. A template that needs a version it was not given
//! resolves to nothing: a command never runs with `{version}` still in it.

use crate::config::InstallStep;

/// Placeholder replaced with the step's version.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// A concrete command line ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
}

impl ResolvedCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.command
    }
}

impl std::fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)
    }
}

/// Resolve the commands `step` runs for `version`.
///
/// Static `commands` win over `command_template` and are returned as-is.
pub fn resolve_commands(step: &InstallStep, version: Option<&str>) -> Vec<ResolvedCommand> {
    if !step.commands.is_empty() {
        return step.commands.iter().map(ResolvedCommand::new).collect();
    }

    let Some(template) = step.command_template.as_deref().filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    if !template.contains(VERSION_PLACEHOLDER) {
        return vec![ResolvedCommand::new(template)];
    }

    match version {
        Some(version) => vec![ResolvedCommand::new(
            template.replace(VERSION_PLACEHOLDER, version),
        )],
        None => Vec::new(),
    }
}

/// Replace `{version}` in display text. Without a version the text is
/// returned unchanged.
pub fn substitute_version(text: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => text.replace(VERSION_PLACEHOLDER, version),
        None => text.to_string(),
    }
}
