//! Manifest schema definitions.
//!
//! This module contains the struct definitions that map to the YAML (or
//! JSON) manifest format: global settings, version constraints, optional
//! version catalogs, and the ordered install steps.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PrereqError, Result};
use crate::shell::CommandOptions;
use crate::versions::{Version, VersionConstraint, VersionResolver};

/// Root structure of a prerequisites manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InstallManifest {
    /// Global settings
    pub settings: Settings,

    /// Version requirements, grouped by family
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<VersionConstraint>,

    /// Installable versions per family; families without an entry resolve
    /// straight from their constraints
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub available: BTreeMap<String, Vec<Version>>,

    /// Steps, in execution order
    pub steps: Vec<InstallStep>,
}

impl InstallManifest {
    /// Validate every step.
    pub fn validate(&self) -> Result<()> {
        self.steps.iter().try_for_each(InstallStep::validate)
    }

    /// Resolver restricted to the manifest's version catalogs.
    pub fn resolver(&self) -> VersionResolver {
        self.available
            .iter()
            .fold(VersionResolver::new(), |resolver, (family, versions)| {
                resolver.with_available(family.clone(), versions.iter().copied())
            })
    }
}

impl Settings {
    /// Command options for every step, with `working_dir` taken relative
    /// to `base` when it is not absolute.
    pub fn command_options(&self, base: &Path) -> CommandOptions {
        CommandOptions {
            cwd: self.working_dir.as_ref().map(|dir| base.join(dir)),
            env: self.env.clone(),
        }
    }
}

/// Global settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Interval between progress ticks while a command runs
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Elapsed time after which progress text shows a running timer
    #[serde(default = "default_elapsed_threshold_secs")]
    pub elapsed_threshold_secs: u64,

    /// Environment variables for every command
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Working directory for every command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            elapsed_threshold_secs: default_elapsed_threshold_secs(),
            env: HashMap::new(),
            working_dir: None,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_elapsed_threshold_secs() -> u64 {
    30
}

/// How a step reports progress while its command runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStrategy {
    /// Percentages parsed from the command's own output
    Exact,
    /// Fixed percentages reached when marker text appears in output
    Milestones,
    /// Linear estimate against `estimated_duration_ms`, capped below 100
    Synthetic,
    /// No intermediate progress; complete when the command exits
    #[default]
    Immediate,
}

impl std::fmt::Display for ProgressStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProgressStrategy::Exact => "exact",
            ProgressStrategy::Milestones => "milestones",
            ProgressStrategy::Synthetic => "synthetic",
            ProgressStrategy::Immediate => "immediate",
        };
        write!(f, "{}", s)
    }
}

/// Marker text that moves progress to a fixed percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Milestone {
    /// Substring to look for in output lines
    pub pattern: String,

    /// Progress once the marker is seen
    pub percent: u8,

    /// Status text to show once the marker is seen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One unit of prerequisite work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InstallStep {
    /// Display name; `{version}` is replaced with the step's version
    pub name: String,

    /// Status text shown while the step runs; `{version}` is replaced
    pub message: String,

    /// Progress reporting strategy
    pub strategy: ProgressStrategy,

    /// Static command lines, run in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,

    /// Single command line that may contain `{version}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,

    /// Expected duration in milliseconds (required for `synthetic`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration_ms: Option<u64>,

    /// Markers for the `milestones` strategy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,

    /// Regex whose first capture group is a percentage (for `exact`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_pattern: Option<String>,

    /// Family selector; the step runs once per matching family in the plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl InstallStep {
    /// Create a step with a name and status message.
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: ProgressStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_commands(mut self, commands: &[&str]) -> Self {
        self.commands = commands.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.command_template = Some(template.to_string());
        self
    }

    pub fn with_estimate(mut self, estimate: Duration) -> Self {
        self.estimated_duration_ms = Some(estimate.as_millis() as u64);
        self
    }

    pub fn with_milestone(mut self, pattern: &str, percent: u8) -> Self {
        self.milestones.push(Milestone {
            pattern: pattern.to_string(),
            percent,
            message: None,
        });
        self
    }

    pub fn with_family(mut self, selector: &str) -> Self {
        self.family = Some(selector.to_string());
        self
    }

    /// Estimated duration as a `Duration`.
    pub fn estimated_duration(&self) -> Option<Duration> {
        self.estimated_duration_ms.map(Duration::from_millis)
    }

    /// Check the step can be executed with its declared strategy.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| PrereqError::InvalidStep {
            step: self.name.clone(),
            message,
        };

        match self.strategy {
            ProgressStrategy::Synthetic => {
                if self.estimated_duration_ms.unwrap_or(0) == 0 {
                    return Err(invalid(
                        "synthetic strategy needs a positive estimated_duration_ms".to_string(),
                    ));
                }
            }
            ProgressStrategy::Milestones => {
                if self.milestones.is_empty() {
                    return Err(invalid(
                        "milestones strategy needs at least one milestone".to_string(),
                    ));
                }
                let mut previous: Option<u8> = None;
                for milestone in &self.milestones {
                    if milestone.pattern.is_empty() {
                        return Err(invalid("milestone pattern is empty".to_string()));
                    }
                    if milestone.percent > 100 {
                        return Err(invalid(format!(
                            "milestone '{}' is above 100%",
                            milestone.pattern
                        )));
                    }
                    if previous.is_some_and(|p| milestone.percent <= p) {
                        return Err(invalid(format!(
                            "milestone '{}' does not advance progress",
                            milestone.pattern
                        )));
                    }
                    previous = Some(milestone.percent);
                }
            }
            ProgressStrategy::Exact => {
                if let Some(pattern) = &self.progress_pattern {
                    let regex = regex::Regex::new(pattern)
                        .map_err(|e| invalid(format!("invalid progress_pattern: {}", e)))?;
                    if regex.captures_len() < 2 {
                        return Err(invalid(
                            "progress_pattern needs a capture group for the percentage"
                                .to_string(),
                        ));
                    }
                }
            }
            ProgressStrategy::Immediate => {}
        }

        Ok(())
    }
}
