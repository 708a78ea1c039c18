//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_MANIFEST;

/// prereqs - Install and verify development prerequisites with live progress.
#[derive(Debug, Parser)]
#[command(name = "prereqs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the manifest file
    #[arg(short, long, global = true, env = "PREREQS_MANIFEST", default_value = DEFAULT_MANIFEST)]
    pub config: PathBuf,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve versions and run every step (default if no command specified)
    Run(RunArgs),

    /// Show the resolved versions and the steps that would run
    Plan(PlanArgs),

    /// Print the JSON Schema for manifest files
    Schema,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Progress tick interval in milliseconds (overrides the manifest)
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}
