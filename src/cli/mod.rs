//! Command-line interface.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, PlanArgs, RunArgs};
pub use commands::{exit_code_for, Command, CommandDispatcher, CommandResult};
