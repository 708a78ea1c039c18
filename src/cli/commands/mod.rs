//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! dispatched via [`CommandDispatcher`].

pub mod dispatcher;
pub mod plan;
pub mod run;
pub mod schema;

pub use dispatcher::{exit_code_for, Command, CommandDispatcher, CommandResult};
