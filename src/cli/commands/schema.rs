//! Schema command implementation.

use crate::config::manifest_schema;
use crate::error::{PrereqError, Result};

use super::dispatcher::{Command, CommandResult};

/// Prints the manifest JSON Schema, for editor integration.
pub struct SchemaCommand;

impl Command for SchemaCommand {
    fn execute(&self) -> Result<CommandResult> {
        let schema = serde_json::to_string_pretty(&manifest_schema())
            .map_err(|e| PrereqError::Other(e.into()))?;
        println!("{}", schema);
        Ok(CommandResult::success())
    }
}
