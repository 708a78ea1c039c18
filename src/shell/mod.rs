//! Command execution.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    CommandOptions, OutputLine, ProcessEvent, ProcessRunner, RunningProcess, ShellRunner,
};
pub use mock::{MockRunner, ScriptedCommand};
pub use platform::{is_ci, shell_executable, shell_flag, ShellType};
