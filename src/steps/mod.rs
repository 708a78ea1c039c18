//! Step resolution and execution.
//!
//! - [`resolve_commands`] - Turn a step and an optional version into command lines
//! - [`StepExecutor`] - Run a step's commands and report progress
//! - [`StepOutcome`] - Capture execution results
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use prereqs::config::{InstallStep, ProgressStrategy};
//! use prereqs::progress::UnifiedProgress;
//! use prereqs::shell::{MockRunner, ScriptedCommand};
//! use prereqs::steps::{StepContext, StepExecutor};
//! use prereqs::timer::MockTimer;
//!
//! let timer = MockTimer::new();
//! let runner = MockRunner::new(timer.clone());
//! runner.script("fnm install 20", ScriptedCommand::exits_after(Duration::from_secs(3)));
//!
//! let step = InstallStep::new("Node {version}", "Installing Node {version}")
//!     .with_strategy(ProgressStrategy::Synthetic)
//!     .with_estimate(Duration::from_secs(10))
//!     .with_template("fnm install {version}");
//!
//! let executor = StepExecutor::new(&runner, &timer);
//! let mut percents = Vec::new();
//! executor
//!     .execute_step(
//!         &step,
//!         0,
//!         1,
//!         &mut |u: &UnifiedProgress| percents.push(u.step_percent),
//!         &StepContext::with_version("20"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(percents, vec![0, 10, 20, 100]);
//! ```

pub mod executor;
pub mod template;

pub use executor::{ExecutorSettings, StepContext, StepExecutor, StepOutcome};
pub use template::{resolve_commands, substitute_version, ResolvedCommand, VERSION_PLACEHOLDER};
