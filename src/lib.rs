//! prereqs - Install and verify development prerequisites with live progress.
//!
//! Steps are declared in a YAML manifest, resolved against version
//! constraints, and run as shell commands while a progress estimator turns
//! opaque process activity into a steady percentage.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Manifest loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`progress`] - Progress updates and estimation strategies
//! - [`runner`] - Orchestration of step invocations across a version plan
//! - [`shell`] - Process runners, real and scripted
//! - [`steps`] - Command templates and step execution
//! - [`timer`] - Timer sources, real and virtual
//! - [`ui`] - Terminal rendering
//! - [`versions`] - Version parsing and constraint resolution
//!
//! # Example
//!
//! ```
//! use prereqs::versions::{resolve_plan, Version, VersionConstraint};
//!
//! let constraints = vec![
//!     VersionConstraint::new("node", Version::new(18)).with_preferred(Version::new(20)),
//!     VersionConstraint::new("node", Version::new(16)).with_max(Version::new(20)),
//! ];
//! let plan = resolve_plan(&constraints).unwrap();
//! assert_eq!(plan.get("node").unwrap().to_string(), "20");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod timer;
pub mod ui;
pub mod versions;

pub use error::{PrereqError, Result};
