//! Runtime version resolution.
//!
//! Decides which concrete runtime versions an installation run needs.
//!
//! # Modules
//!
//! - [`version`] - Dotted numeric runtime versions
//! - [`constraint`] - Per-family version constraints
//! - [`resolver`] - Constraint resolution into a [`VersionPlan`]

pub mod constraint;
pub mod resolver;
pub mod version;

pub use constraint::VersionConstraint;
pub use resolver::{resolve_plan, VersionConflict, VersionPlan, VersionResolver};
pub use version::Version;
