//! Version constraints grouped by family.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::version::Version;

/// A requirement on one family's version.
///
/// Ordering is derived so the resolver can sort a family's constraints into
/// a canonical order before resolving.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct VersionConstraint {
    /// Family this constraint belongs to (e.g. `node@20`).
    pub family: String,

    /// Lowest acceptable version.
    #[schemars(with = "String")]
    pub min_version: Version,

    /// Highest acceptable version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub max_version: Option<Version>,

    /// Version to pick when it satisfies every constraint in the family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub preferred: Option<Version>,

    /// Who declared the constraint, for conflict reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl VersionConstraint {
    pub fn new(family: impl Into<String>, min_version: Version) -> Self {
        Self {
            family: family.into(),
            min_version,
            max_version: None,
            preferred: None,
            source: None,
        }
    }

    pub fn with_max(mut self, max: Version) -> Self {
        self.max_version = Some(max);
        self
    }

    pub fn with_preferred(mut self, preferred: Version) -> Self {
        self.preferred = Some(preferred);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">={}", self.min_version)?;
        if let Some(max) = &self.max_version {
            write!(f, " <={}", max)?;
        }
        if let Some(preferred) = &self.preferred {
            write!(f, " (prefers {})", preferred)?;
        }
        if let Some(source) = &self.source {
            write!(f, " from {}", source)?;
        }
        Ok(())
    }
}
