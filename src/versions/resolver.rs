//! Version plan resolution.
//!
//! Turns a set of [`VersionConstraint`]s into one concrete [`Version`] per
//! family, or a [`VersionConflict`] naming the family and the constraints
//! that cannot be satisfied together.
//!
//! Resolution is a pure function of the constraint set: constraints are
//! sorted before any decision is made, so input order never changes the
//! outcome.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::constraint::VersionConstraint;
use super::version::Version;

/// Constraints in one family that cannot be satisfied together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionConflict {
    /// The highest minimum exceeds the lowest maximum.
    #[error("Version conflict in '{family}': {first} is incompatible with {second}")]
    Incompatible {
        family: String,
        first: Box<VersionConstraint>,
        second: Box<VersionConstraint>,
    },

    /// The bounds are consistent but no catalog version falls inside them.
    #[error("No available version of '{family}' satisfies {}", describe_range(.min, .max.as_ref()))]
    Unavailable {
        family: String,
        min: Version,
        max: Option<Version>,
    },
}

impl VersionConflict {
    /// Family the conflict was found in.
    pub fn family(&self) -> &str {
        match self {
            VersionConflict::Incompatible { family, .. }
            | VersionConflict::Unavailable { family, .. } => family,
        }
    }
}

fn describe_range(min: &Version, max: Option<&Version>) -> String {
    match max {
        Some(max) => format!(">={} <={}", min, max),
        None => format!(">={}", min),
    }
}

/// One concrete version per family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionPlan {
    families: BTreeMap<String, Version>,
}

impl VersionPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a family to a version.
    pub fn insert(&mut self, family: impl Into<String>, version: Version) {
        self.families.insert(family.into(), version);
    }

    /// Version chosen for a family.
    pub fn get(&self, family: &str) -> Option<&Version> {
        self.families.get(family)
    }

    /// Families and versions in family-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Version)> {
        self.families.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Families matched by a step's family selector, lowest version first.
    ///
    /// A selector matches a family with the same name, or any family named
    /// `<selector>@<line>`; `node` matches `node@18` and `node@20`.
    pub fn matching(&self, selector: &str) -> Vec<(&str, &Version)> {
        let mut matched: Vec<(&str, &Version)> = self
            .iter()
            .filter(|(family, _)| selector_matches(selector, family))
            .collect();
        matched.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        matched
    }
}

fn selector_matches(selector: &str, family: &str) -> bool {
    family == selector
        || family
            .strip_prefix(selector)
            .is_some_and(|rest| rest.starts_with('@'))
}

/// Resolves constraints into a [`VersionPlan`].
///
/// Without a catalog the resolver picks versions straight from the
/// constraint bounds. A catalog restricts a family to versions known to be
/// installable.
#[derive(Debug, Clone, Default)]
pub struct VersionResolver {
    available: BTreeMap<String, Vec<Version>>,
}

impl VersionResolver {
    /// Create a resolver without catalogs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict a family to the given installable versions.
    pub fn with_available(
        mut self,
        family: impl Into<String>,
        versions: impl IntoIterator<Item = Version>,
    ) -> Self {
        let mut versions: Vec<Version> = versions.into_iter().collect();
        versions.sort();
        versions.dedup();
        self.available.insert(family.into(), versions);
        self
    }

    /// Resolve every family named in `constraints`.
    pub fn resolve(
        &self,
        constraints: &[VersionConstraint],
    ) -> std::result::Result<VersionPlan, VersionConflict> {
        let mut grouped: BTreeMap<&str, Vec<&VersionConstraint>> = BTreeMap::new();
        for constraint in constraints {
            grouped
                .entry(constraint.family.as_str())
                .or_default()
                .push(constraint);
        }

        let mut plan = VersionPlan::new();
        for (family, mut members) in grouped {
            members.sort();
            let Some(lower) = members
                .iter()
                .copied()
                .max_by(|a, b| a.min_version.cmp(&b.min_version))
            else {
                continue;
            };
            let version = self.resolve_family(family, lower, &members)?;
            info!("Resolved {} to {}", family, version);
            plan.insert(family, version);
        }
        Ok(plan)
    }

    /// `lower` is the constraint with the highest minimum; `constraints` is
    /// sorted.
    fn resolve_family(
        &self,
        family: &str,
        lower: &VersionConstraint,
        constraints: &[&VersionConstraint],
    ) -> std::result::Result<Version, VersionConflict> {
        let upper = constraints
            .iter()
            .copied()
            .filter(|c| c.max_version.is_some())
            .min_by(|a, b| a.max_version.cmp(&b.max_version));

        let min = lower.min_version;
        let max = upper.and_then(|c| c.max_version);

        if let (Some(upper), Some(max)) = (upper, max) {
            if min.numeric_cmp(&max) == Ordering::Greater {
                return Err(VersionConflict::Incompatible {
                    family: family.to_string(),
                    first: Box::new(lower.clone()),
                    second: Box::new(upper.clone()),
                });
            }
        }

        let in_range = |v: &Version| v.within(&min, max.as_ref());
        let mut preferences: Vec<Version> = constraints
            .iter()
            .filter_map(|c| c.preferred)
            .collect();
        preferences.sort();
        preferences.dedup();

        match self.available.get(family) {
            None => {
                let preferred = preferences.iter().rev().find(|p| in_range(p));
                for ignored in preferences.iter().filter(|p| !in_range(p)) {
                    debug!("Ignoring preferred {} {}: outside bounds", family, ignored);
                }
                Ok(preferred.copied().unwrap_or(min))
            }
            Some(catalog) => {
                let candidates: Vec<&Version> = catalog.iter().filter(|v| in_range(v)).collect();
                let Some(lowest) = candidates.first() else {
                    return Err(VersionConflict::Unavailable {
                        family: family.to_string(),
                        min,
                        max,
                    });
                };

                // Highest preference with an installable match wins, and
                // within it the newest matching release.
                let preferred = preferences.iter().rev().find_map(|p| {
                    candidates
                        .iter()
                        .rev()
                        .find(|v| v.matches_prefix(p))
                        .copied()
                });
                if preferred.is_none() && !preferences.is_empty() {
                    debug!("No available {} release matches its preferences", family);
                }
                Ok(*preferred.unwrap_or(*lowest))
            }
        }
    }
}

/// Resolve constraints without catalogs.
pub fn resolve_plan(
    constraints: &[VersionConstraint],
) -> std::result::Result<VersionPlan, VersionConflict> {
    VersionResolver::new().resolve(constraints)
}
