//! Runtime version numbers.
//!
//! Versions are dotted numeric triples written with one to three
//! components (`20`, `18.19`, `v20.11.1`). The written precision is kept so
//! that a version substituted into a command template reads the way it was
//! declared.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PrereqError, Result};

/// A runtime version such as `20` or `18.19.0`.
///
/// Ordering is numeric on `(major, minor, patch)` with missing components
/// treated as zero, then by precision, so `20 < 20.0.0 < 20.0.1`. Bound
/// checks use [`Version::numeric_cmp`], which ignores precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    precision: u8,
}

impl Version {
    /// A major-only version (`20`).
    pub fn new(major: u64) -> Self {
        Self {
            major,
            minor: 0,
            patch: 0,
            precision: 1,
        }
    }

    /// A fully specified version (`20.11.1`).
    pub fn from_parts(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            precision: 3,
        }
    }

    /// Parse a version string. Accepts an optional leading `v`.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || PrereqError::InvalidVersion {
            value: value.to_string(),
        };

        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let parts: Vec<&str> = digits.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(invalid());
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            precision: parts.len() as u8,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Compare numerically, ignoring how many components were written.
    pub fn numeric_cmp(&self, other: &Version) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }

    /// Whether this version starts with the components written in `prefix`.
    ///
    /// `20.11.1` matches `20` and `20.11` but not `20.1`.
    pub fn matches_prefix(&self, prefix: &Version) -> bool {
        let mine = [self.major, self.minor, self.patch];
        let theirs = [prefix.major, prefix.minor, prefix.patch];
        mine[..prefix.precision as usize] == theirs[..prefix.precision as usize]
    }

    /// Whether this version lies within `[min, max]` (max optional).
    pub fn within(&self, min: &Version, max: Option<&Version>) -> bool {
        self.numeric_cmp(min) != Ordering::Less
            && max.is_none_or(|max| self.numeric_cmp(max) != Ordering::Greater)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            1 => write!(f, "{}", self.major),
            2 => write!(f, "{}.{}", self.major, self.minor),
            _ => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

impl FromStr for Version {
    type Err = PrereqError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // YAML reads `18` as an integer and `18.19` as a float. A float has
        // already lost its text (`3.10` is `3.1`), so it must be quoted.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Integer(u64),
            Float(f64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Integer(n) => n.to_string(),
            Raw::Float(n) => {
                return Err(serde::de::Error::custom(format!(
                    "version `{}` must be quoted",
                    n
                )))
            }
            Raw::Text(s) => s,
        };
        Version::parse(&text).map_err(serde::de::Error::custom)
    }
}
