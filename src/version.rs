//! Metadata versioning
//!
//! A [`Version`] is a `major.minor` stamp carried by every metadata container.
//! It is compared, never migrated: readers decide what to do with an older or
//! newer stamp.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MetadataError, Result};

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)$").expect("version pattern is valid"))
}

/// A comparable (major, minor) version stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    major: u32,
    minor: u32,
}

impl Version {
    /// Create a version from parts that are known to be nonnegative
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Create a version from signed parts, rejecting negative values
    pub fn of(major: i64, minor: i64) -> Result<Self> {
        let part = |value: i64, name: &str| {
            u32::try_from(value).map_err(|_| {
                MetadataError::validation(format!(
                    "{} version must be a nonnegative 32-bit integer, got {}",
                    name, value
                ))
            })
        };
        Ok(Self::new(part(major, "major")?, part(minor, "minor")?))
    }

    /// Parse the literal form `major.minor`
    pub fn parse(text: &str) -> Result<Self> {
        let captures = version_pattern()
            .captures(text)
            .ok_or_else(|| MetadataError::parse(format!("invalid version {:?}", text)))?;

        let part = |index: usize| {
            captures[index]
                .parse::<u32>()
                .map_err(|e| MetadataError::parse(format!("invalid version {:?}: {}", text, e)))
        };
        Ok(Self::new(part(1)?, part(2)?))
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Version::parse(&text).map_err(serde::de::Error::custom)
    }
}
