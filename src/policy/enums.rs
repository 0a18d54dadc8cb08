//! Closed value sets used by policy annotations
//!
//! - usage type: `*`, `egress`, `join`
//! - retention medium: `Ram`, `Disk`
//! - ttl literal: `<count><unit>` with unit `d`, `h` or `m`

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::errors::PolicyError;

/// Category of use a field may be put to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UsageType {
    Any,
    Egress,
    Join,
}

impl UsageType {
    pub const ALL: [UsageType; 3] = [UsageType::Any, UsageType::Egress, UsageType::Join];

    /// Manifest token
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::Any => "*",
            UsageType::Egress => "egress",
            UsageType::Join => "join",
        }
    }
}

impl FromStr for UsageType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UsageType::ALL
            .into_iter()
            .find(|usage| usage.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<_> = UsageType::ALL.iter().map(|u| u.as_str()).collect();
                PolicyError::unexpected_value(&allowed, s)
            })
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UsageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Storage medium a target's data may be retained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StorageMedium {
    Ram,
    Disk,
}

impl StorageMedium {
    pub const ALL: [StorageMedium; 2] = [StorageMedium::Ram, StorageMedium::Disk];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMedium::Ram => "Ram",
            StorageMedium::Disk => "Disk",
        }
    }
}

impl FromStr for StorageMedium {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageMedium::ALL
            .into_iter()
            .find(|medium| medium.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<_> = StorageMedium::ALL.iter().map(|m| m.as_str()).collect();
                PolicyError::unexpected_value(&allowed, s)
            })
    }
}

impl fmt::Display for StorageMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of a [`Ttl`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TtlUnit {
    Days,
    Hours,
    Minutes,
}

impl TtlUnit {
    pub fn suffix(&self) -> char {
        match self {
            TtlUnit::Days => 'd',
            TtlUnit::Hours => 'h',
            TtlUnit::Minutes => 'm',
        }
    }

    pub fn millis(&self) -> u64 {
        match self {
            TtlUnit::Days => 24 * 60 * 60 * 1000,
            TtlUnit::Hours => 60 * 60 * 1000,
            TtlUnit::Minutes => 60 * 1000,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "d" => Some(TtlUnit::Days),
            "h" => Some(TtlUnit::Hours),
            "m" => Some(TtlUnit::Minutes),
            _ => None,
        }
    }
}

/// Maximum retention age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ttl {
    pub count: u32,
    pub units: TtlUnit,
}

impl Ttl {
    pub fn new(count: u32, units: TtlUnit) -> Self {
        Self { count, units }
    }

    pub fn days(count: u32) -> Self {
        Self::new(count, TtlUnit::Days)
    }

    pub fn hours(count: u32) -> Self {
        Self::new(count, TtlUnit::Hours)
    }

    pub fn minutes(count: u32) -> Self {
        Self::new(count, TtlUnit::Minutes)
    }

    /// Ttl of a target without `@maxAge`
    pub fn zero() -> Self {
        Self::minutes(0)
    }

    pub fn millis(&self) -> u64 {
        u64::from(self.count) * self.units.millis()
    }

    pub fn is_zero(&self) -> bool {
        self.millis() == 0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Ttl {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static TTL_PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = TTL_PATTERN
            .get_or_init(|| Regex::new(r"^([0-9]+)([dhm])$").expect("ttl pattern is valid"));

        let invalid = || PolicyError::InvalidTtl(s.to_string());
        let captures = pattern.captures(s).ok_or_else(invalid)?;
        let count = captures[1].parse::<u32>().map_err(|_| invalid())?;
        let units = TtlUnit::from_suffix(&captures[2]).ok_or_else(invalid)?;
        Ok(Ttl::new(count, units))
    }
}

/// Formats in manifest form, e.g. `2d`
impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.units.suffix())
    }
}
