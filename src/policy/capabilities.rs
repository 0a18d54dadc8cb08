//! Storage capabilities derived from a target's retention rules
//!
//! One capability set per `@allowedRetention`; the target's max age is
//! attached to every set.

use std::fmt;

use serde::Serialize;

use super::enums::{StorageMedium, Ttl};
use super::types::PolicyTarget;

/// Where data may persist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Persistence {
    InMemory,
    OnDisk,
}

impl From<StorageMedium> for Persistence {
    fn from(medium: StorageMedium) -> Self {
        match medium {
            StorageMedium::Ram => Persistence::InMemory,
            StorageMedium::Disk => Persistence::OnDisk,
        }
    }
}

/// A single storage capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    Persistence(Persistence),
    Encryption(bool),
    Ttl(Ttl),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Persistence(Persistence::InMemory) => write!(f, "InMemory"),
            Capability::Persistence(Persistence::OnDisk) => write!(f, "OnDisk"),
            Capability::Encryption(true) => write!(f, "Encrypted"),
            Capability::Encryption(false) => write!(f, "Unencrypted"),
            Capability::Ttl(ttl) => write!(f, "Ttl({})", ttl),
        }
    }
}

/// Set of capabilities a store must provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Capabilities {
    ranges: Vec<Capability>,
}

impl Capabilities {
    pub fn new(ranges: Vec<Capability>) -> Self {
        Self { ranges }
    }

    pub fn contains(&self, capability: &Capability) -> bool {
        self.ranges.contains(capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn persistence(&self) -> Option<Persistence> {
        self.ranges.iter().find_map(|c| match c {
            Capability::Persistence(p) => Some(*p),
            _ => None,
        })
    }

    pub fn ttl(&self) -> Option<Ttl> {
        self.ranges.iter().find_map(|c| match c {
            Capability::Ttl(t) => Some(*t),
            _ => None,
        })
    }
}

/// Formats as `{OnDisk, Encrypted, Ttl(2d)}`
impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, capability) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", capability)?;
        }
        write!(f, "}}")
    }
}

impl PolicyTarget {
    /// One capability set per retention, each carrying the target's ttl.
    pub fn to_capabilities(&self) -> Vec<Capabilities> {
        self.retentions
            .iter()
            .map(|retention| {
                Capabilities::new(vec![
                    Capability::Persistence(retention.medium.into()),
                    Capability::Encryption(retention.encryption_required),
                    Capability::Ttl(self.max_age),
                ])
            })
            .collect()
    }
}
