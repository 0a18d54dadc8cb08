//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::Severity;

/// Lifecycle points worth a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// CLI configuration loaded
    ConfigLoaded,
    /// Schema catalog loaded and validated
    SchemasLoaded,

    // Policies
    /// Manifest parsed and every policy built
    ManifestParsed,
    /// One policy built
    PolicyBuilt,
    /// Ingress map computed over a policy set
    IngressComputed,
    /// Canonical text produced
    ManifestFormatted,

    // Commands
    /// A CLI command failed
    CommandFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::ManifestParsed => "MANIFEST_PARSED",
            Event::PolicyBuilt => "POLICY_BUILT",
            Event::IngressComputed => "INGRESS_COMPUTED",
            Event::ManifestFormatted => "MANIFEST_FORMATTED",
            Event::CommandFailed => "COMMAND_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::PolicyBuilt => Severity::Trace,
            Event::CommandFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
