//! Manifest error types
//!
//! Syntax errors come from the grammar; everything else is a policy
//! validation error passed through verbatim.

use pest::error::LineColLocation;
use thiserror::Error;

use crate::policy::PolicyError;

use super::parser::Rule;

/// Result type for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Manifest parse or build failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Text does not match the grammar
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Text parsed but a policy failed validation
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl ManifestError {
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ManifestError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn from_pest(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        Self::syntax(line, column, err.variant.message())
    }

    /// Returns the error code
    pub fn code(&self) -> &'static str {
        match self {
            ManifestError::Syntax { .. } => "AERO_MANIFEST_SYNTAX",
            ManifestError::Policy(e) => e.code(),
        }
    }

    /// Returns the policy error if this is a validation failure
    pub fn as_policy_error(&self) -> Option<&PolicyError> {
        match self {
            ManifestError::Policy(e) => Some(e),
            ManifestError::Syntax { .. } => None,
        }
    }
}
