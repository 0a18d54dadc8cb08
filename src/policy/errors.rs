//! # Policy Errors
//!
//! Every variant's `Display` text is part of the manifest contract and is
//! matched literally by callers.

use thiserror::Error;

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorKind {
    /// Policy, target, config, field or subfield declared twice
    DuplicateName,
    /// Schema or field not found
    UnknownReference,
    /// Value outside a closed set
    UnknownEnumValue,
    /// Malformed literal or annotation parameter
    InvalidLiteral,
    /// Same label and usage type allowed twice
    DuplicateUsage,
}

impl PolicyErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PolicyErrorKind::DuplicateName => "AERO_POLICY_DUPLICATE_NAME",
            PolicyErrorKind::UnknownReference => "AERO_POLICY_UNKNOWN_REFERENCE",
            PolicyErrorKind::UnknownEnumValue => "AERO_POLICY_UNKNOWN_ENUM_VALUE",
            PolicyErrorKind::InvalidLiteral => "AERO_POLICY_INVALID_LITERAL",
            PolicyErrorKind::DuplicateUsage => "AERO_POLICY_DUPLICATE_USAGE",
        }
    }
}

/// Policy validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    // ==================
    // Duplicates
    // ==================
    #[error("A policy named {0} already exists.")]
    DuplicatePolicy(String),

    /// Target schema, config, field or subfield
    #[error("A definition for '{0}' already exists.")]
    DuplicateDefinition(String),

    #[error("@allowedRetention has already been defined for {0}.")]
    DuplicateRetention(String),

    #[error("Annotation @{0} may only be declared once.")]
    DuplicateAnnotation(String),

    #[error("Usage of label '{label}' for usage type '{usage}' has already been allowed.")]
    DuplicateUsage { label: String, usage: String },

    // ==================
    // Resolution
    // ==================
    #[error("Unknown type name: {0}.")]
    UnknownSchema(String),

    #[error("Schema '{schema}' does not contain field '{field}'")]
    UnknownField { schema: String, field: String },

    #[error("Field '{field}' of schema '{schema}' has no subfields.")]
    NotCompound { schema: String, field: String },

    // ==================
    // Values
    // ==================
    #[error("Expected one of: {expected}. Found: {found}.")]
    UnexpectedValue { expected: String, found: String },

    #[error("Invalid ttl: {0}")]
    InvalidTtl(String),

    #[error("Annotation @{annotation} is missing parameter '{param}'.")]
    MissingParameter { annotation: String, param: String },

    #[error("Parameter '{param}' of @{annotation} must be {expected}.")]
    InvalidParameter {
        annotation: String,
        param: String,
        expected: &'static str,
    },

    #[error("Annotation @{0} must name its parameters.")]
    UnnamedParameters(String),
}

impl PolicyError {
    /// Builds the closed-set error listing every allowed value
    pub fn unexpected_value(allowed: &[&str], found: impl Into<String>) -> Self {
        PolicyError::UnexpectedValue {
            expected: allowed.join(", "),
            found: found.into(),
        }
    }

    /// Returns the error category
    pub fn kind(&self) -> PolicyErrorKind {
        match self {
            PolicyError::DuplicatePolicy(_)
            | PolicyError::DuplicateDefinition(_)
            | PolicyError::DuplicateRetention(_)
            | PolicyError::DuplicateAnnotation(_) => PolicyErrorKind::DuplicateName,
            PolicyError::DuplicateUsage { .. } => PolicyErrorKind::DuplicateUsage,
            PolicyError::UnknownSchema(_)
            | PolicyError::UnknownField { .. }
            | PolicyError::NotCompound { .. } => PolicyErrorKind::UnknownReference,
            PolicyError::UnexpectedValue { .. } => PolicyErrorKind::UnknownEnumValue,
            PolicyError::InvalidTtl(_)
            | PolicyError::MissingParameter { .. }
            | PolicyError::InvalidParameter { .. }
            | PolicyError::UnnamedParameters(_) => PolicyErrorKind::InvalidLiteral,
        }
    }

    /// Returns the string code of the error category
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}
