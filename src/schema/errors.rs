//! Schema catalog error types
//!
//! Error codes:
//! - AERO_SCHEMA_MALFORMED
//! - AERO_SCHEMA_DUPLICATE
//! - AERO_SCHEMA_DUPLICATE_FIELD
//! - AERO_SCHEMA_UNRESOLVED

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema file could not be read or parsed
    AeroSchemaMalformed,
    /// Two schemas share a name
    AeroSchemaDuplicate,
    /// A schema declares the same field twice
    AeroSchemaDuplicateField,
    /// A compound field names a schema that is not loaded
    AeroSchemaUnresolved,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::AeroSchemaMalformed => "AERO_SCHEMA_MALFORMED",
            SchemaErrorCode::AeroSchemaDuplicate => "AERO_SCHEMA_DUPLICATE",
            SchemaErrorCode::AeroSchemaDuplicateField => "AERO_SCHEMA_DUPLICATE_FIELD",
            SchemaErrorCode::AeroSchemaUnresolved => "AERO_SCHEMA_UNRESOLVED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Schema name if applicable
    schema_name: Option<String>,
}

impl SchemaError {
    /// Create an error for a malformed schema file
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::AeroSchemaMalformed,
            message: format!("Malformed schema file '{}': {}", path.into(), reason.into()),
            schema_name: None,
        }
    }

    /// Create a duplicate schema error
    pub fn duplicate_schema(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::AeroSchemaDuplicate,
            message: format!("Schema '{}' is already registered", name),
            schema_name: Some(name),
        }
    }

    /// Create a duplicate field error
    pub fn duplicate_field(name: impl Into<String>, field: &str) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::AeroSchemaDuplicateField,
            message: format!("Schema '{}' declares field '{}' more than once", name, field),
            schema_name: Some(name),
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(name: impl Into<String>, field: &str, target: &str) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::AeroSchemaUnresolved,
            message: format!(
                "Field '{}' of schema '{}' refers to unknown schema '{}'",
                field, name, target
            ),
            schema_name: Some(name),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema name if applicable
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::AeroSchemaMalformed.code(), "AERO_SCHEMA_MALFORMED");
        assert_eq!(SchemaErrorCode::AeroSchemaDuplicate.code(), "AERO_SCHEMA_DUPLICATE");
        assert_eq!(
            SchemaErrorCode::AeroSchemaDuplicateField.code(),
            "AERO_SCHEMA_DUPLICATE_FIELD"
        );
        assert_eq!(SchemaErrorCode::AeroSchemaUnresolved.code(), "AERO_SCHEMA_UNRESOLVED");
    }

    #[test]
    fn test_unresolved_display() {
        let err = SchemaError::unresolved("Person", "address", "Address");
        let display = err.to_string();
        assert!(display.starts_with("AERO_SCHEMA_UNRESOLVED"));
        assert!(display.contains("'address'"));
        assert!(display.contains("'Address'"));
        assert_eq!(err.schema_name(), Some("Person"));
    }
}
