//! Catalog validation
//!
//! A catalog is well-formed when:
//! - field names are unique within each schema
//! - every Reference/Inline wrapper names a schema present in the catalog
//!
//! Schemas are checked in name order so the first reported violation is
//! deterministic.

use std::collections::HashSet;

use super::errors::{SchemaError, SchemaResult};
use super::loader::SchemaLoader;
use super::types::Schema;

/// Validator that enforces structural rules on a loaded catalog.
pub struct SchemaValidator<'a> {
    loader: &'a SchemaLoader,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator backed by the given schema loader.
    pub fn new(loader: &'a SchemaLoader) -> Self {
        Self { loader }
    }

    /// Validates every schema in the catalog.
    ///
    /// # Errors
    ///
    /// - AERO_SCHEMA_DUPLICATE_FIELD if a schema repeats a field name
    /// - AERO_SCHEMA_UNRESOLVED if a compound field names an unknown schema
    pub fn validate_catalog(&self) -> SchemaResult<()> {
        let mut schemas: Vec<&Schema> = self.loader.all_schemas().collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));

        for schema in schemas {
            self.validate_schema(schema)?;
        }
        Ok(())
    }

    /// Validates a single schema against the catalog.
    pub fn validate_schema(&self, schema: &Schema) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::duplicate_field(&schema.name, &field.name));
            }

            if let Some(target) = field.field_type.schema_name() {
                if !self.loader.exists(target) {
                    return Err(SchemaError::unresolved(&schema.name, &field.name, target));
                }
            }
        }
        Ok(())
    }
}
