//! Max read schema of a policy target
//!
//! Restriction keeps exactly the selected fields, in selection order, and
//! re-wraps nested selections in the field's own Reference/Inline/Collection
//! kind. A compound field selected without subfields keeps its full nested
//! type.
//!
//! Each referenced schema is expanded in full at most once per restriction;
//! later references to it carry only its name, since referenced schemas get
//! their own ingress entry. Inline schemas have no entry of their own, so
//! they expand wherever they appear and stop only at a repeat on the current
//! inline path.

use std::collections::HashSet;

use serde::Serialize;

use crate::schema::{FieldType, PrimitiveType, Schema, SchemaLookup};

use super::errors::{PolicyError, PolicyResult};
use super::types::{PolicyField, PolicyTarget};

/// Schema with nested schemas embedded rather than named
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressSchema {
    pub name: String,
    pub fields: Vec<IngressField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: IngressType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngressType {
    Primitive(PrimitiveType),
    Reference(IngressSchema),
    Inline(IngressSchema),
    Collection(Box<IngressType>),
}

impl IngressType {
    /// Nested schema behind any wrapper
    pub fn schema(&self) -> Option<&IngressSchema> {
        match self {
            IngressType::Primitive(_) => None,
            IngressType::Reference(s) | IngressType::Inline(s) => Some(s),
            IngressType::Collection(element) => element.schema(),
        }
    }

    /// Unions `other` into `self` when both have the same shape.
    pub(crate) fn merge(&mut self, other: IngressType) {
        match (self, other) {
            (IngressType::Reference(a), IngressType::Reference(b))
            | (IngressType::Inline(a), IngressType::Inline(b)) => a.merge(b),
            (IngressType::Collection(a), IngressType::Collection(b)) => a.merge(*b),
            _ => {}
        }
    }
}

impl IngressSchema {
    /// Fieldless occurrence standing in for a schema expanded elsewhere
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&IngressField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns true if the field path lies inside this schema.
    ///
    /// Nested occurrences are taken as they are; a reference emitted by name
    /// only admits the field naming it. [`IngressValidation::allows`] resolves
    /// such references through their own entries.
    ///
    /// [`IngressValidation::allows`]: super::IngressValidation::allows
    pub fn allows_path(&self, path: &[&str]) -> bool {
        let Some((head, rest)) = path.split_first() else {
            return true;
        };
        match self.field(head) {
            None => false,
            Some(_) if rest.is_empty() => true,
            Some(field) => field
                .field_type
                .schema()
                .map_or(false, |nested| nested.allows_path(rest)),
        }
    }

    /// Recursive field union; existing fields keep their position.
    pub(crate) fn merge(&mut self, other: IngressSchema) {
        for field in other.fields {
            match self.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => existing.field_type.merge(field.field_type),
                None => self.fields.push(field),
            }
        }
    }
}

impl PolicyTarget {
    /// Widest schema this target lets a reader see.
    pub fn get_max_read_schema(&self, schemas: &dyn SchemaLookup) -> PolicyResult<IngressSchema> {
        let mut restrictor = Restrictor {
            schemas,
            expanded: HashSet::new(),
        };
        let root = restrictor.resolve(&self.schema_name)?;
        restrictor.restrict(root, &self.fields)
    }
}

struct Restrictor<'a> {
    schemas: &'a dyn SchemaLookup,
    /// Referenced schemas already expanded in full
    expanded: HashSet<String>,
}

impl<'a> Restrictor<'a> {
    fn resolve(&self, name: &str) -> PolicyResult<&'a Schema> {
        self.schemas
            .lookup(name)
            .ok_or_else(|| PolicyError::UnknownSchema(name.to_string()))
    }

    fn restrict(&mut self, schema: &Schema, selection: &[PolicyField]) -> PolicyResult<IngressSchema> {
        let mut fields = Vec::with_capacity(selection.len());

        for node in selection {
            let def = schema.field(&node.name).ok_or_else(|| PolicyError::UnknownField {
                schema: schema.display_name().to_string(),
                field: node.name.clone(),
            })?;

            let field_type = if node.is_leaf() {
                self.expand_type(&def.field_type, &mut Vec::new())?
            } else {
                self.restrict_type(&def.field_type, &node.subfields)?
            };

            fields.push(IngressField {
                name: node.name.clone(),
                field_type,
            });
        }

        Ok(IngressSchema {
            name: schema.name.clone(),
            fields,
        })
    }

    fn restrict_type(&mut self, field_type: &FieldType, subfields: &[PolicyField]) -> PolicyResult<IngressType> {
        Ok(match field_type {
            FieldType::Primitive { primitive } => IngressType::Primitive(*primitive),
            FieldType::Reference { schema } => {
                let inner = self.resolve(schema)?;
                IngressType::Reference(self.restrict(inner, subfields)?)
            }
            FieldType::Inline { schema } => {
                let inner = self.resolve(schema)?;
                IngressType::Inline(self.restrict(inner, subfields)?)
            }
            FieldType::Collection { element } => {
                IngressType::Collection(Box::new(self.restrict_type(element, subfields)?))
            }
        })
    }

    /// Full nested type; `inline_path` holds the inline schemas being expanded.
    fn expand_type(&mut self, field_type: &FieldType, inline_path: &mut Vec<String>) -> PolicyResult<IngressType> {
        Ok(match field_type {
            FieldType::Primitive { primitive } => IngressType::Primitive(*primitive),
            FieldType::Reference { schema } => IngressType::Reference(self.expand_reference(schema)?),
            FieldType::Inline { schema } => IngressType::Inline(self.expand_inline(schema, inline_path)?),
            FieldType::Collection { element } => {
                IngressType::Collection(Box::new(self.expand_type(element, inline_path)?))
            }
        })
    }

    fn expand_reference(&mut self, name: &str) -> PolicyResult<IngressSchema> {
        if !self.expanded.insert(name.to_string()) {
            return Ok(IngressSchema::named(name));
        }
        let schema = self.resolve(name)?;
        self.expand_fields(schema, &mut Vec::new())
    }

    fn expand_inline(&mut self, name: &str, inline_path: &mut Vec<String>) -> PolicyResult<IngressSchema> {
        if inline_path.iter().any(|seen| seen == name) {
            return Ok(IngressSchema::named(name));
        }
        let schema = self.resolve(name)?;
        inline_path.push(name.to_string());
        let expanded = self.expand_fields(schema, inline_path);
        inline_path.pop();
        expanded
    }

    fn expand_fields(&mut self, schema: &Schema, inline_path: &mut Vec<String>) -> PolicyResult<IngressSchema> {
        let mut fields = Vec::with_capacity(schema.fields.len());
        for def in &schema.fields {
            fields.push(IngressField {
                name: def.name.clone(),
                field_type: self.expand_type(&def.field_type, inline_path)?,
            });
        }

        Ok(IngressSchema {
            name: schema.name.clone(),
            fields,
        })
    }
}
