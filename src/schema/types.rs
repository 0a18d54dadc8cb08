//! Schema type definitions for the entity catalog
//!
//! Supported field types:
//! - primitive: Text, Number, Boolean, ...
//! - reference: pointer to an entity stored independently (`&Address`)
//! - inline: entity embedded in its parent's storage (`inline Name`)
//! - collection: homogeneous list of any other field type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Text,
    Number,
    Boolean,
    BigInt,
    Int,
    Long,
    Double,
    Instant,
    Duration,
    Bytes,
}

impl PrimitiveType {
    /// Returns the type name used in schema display strings
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Text => "Text",
            PrimitiveType::Number => "Number",
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::BigInt => "BigInt",
            PrimitiveType::Int => "Int",
            PrimitiveType::Long => "Long",
            PrimitiveType::Double => "Double",
            PrimitiveType::Instant => "Instant",
            PrimitiveType::Duration => "Duration",
            PrimitiveType::Bytes => "Bytes",
        }
    }
}

/// Field type of a catalog schema.
///
/// Compound variants name their target schema; resolution goes through a
/// [`SchemaLookup`](super::SchemaLookup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// Scalar value
    Primitive { primitive: PrimitiveType },
    /// Reference to an independently stored entity
    Reference { schema: String },
    /// Entity embedded in the parent
    Inline { schema: String },
    /// List of elements (boxed to allow nesting)
    Collection { element: Box<FieldType> },
}

impl FieldType {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        FieldType::Primitive { primitive }
    }

    pub fn reference(schema: impl Into<String>) -> Self {
        FieldType::Reference {
            schema: schema.into(),
        }
    }

    pub fn inline(schema: impl Into<String>) -> Self {
        FieldType::Inline {
            schema: schema.into(),
        }
    }

    pub fn collection(element: FieldType) -> Self {
        FieldType::Collection {
            element: Box::new(element),
        }
    }

    /// Returns the named schema behind Reference/Inline/Collection wrappers,
    /// or `None` for primitives and collections of primitives.
    pub fn schema_name(&self) -> Option<&str> {
        match self {
            FieldType::Primitive { .. } => None,
            FieldType::Reference { schema } | FieldType::Inline { schema } => Some(schema),
            FieldType::Collection { element } => element.schema_name(),
        }
    }

    /// Returns true when the type leads to a nested schema
    pub fn is_compound(&self) -> bool {
        self.schema_name().is_some()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive { primitive } => write!(f, "{}", primitive.type_name()),
            FieldType::Reference { schema } => write!(f, "&{}", schema),
            FieldType::Inline { schema } => write!(f, "inline {}", schema),
            FieldType::Collection { element } => write!(f, "[{}]", element),
        }
    }
}

/// Field definition, order-preserving within its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::primitive(PrimitiveType::Text))
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::primitive(PrimitiveType::Number))
    }
}

/// Named entity schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered field definitions
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Create a new schema
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if the schema declares the field
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Display form used in error messages
    pub fn display_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", field.name, field.field_type)?;
        }
        write!(f, " }}")
    }
}
