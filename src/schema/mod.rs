//! Entity schema catalog for aeropolicy
//!
//! Policies select fields out of named schemas. The policy engine never owns
//! the catalog; it reads schemas through the [`SchemaLookup`] capability
//! injected by the caller.
//!
//! # Design Principles
//!
//! - Field order is significant and preserved
//! - Compound fields name their target schema, they never embed it
//! - Deterministic validation

mod errors;
mod loader;
mod types;
mod validator;

use std::collections::HashMap;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{FieldDef, FieldType, PrimitiveType, Schema};
pub use validator::SchemaValidator;

/// Name-based schema resolution.
pub trait SchemaLookup {
    /// Returns the schema registered under `name`
    fn lookup(&self, name: &str) -> Option<&Schema>;
}

impl SchemaLookup for HashMap<String, Schema> {
    fn lookup(&self, name: &str) -> Option<&Schema> {
        self.get(name)
    }
}
