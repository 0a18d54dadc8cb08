//! Policy manifests
//!
//! A manifest is a text file holding any number of `policy` declarations.
//! [`Manifest::parse`] runs the grammar, then builds every policy against
//! the schema catalog; the first violation in declaration order fails the
//! whole manifest.

pub mod ast;
mod errors;
mod parser;

pub use errors::{ManifestError, ManifestResult};
pub use parser::parse_manifest;

use crate::observability::{log_event_with_fields, Event};
use crate::policy::{
    policies_to_string, IngressValidation, Policy, PolicyBuilder, PolicyResult, SeenNames,
};
use crate::schema::SchemaLookup;

use ast::ManifestNode;

/// Built policies of one manifest, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    policies: Vec<Policy>,
}

impl Manifest {
    /// Parses and builds manifest text.
    pub fn parse(text: &str, schemas: &dyn SchemaLookup) -> ManifestResult<Self> {
        let node = parse_manifest(text)?;
        Ok(Self::build(&node, schemas)?)
    }

    /// Builds a parsed declaration tree.
    pub fn build(node: &ManifestNode, schemas: &dyn SchemaLookup) -> PolicyResult<Self> {
        let builder = PolicyBuilder::new(schemas);
        let mut seen = SeenNames::default();
        let mut policies = Vec::with_capacity(node.policies.len());

        for policy in &node.policies {
            policies.push(builder.build_unique(policy, &mut seen)?);
        }

        let policy_count = policies.len().to_string();
        log_event_with_fields(
            Event::ManifestParsed,
            &[("policies", policy_count.as_str())],
        );
        Ok(Self { policies })
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Merged ingress map over every policy in the manifest
    pub fn ingress_validation(&self, schemas: &dyn SchemaLookup) -> PolicyResult<IngressValidation> {
        IngressValidation::new(&self.policies, schemas)
    }

    /// Canonical text of every policy, separated by blank lines
    pub fn to_manifest_string(&self) -> String {
        policies_to_string(&self.policies)
    }
}
