//! aeropolicy - data usage policies and ingress validation
//!
//! Policies are declared in a small manifest language, built against a
//! catalog of entity schemas, and turned into per-schema ingress rules.

pub mod cli;
pub mod manifest;
pub mod observability;
pub mod policy;
pub mod schema;
