//! Policy model and ingress validation
//!
//! Builders turn parsed declarations into immutable [`Policy`] values,
//! checked against a schema catalog. From a built policy set this module
//! derives:
//! - the max read schema of each target (`PolicyTarget::get_max_read_schema`),
//! - storage capabilities per retention rule,
//! - the merged per-schema ingress map ([`IngressValidation`]),
//! - canonical manifest text (`to_manifest_string`).

mod annotations;
mod builder;
mod capabilities;
mod enums;
mod errors;
mod ingress;
mod restrict;
mod serializer;
mod types;

pub(crate) use builder::SeenNames;

pub use builder::PolicyBuilder;
pub use capabilities::{Capabilities, Capability, Persistence};
pub use enums::{StorageMedium, Ttl, TtlUnit, UsageType};
pub use errors::{PolicyError, PolicyErrorKind, PolicyResult};
pub use ingress::IngressValidation;
pub use restrict::{IngressField, IngressSchema, IngressType};
pub use serializer::policies_to_string;
pub use types::{
    AllowedUsage, CustomAnnotation, Policy, PolicyConfig, PolicyField, PolicyRetention,
    PolicyTarget,
};
