//! Ingress validation across a set of policies
//!
//! For every schema that may be written, the union of what all policies let
//! a reader see. A target's root schema and every schema reached through a
//! reference get an entry; schemas only ever embedded inline do not, since
//! they are stored as part of their parent.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::observability::{log_event_with_fields, Event};
use crate::schema::SchemaLookup;

use super::capabilities::Capabilities;
use super::errors::PolicyResult;
use super::restrict::{IngressSchema, IngressType};
use super::serializer::policies_to_string;
use super::types::Policy;

/// Restricted schemas keyed by schema name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressValidation {
    /// SHA-256 of the canonical manifest text the map was computed from,
    /// URL-safe base64 without padding
    fingerprint: String,
    schemas: BTreeMap<String, IngressSchema>,
    capabilities: BTreeMap<String, Vec<Capabilities>>,
}

impl IngressValidation {
    /// Computes the merged restricted schemas of `policies`.
    pub fn new(policies: &[Policy], schemas: &dyn SchemaLookup) -> PolicyResult<Self> {
        let mut validation = Self {
            fingerprint: fingerprint(&policies_to_string(policies)),
            schemas: BTreeMap::new(),
            capabilities: BTreeMap::new(),
        };

        for policy in policies {
            for target in &policy.targets {
                let restricted = target.get_max_read_schema(schemas)?;
                validation.collect_references(&restricted);
                validation.add(restricted);

                validation
                    .capabilities
                    .entry(target.schema_name.clone())
                    .or_default()
                    .extend(target.to_capabilities());
            }
        }

        let policy_count = policies.len().to_string();
        let schema_count = validation.schemas.len().to_string();
        log_event_with_fields(
            Event::IngressComputed,
            &[
                ("policies", policy_count.as_str()),
                ("schemas", schema_count.as_str()),
                ("fingerprint", validation.fingerprint.as_str()),
            ],
        );
        Ok(validation)
    }

    pub fn restricted_schema(&self, name: &str) -> Option<&IngressSchema> {
        self.schemas.get(name)
    }

    /// Entries in ascending name order
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &IngressSchema)> {
        self.schemas.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Capability sets of every target rooted at `schema_name`, in policy order
    pub fn capabilities(&self, schema_name: &str) -> &[Capabilities] {
        self.capabilities
            .get(schema_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns true if writing `path` of `schema_name` falls within some policy.
    ///
    /// Descending through a reference continues in the referenced schema's
    /// own entry, which holds every occurrence merged.
    pub fn allows(&self, schema_name: &str, path: &[&str]) -> bool {
        let Some(mut schema) = self.schemas.get(schema_name) else {
            return false;
        };
        let mut rest = path;

        while let Some((head, tail)) = rest.split_first() {
            let Some(field) = schema.field(head) else {
                return false;
            };
            if tail.is_empty() {
                return true;
            }
            match self.stored(&field.field_type) {
                Some(nested) => schema = nested,
                None => return false,
            }
            rest = tail;
        }
        true
    }

    /// Schema a nested value is checked against
    fn stored<'a>(&'a self, field_type: &'a IngressType) -> Option<&'a IngressSchema> {
        match field_type {
            IngressType::Primitive(_) => None,
            IngressType::Reference(schema) => self.schemas.get(&schema.name),
            IngressType::Inline(schema) => Some(schema),
            IngressType::Collection(element) => self.stored(element),
        }
    }

    fn collect_references(&mut self, schema: &IngressSchema) {
        for field in &schema.fields {
            self.collect_type(&field.field_type);
        }
    }

    fn collect_type(&mut self, field_type: &IngressType) {
        match field_type {
            IngressType::Primitive(_) => {}
            IngressType::Reference(schema) => {
                self.collect_references(schema);
                self.add(schema.clone());
            }
            IngressType::Inline(schema) => self.collect_references(schema),
            IngressType::Collection(element) => self.collect_type(element),
        }
    }

    fn add(&mut self, schema: IngressSchema) {
        match self.schemas.entry(schema.name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(schema);
            }
            Entry::Occupied(mut entry) => entry.get_mut().merge(schema),
        }
    }
}

fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::enums::{StorageMedium, Ttl};
    use crate::policy::types::{PolicyField, PolicyRetention, PolicyTarget};
    use crate::schema::{FieldDef, FieldType, Schema};
    use std::collections::HashMap;

    fn catalog() -> HashMap<String, Schema> {
        let mut schemas = HashMap::new();
        for schema in [
            Schema::new("Name", vec![FieldDef::text("first"), FieldDef::text("last")]),
            Schema::new("Address", vec![FieldDef::text("city"), FieldDef::text("street")]),
            Schema::new(
                "Person",
                vec![
                    FieldDef::new("name", FieldType::inline("Name")),
                    FieldDef::new("address", FieldType::reference("Address")),
                    FieldDef::text("phone"),
                ],
            ),
            Schema::new(
                "Group",
                vec![
                    FieldDef::text("title"),
                    FieldDef::new("members", FieldType::collection(FieldType::reference("Person"))),
                ],
            ),
        ] {
            schemas.insert(schema.name.clone(), schema);
        }
        schemas
    }

    fn node(name: &str, subfields: Vec<PolicyField>) -> PolicyField {
        let mut field = PolicyField::leaf(name);
        field.subfields = subfields;
        field
    }

    fn policy(name: &str, targets: Vec<PolicyTarget>) -> Policy {
        Policy {
            name: name.into(),
            description: None,
            egress_type: None,
            custom_annotations: vec![],
            targets,
            configs: vec![],
        }
    }

    fn target(schema: &str, fields: Vec<PolicyField>) -> PolicyTarget {
        PolicyTarget {
            schema_name: schema.into(),
            retentions: vec![],
            max_age: Ttl::zero(),
            custom_annotations: vec![],
            fields,
        }
    }

    #[test]
    fn test_references_included_inline_excluded() {
        let schemas = catalog();
        let policies = vec![policy(
            "Members",
            vec![target(
                "Group",
                vec![node(
                    "members",
                    vec![
                        node("name", vec![node("first", vec![])]),
                        node("address", vec![node("city", vec![])]),
                    ],
                )],
            )],
        )];

        let validation = IngressValidation::new(&policies, &schemas).unwrap();
        assert_eq!(validation.schema_names(), vec!["Address", "Group", "Person"]);
        assert!(validation.restricted_schema("Name").is_none());
        assert_eq!(
            validation.restricted_schema("Person").unwrap().field_names(),
            vec!["name", "address"]
        );
        assert_eq!(
            validation.restricted_schema("Address").unwrap().field_names(),
            vec!["city"]
        );
    }

    #[test]
    fn test_union_across_policies() {
        let schemas = catalog();
        let policies = vec![
            policy("A", vec![target("Person", vec![node("phone", vec![])])]),
            policy(
                "B",
                vec![target(
                    "Person",
                    vec![node("address", vec![node("street", vec![])])],
                )],
            ),
            policy(
                "C",
                vec![target(
                    "Group",
                    vec![node("members", vec![node("address", vec![node("city", vec![])])])],
                )],
            ),
        ];

        let validation = IngressValidation::new(&policies, &schemas).unwrap();
        let person = validation.restricted_schema("Person").unwrap();
        assert_eq!(person.field_names(), vec!["phone", "address"]);
        assert!(validation.allows("Person", &["address", "street"]));
        assert!(validation.allows("Person", &["address", "city"]));
        assert!(!validation.allows("Person", &["name"]));
        assert_eq!(
            validation.restricted_schema("Address").unwrap().field_names(),
            vec!["street", "city"]
        );
    }

    #[test]
    fn test_allows_follows_references_to_their_entry() {
        let schemas = catalog();
        let policies = vec![policy(
            "A",
            vec![target(
                "Group",
                vec![node("members", vec![]), node("title", vec![])],
            )],
        )];

        let validation = IngressValidation::new(&policies, &schemas).unwrap();
        assert!(validation.allows("Group", &["members", "address", "city"]));
        assert!(validation.allows("Group", &["members", "name", "last"]));
        assert!(validation.allows("Person", &["address", "street"]));
        assert!(!validation.allows("Group", &["members", "email"]));
        assert!(!validation.allows("Group", &["title", "text"]));
        assert!(!validation.allows("Address", &["zip"]));
    }

    #[test]
    fn test_capabilities_per_root() {
        let schemas = catalog();
        let mut person = target("Person", vec![node("phone", vec![])]);
        person.retentions = vec![PolicyRetention {
            medium: StorageMedium::Ram,
            encryption_required: false,
        }];
        person.max_age = Ttl::days(1);

        let validation = IngressValidation::new(&[policy("A", vec![person])], &schemas).unwrap();
        assert_eq!(validation.capabilities("Person").len(), 1);
        assert_eq!(
            validation.capabilities("Person")[0].to_string(),
            "{InMemory, Unencrypted, Ttl(1d)}"
        );
        assert!(validation.capabilities("Group").is_empty());
    }

    #[test]
    fn test_empty_policy_set() {
        let validation = IngressValidation::new(&[], &catalog()).unwrap();
        assert!(validation.is_empty());
        assert_eq!(validation.fingerprint().len(), 43);
        assert_eq!(
            validation.fingerprint(),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn test_fingerprint_tracks_policy_text() {
        let schemas = catalog();
        let a = IngressValidation::new(
            &[policy("A", vec![target("Person", vec![node("phone", vec![])])])],
            &schemas,
        )
        .unwrap();
        let b = IngressValidation::new(
            &[policy("B", vec![target("Person", vec![node("phone", vec![])])])],
            &schemas,
        )
        .unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
