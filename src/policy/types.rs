//! Policy model
//!
//! Values are built once by the builders in this module's parent and are
//! immutable afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::manifest::ast::Literal;

use super::enums::{StorageMedium, Ttl, UsageType};

/// Annotation the policy engine does not interpret, kept for re-emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomAnnotation {
    pub name: String,
    /// Parameters in declaration order
    pub params: Vec<(String, Literal)>,
}

impl CustomAnnotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&Literal> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Permitted `(usage, label)` combination on a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AllowedUsage {
    pub usage: UsageType,
    pub label: String,
}

impl AllowedUsage {
    pub fn new(usage: UsageType, label: impl Into<String>) -> Self {
        Self {
            usage,
            label: label.into(),
        }
    }

    /// The entry synthesized for fields without `@allowedUsage`
    pub fn unrestricted() -> Self {
        Self::new(UsageType::Any, "")
    }
}

/// Storage medium plus encryption requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyRetention {
    pub medium: StorageMedium,
    pub encryption_required: bool,
}

/// One selected field, recursively
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyField {
    pub name: String,
    pub allowed_usages: Vec<AllowedUsage>,
    pub custom_annotations: Vec<CustomAnnotation>,
    /// Empty for a leaf selection
    pub subfields: Vec<PolicyField>,
}

impl PolicyField {
    /// Leaf field with the default usage
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_usages: vec![AllowedUsage::unrestricted()],
            custom_annotations: Vec::new(),
            subfields: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.subfields.is_empty()
    }

    pub fn subfield(&self, name: &str) -> Option<&PolicyField> {
        self.subfields.iter().find(|f| f.name == name)
    }

    /// Usage types allowed on the raw (unlabelled) value
    pub fn raw_usages(&self) -> BTreeSet<UsageType> {
        self.allowed_usages
            .iter()
            .filter(|u| u.label.is_empty())
            .map(|u| u.usage)
            .collect()
    }

    /// Usage types allowed per redaction label
    pub fn redacted_usages(&self) -> BTreeMap<String, BTreeSet<UsageType>> {
        let mut out: BTreeMap<String, BTreeSet<UsageType>> = BTreeMap::new();
        for usage in self.allowed_usages.iter().filter(|u| !u.label.is_empty()) {
            out.entry(usage.label.clone()).or_default().insert(usage.usage);
        }
        out
    }

    fn collect<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a PolicyField)>) {
        let path = format!("{}.{}", prefix, self.name);
        for subfield in &self.subfields {
            subfield.collect(&path, out);
        }
        out.push((path, self));
    }
}

/// Rules governing one schema within a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyTarget {
    pub schema_name: String,
    pub retentions: Vec<PolicyRetention>,
    pub max_age: Ttl,
    pub custom_annotations: Vec<CustomAnnotation>,
    pub fields: Vec<PolicyField>,
}

impl PolicyTarget {
    pub fn field(&self, name: &str) -> Option<&PolicyField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Named key/value block inside a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    pub name: String,
    /// Entries in declaration order
    pub metadata: Vec<(String, String)>,
}

impl PolicyConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A named bundle of purpose, retention and per-field usage rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub name: String,
    pub description: Option<String>,
    pub egress_type: Option<String>,
    pub custom_annotations: Vec<CustomAnnotation>,
    pub targets: Vec<PolicyTarget>,
    pub configs: Vec<PolicyConfig>,
}

impl Policy {
    pub fn target(&self, schema_name: &str) -> Option<&PolicyTarget> {
        self.targets.iter().find(|t| t.schema_name == schema_name)
    }

    pub fn config(&self, name: &str) -> Option<&PolicyConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Every field of every target with its dotted path (`Person.address.city`).
    ///
    /// Subfields are listed before their parent.
    pub fn all_fields(&self) -> Vec<(String, &PolicyField)> {
        let mut out = Vec::new();
        for target in &self.targets {
            for field in &target.fields {
                field.collect(&target.schema_name, &mut out);
            }
        }
        out
    }

    /// Every non-empty usage label used anywhere in the policy
    pub fn all_redaction_labels(&self) -> BTreeSet<String> {
        self.all_fields()
            .into_iter()
            .flat_map(|(_, field)| field.allowed_usages.iter())
            .filter(|u| !u.label.is_empty())
            .map(|u| u.label.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy() -> Policy {
        let mut city = PolicyField::leaf("city");
        city.allowed_usages = vec![
            AllowedUsage::new(UsageType::Join, "truncated"),
            AllowedUsage::new(UsageType::Egress, "truncated"),
            AllowedUsage::new(UsageType::Any, ""),
        ];
        let mut address = PolicyField::leaf("address");
        address.subfields = vec![city];

        let mut name = PolicyField::leaf("name");
        name.allowed_usages = vec![AllowedUsage::new(UsageType::Egress, "hashed")];

        Policy {
            name: "P".into(),
            description: None,
            egress_type: None,
            custom_annotations: vec![],
            targets: vec![PolicyTarget {
                schema_name: "Person".into(),
                retentions: vec![],
                max_age: Ttl::zero(),
                custom_annotations: vec![],
                fields: vec![name, address],
            }],
            configs: vec![PolicyConfig {
                name: "Storage".into(),
                metadata: vec![("engine".into(), "sled".into())],
            }],
        }
    }

    #[test]
    fn test_all_fields_paths() {
        let policy = sample_policy();
        let paths: Vec<_> = policy.all_fields().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec!["Person.name", "Person.address.city", "Person.address"]
        );
    }

    #[test]
    fn test_redaction_labels() {
        let policy = sample_policy();
        let labels: Vec<_> = policy.all_redaction_labels().into_iter().collect();
        assert_eq!(labels, vec!["hashed", "truncated"]);
    }

    #[test]
    fn test_raw_and_redacted_usages() {
        let policy = sample_policy();
        let city = policy.targets[0].field("address").unwrap().subfield("city").unwrap();

        assert_eq!(city.raw_usages().into_iter().collect::<Vec<_>>(), vec![UsageType::Any]);
        let redacted = city.redacted_usages();
        assert_eq!(
            redacted["truncated"].iter().copied().collect::<Vec<_>>(),
            vec![UsageType::Egress, UsageType::Join]
        );
    }

    #[test]
    fn test_lookups() {
        let policy = sample_policy();
        assert!(policy.target("Person").is_some());
        assert!(policy.target("Address").is_none());
        assert_eq!(policy.config("Storage").unwrap().get("engine"), Some("sled"));
        assert!(PolicyField::leaf("x").is_leaf());
    }
}
