//! Builders turning declaration nodes into the policy model
//!
//! A single pass over the declaration tree, in source order: a node's
//! annotations first, then its name, then its body. Every failure aborts the
//! build, so the caller sees the first violation as written; nothing
//! partially built escapes.

use std::collections::HashSet;

use crate::manifest::ast::{
    AnnotationNode, ConfigNode, FieldNode, PolicyMember, PolicyNode, TargetNode,
};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{Schema, SchemaLookup};

use super::annotations::{
    ensure_unset, to_custom, AnnotationArgs, ALLOWED_RETENTION, ALLOWED_USAGE, EGRESS_TYPE,
    INTENDED_PURPOSE, MAX_AGE,
};
use super::enums::{StorageMedium, Ttl, UsageType};
use super::errors::{PolicyError, PolicyResult};
use super::types::{
    AllowedUsage, CustomAnnotation, Policy, PolicyConfig, PolicyField, PolicyRetention,
    PolicyTarget,
};

/// Names already claimed within one scope of a build pass.
#[derive(Debug, Default)]
pub(crate) struct SeenNames(HashSet<String>);

impl SeenNames {
    /// Claims `name`, failing with `duplicate` if it was claimed before.
    pub(crate) fn claim(
        &mut self,
        name: &str,
        duplicate: impl FnOnce() -> PolicyError,
    ) -> PolicyResult<()> {
        if self.0.insert(name.to_string()) {
            Ok(())
        } else {
            Err(duplicate())
        }
    }
}

/// Builds policies against an injected schema catalog.
pub struct PolicyBuilder<'a> {
    schemas: &'a dyn SchemaLookup,
}

impl<'a> PolicyBuilder<'a> {
    pub fn new(schemas: &'a dyn SchemaLookup) -> Self {
        Self { schemas }
    }

    /// Builds a single policy from its declaration.
    pub fn build(&self, node: &PolicyNode) -> PolicyResult<Policy> {
        self.build_unique(node, &mut SeenNames::default())
    }

    /// Builds a policy whose name must not already be in `seen_policies`.
    pub(crate) fn build_unique(
        &self,
        node: &PolicyNode,
        seen_policies: &mut SeenNames,
    ) -> PolicyResult<Policy> {
        let mut description = None;
        let mut egress_type = None;
        let mut custom_annotations = Vec::new();

        for annotation in &node.annotations {
            match annotation.name.as_str() {
                INTENDED_PURPOSE => {
                    ensure_unset(&description, INTENDED_PURPOSE)?;
                    let args = AnnotationArgs::new(annotation, &["description"]);
                    description = Some(args.text("description")?.to_string());
                }
                EGRESS_TYPE => {
                    ensure_unset(&egress_type, EGRESS_TYPE)?;
                    let args = AnnotationArgs::new(annotation, &["type"]);
                    egress_type = Some(args.text("type")?.to_string());
                }
                _ => custom_annotations.push(to_custom(annotation)?),
            }
        }

        seen_policies.claim(&node.name, || PolicyError::DuplicatePolicy(node.name.clone()))?;

        let mut seen_targets = SeenNames::default();
        let mut seen_configs = SeenNames::default();
        let mut targets = Vec::new();
        let mut configs = Vec::new();
        for member in &node.members {
            match member {
                PolicyMember::Target(target) => {
                    targets.push(self.build_target_in(target, &mut seen_targets)?)
                }
                PolicyMember::Config(config) => {
                    seen_configs.claim(&config.name, || {
                        PolicyError::DuplicateDefinition(config.name.clone())
                    })?;
                    configs.push(build_config(config)?);
                }
            }
        }

        let policy = Policy {
            name: node.name.clone(),
            description,
            egress_type,
            custom_annotations,
            targets,
            configs,
        };

        let target_count = policy.targets.len().to_string();
        log_event_with_fields(
            Event::PolicyBuilt,
            &[("policy", policy.name.as_str()), ("targets", target_count.as_str())],
        );
        Ok(policy)
    }

    /// Builds one `from <Schema> access { ... }` block.
    pub fn build_target(&self, node: &TargetNode) -> PolicyResult<PolicyTarget> {
        self.build_target_in(node, &mut SeenNames::default())
    }

    fn build_target_in(
        &self,
        node: &TargetNode,
        seen_targets: &mut SeenNames,
    ) -> PolicyResult<PolicyTarget> {
        let mut retentions = Vec::new();
        let mut seen_mediums = SeenNames::default();
        let mut max_age = None;
        let mut custom_annotations = Vec::new();

        for annotation in &node.annotations {
            match annotation.name.as_str() {
                ALLOWED_RETENTION => {
                    let args = AnnotationArgs::new(annotation, &["medium", "encryption"]);
                    let medium: StorageMedium = args.text("medium")?.parse()?;
                    seen_mediums.claim(medium.as_str(), || {
                        PolicyError::DuplicateRetention(medium.to_string())
                    })?;
                    retentions.push(PolicyRetention {
                        medium,
                        encryption_required: args.boolean("encryption")?,
                    });
                }
                MAX_AGE => {
                    ensure_unset(&max_age, MAX_AGE)?;
                    let age: Ttl = AnnotationArgs::new(annotation, &["age"]).text("age")?.parse()?;
                    max_age = Some(age);
                }
                _ => custom_annotations.push(to_custom(annotation)?),
            }
        }

        seen_targets.claim(&node.schema_name, || {
            PolicyError::DuplicateDefinition(node.schema_name.clone())
        })?;
        let schema = self.resolve(&node.schema_name)?;
        let fields = self.build_fields(&node.fields, schema)?;

        Ok(PolicyTarget {
            schema_name: node.schema_name.clone(),
            retentions,
            max_age: max_age.unwrap_or_else(Ttl::zero),
            custom_annotations,
            fields,
        })
    }

    /// Builds sibling field selections against the schema in scope.
    pub fn build_fields(&self, nodes: &[FieldNode], scope: &Schema) -> PolicyResult<Vec<PolicyField>> {
        let mut seen = SeenNames::default();
        let mut fields = Vec::with_capacity(nodes.len());

        for node in nodes {
            let (allowed_usages, custom_annotations) = field_annotations(&node.annotations)?;

            let field_def = scope.field(&node.name).ok_or_else(|| PolicyError::UnknownField {
                schema: scope.display_name().to_string(),
                field: node.name.clone(),
            })?;
            seen.claim(&node.name, || PolicyError::DuplicateDefinition(node.name.clone()))?;

            let subfields = match &node.subfields {
                Some(children) if !children.is_empty() => {
                    let inner = field_def.field_type.schema_name().ok_or_else(|| {
                        PolicyError::NotCompound {
                            schema: scope.display_name().to_string(),
                            field: node.name.clone(),
                        }
                    })?;
                    self.build_fields(children, self.resolve(inner)?)?
                }
                _ => Vec::new(),
            };

            fields.push(PolicyField {
                name: node.name.clone(),
                allowed_usages,
                custom_annotations,
                subfields,
            });
        }

        Ok(fields)
    }

    fn resolve(&self, name: &str) -> PolicyResult<&'a Schema> {
        self.schemas
            .lookup(name)
            .ok_or_else(|| PolicyError::UnknownSchema(name.to_string()))
    }
}

/// Splits field annotations into usages and custom annotations, in source order.
fn field_annotations(
    annotations: &[AnnotationNode],
) -> PolicyResult<(Vec<AllowedUsage>, Vec<CustomAnnotation>)> {
    let mut usages: Vec<AllowedUsage> = Vec::new();
    let mut custom = Vec::new();

    for annotation in annotations {
        if annotation.name != ALLOWED_USAGE {
            custom.push(to_custom(annotation)?);
            continue;
        }

        let args = AnnotationArgs::new(annotation, &["label", "usageType"]);
        let label = args.text("label")?;
        let usage: UsageType = args.text("usageType")?.parse()?;

        if usages.iter().any(|u| u.usage == usage && u.label == label) {
            return Err(PolicyError::DuplicateUsage {
                label: label.to_string(),
                usage: usage.to_string(),
            });
        }
        usages.push(AllowedUsage::new(usage, label));
    }

    if usages.is_empty() {
        usages.push(AllowedUsage::unrestricted());
    }
    Ok((usages, custom))
}

fn build_config(node: &ConfigNode) -> PolicyResult<PolicyConfig> {
    let mut seen = SeenNames::default();
    for (key, _) in &node.entries {
        seen.claim(key, || PolicyError::DuplicateDefinition(key.clone()))?;
    }

    Ok(PolicyConfig {
        name: node.name.clone(),
        metadata: node.entries.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ast::Literal;
    use crate::schema::{FieldDef, FieldType};
    use std::collections::HashMap;

    fn catalog() -> HashMap<String, Schema> {
        let mut schemas = HashMap::new();
        schemas.insert(
            "Person".to_string(),
            Schema::new(
                "Person",
                vec![
                    FieldDef::text("name"),
                    FieldDef::text("phone"),
                    FieldDef::new("address", FieldType::reference("Address")),
                ],
            ),
        );
        schemas.insert(
            "Address".to_string(),
            Schema::new("Address", vec![FieldDef::text("city"), FieldDef::text("street")]),
        );
        schemas
    }

    fn field(name: &str) -> FieldNode {
        FieldNode {
            name: name.into(),
            annotations: vec![],
            subfields: None,
        }
    }

    fn usage(label: &str, usage_type: &str) -> AnnotationNode {
        AnnotationNode::new(ALLOWED_USAGE)
            .with_arg(Some("label"), Literal::Text(label.into()))
            .with_arg(Some("usageType"), Literal::Text(usage_type.into()))
    }

    fn target(schema: &str, fields: Vec<FieldNode>) -> TargetNode {
        TargetNode {
            schema_name: schema.into(),
            annotations: vec![],
            fields,
        }
    }

    #[test]
    fn test_default_usage() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let built = builder.build_target(&target("Person", vec![field("name")])).unwrap();
        assert_eq!(built.fields[0].allowed_usages, vec![AllowedUsage::new(UsageType::Any, "")]);
        assert_eq!(built.max_age, Ttl::zero());
        assert!(built.retentions.is_empty());
    }

    #[test]
    fn test_usages_in_source_order() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut name = field("name");
        name.annotations = vec![usage("raw", "join"), usage("hashed", "*")];

        let built = builder.build_target(&target("Person", vec![name])).unwrap();
        assert_eq!(
            built.fields[0].allowed_usages,
            vec![
                AllowedUsage::new(UsageType::Join, "raw"),
                AllowedUsage::new(UsageType::Any, "hashed"),
            ]
        );
    }

    #[test]
    fn test_duplicate_usage() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut name = field("name");
        name.annotations = vec![usage("raw", "join"), usage("raw", "join")];

        let err = builder.build_target(&target("Person", vec![name])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Usage of label 'raw' for usage type 'join' has already been allowed."
        );
    }

    #[test]
    fn test_subfields_resolve_nested_schema() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut address = field("address");
        address.subfields = Some(vec![field("city")]);

        let built = builder.build_target(&target("Person", vec![address])).unwrap();
        assert_eq!(built.fields[0].subfields[0].name, "city");

        let mut bad = field("address");
        bad.subfields = Some(vec![field("country")]);
        let err = builder.build_target(&target("Person", vec![bad])).unwrap_err();
        assert_eq!(err.to_string(), "Schema 'Address' does not contain field 'country'");
    }

    #[test]
    fn test_subfields_on_primitive() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut name = field("name");
        name.subfields = Some(vec![field("first")]);

        let err = builder.build_target(&target("Person", vec![name])).unwrap_err();
        assert_eq!(err.to_string(), "Field 'name' of schema 'Person' has no subfields.");
    }

    #[test]
    fn test_empty_block_is_leaf() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut address = field("address");
        address.subfields = Some(vec![]);

        let built = builder.build_target(&target("Person", vec![address])).unwrap();
        assert!(built.fields[0].is_leaf());
    }

    #[test]
    fn test_retentions_and_max_age() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut node = target("Person", vec![field("name")]);
        node.annotations = vec![
            AnnotationNode::new(ALLOWED_RETENTION)
                .with_arg(Some("medium"), Literal::Text("Disk".into()))
                .with_arg(Some("encryption"), Literal::Bool(true)),
            AnnotationNode::new(ALLOWED_RETENTION)
                .with_arg(None, Literal::Text("Ram".into()))
                .with_arg(None, Literal::Bool(false)),
            AnnotationNode::new(MAX_AGE).with_arg(None, Literal::Text("3h".into())),
        ];

        let built = builder.build_target(&node).unwrap();
        assert_eq!(built.retentions.len(), 2);
        assert_eq!(built.retentions[0].medium, StorageMedium::Disk);
        assert!(built.retentions[0].encryption_required);
        assert_eq!(built.retentions[1].medium, StorageMedium::Ram);
        assert_eq!(built.max_age, Ttl::hours(3));
    }

    #[test]
    fn test_policy_annotations() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let node = PolicyNode {
            name: "P".into(),
            annotations: vec![
                AnnotationNode::new("audited"),
                AnnotationNode::new(INTENDED_PURPOSE).with_arg(None, Literal::Text("Ads".into())),
                AnnotationNode::new(EGRESS_TYPE)
                    .with_arg(Some("type"), Literal::Text("Anything".into())),
            ],
            members: vec![PolicyMember::Target(target("Person", vec![field("name")]))],
        };

        let policy = builder.build(&node).unwrap();
        assert_eq!(policy.description.as_deref(), Some("Ads"));
        assert_eq!(policy.egress_type.as_deref(), Some("Anything"));
        assert_eq!(policy.custom_annotations, vec![CustomAnnotation::new("audited")]);
    }

    #[test]
    fn test_target_annotations_checked_in_source_order() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let mut node = target("Person", vec![field("name")]);
        node.annotations = vec![
            AnnotationNode::new(MAX_AGE).with_arg(None, Literal::Text("zz".into())),
            AnnotationNode::new(ALLOWED_RETENTION)
                .with_arg(Some("medium"), Literal::Text("Tape".into()))
                .with_arg(Some("encryption"), Literal::Bool(true)),
        ];
        assert_eq!(builder.build_target(&node).unwrap_err().to_string(), "Invalid ttl: zz");

        node.annotations.reverse();
        assert_eq!(
            builder.build_target(&node).unwrap_err().to_string(),
            "Expected one of: Ram, Disk. Found: Tape."
        );
    }

    #[test]
    fn test_members_checked_in_source_order() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let config = ConfigNode {
            name: "C".into(),
            entries: vec![("a".into(), "x".into()), ("a".into(), "y".into())],
        };
        let mut node = PolicyNode {
            name: "P".into(),
            annotations: vec![],
            members: vec![
                PolicyMember::Config(config),
                PolicyMember::Target(target("Ghost", vec![field("phone")])),
            ],
        };
        assert_eq!(
            builder.build(&node).unwrap_err(),
            PolicyError::DuplicateDefinition("a".into())
        );

        node.members.reverse();
        assert_eq!(
            builder.build(&node).unwrap_err(),
            PolicyError::UnknownSchema("Ghost".into())
        );
    }

    #[test]
    fn test_policy_name_claimed_after_annotations() {
        let schemas = catalog();
        let builder = PolicyBuilder::new(&schemas);
        let node = PolicyNode {
            name: "P".into(),
            annotations: vec![AnnotationNode::new(INTENDED_PURPOSE).with_arg(None, Literal::Int(1))],
            members: vec![],
        };

        let mut seen = SeenNames::default();
        seen.claim("P", || PolicyError::DuplicatePolicy("P".into())).unwrap();
        assert_eq!(
            builder.build_unique(&node, &mut seen).unwrap_err().to_string(),
            "Parameter 'description' of @intendedPurpose must be text."
        );
    }

    #[test]
    fn test_duplicate_config_key() {
        let node = ConfigNode {
            name: "C".into(),
            entries: vec![("a".into(), "1".into()), ("a".into(), "2".into())],
        };
        assert_eq!(
            build_config(&node).unwrap_err(),
            PolicyError::DuplicateDefinition("a".into())
        );
    }
}
