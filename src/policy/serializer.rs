//! Canonical manifest text for built policies
//!
//! Output re-parses to an equal policy and re-serializes byte-identically.
//! Declaration order is kept everywhere; nothing is sorted.

use crate::manifest::ast::Literal;

use super::annotations::{
    ALLOWED_RETENTION, ALLOWED_USAGE, DEFAULT_PARAM, EGRESS_TYPE, INTENDED_PURPOSE, MAX_AGE,
};
use super::types::{AllowedUsage, CustomAnnotation, Policy, PolicyConfig, PolicyField, PolicyTarget};

const INDENT: &str = "  ";

/// Line writer that tracks nesting depth
#[derive(Debug, Default)]
struct IndentingWriter {
    out: String,
    depth: usize,
}

impl IndentingWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Renders policies as one manifest, separated by blank lines.
pub fn policies_to_string(policies: &[Policy]) -> String {
    policies
        .iter()
        .map(Policy::to_manifest_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Policy {
    pub fn to_manifest_string(&self) -> String {
        let mut w = IndentingWriter::default();
        write_policy(&mut w, self);
        w.finish()
    }
}

impl PolicyTarget {
    pub fn to_manifest_string(&self) -> String {
        let mut w = IndentingWriter::default();
        write_target(&mut w, self);
        w.finish()
    }
}

impl PolicyField {
    pub fn to_manifest_string(&self) -> String {
        let mut w = IndentingWriter::default();
        write_field(&mut w, self);
        w.finish()
    }
}

impl PolicyConfig {
    pub fn to_manifest_string(&self) -> String {
        let mut w = IndentingWriter::default();
        write_config(&mut w, self);
        w.finish()
    }
}

fn write_policy(w: &mut IndentingWriter, policy: &Policy) {
    if let Some(description) = &policy.description {
        w.line(&format!("@{}({})", INTENDED_PURPOSE, text(description)));
    }
    if let Some(egress_type) = &policy.egress_type {
        w.line(&format!("@{}({})", EGRESS_TYPE, text(egress_type)));
    }
    for custom in &policy.custom_annotations {
        w.line(&custom_annotation(custom));
    }

    w.line(&format!("policy {} {{", policy.name));
    w.indented(|w| {
        for target in &policy.targets {
            write_target(w, target);
        }
        for config in &policy.configs {
            write_config(w, config);
        }
    });
    w.line("}");
}

fn write_target(w: &mut IndentingWriter, target: &PolicyTarget) {
    for retention in &target.retentions {
        w.line(&format!(
            "@{}(medium: {}, encryption: {})",
            ALLOWED_RETENTION,
            text(retention.medium.as_str()),
            retention.encryption_required
        ));
    }
    if !target.max_age.is_zero() {
        w.line(&format!("@{}({})", MAX_AGE, text(&target.max_age.to_string())));
    }
    for custom in &target.custom_annotations {
        w.line(&custom_annotation(custom));
    }

    w.line(&format!("from {} access {{", target.schema_name));
    w.indented(|w| {
        for field in &target.fields {
            write_field(w, field);
        }
    });
    w.line("}");
}

fn write_field(w: &mut IndentingWriter, field: &PolicyField) {
    if !is_default_usage(&field.allowed_usages) {
        for usage in &field.allowed_usages {
            w.line(&format!(
                "@{}(label: {}, usageType: {})",
                ALLOWED_USAGE,
                text(&usage.label),
                text(usage.usage.as_str())
            ));
        }
    }
    for custom in &field.custom_annotations {
        w.line(&custom_annotation(custom));
    }

    if field.is_leaf() {
        w.line(&format!("{},", field.name));
    } else {
        w.line(&format!("{} {{", field.name));
        w.indented(|w| {
            for subfield in &field.subfields {
                write_field(w, subfield);
            }
        });
        w.line("},");
    }
}

fn write_config(w: &mut IndentingWriter, config: &PolicyConfig) {
    w.line(&format!("config {} {{", config.name));
    w.indented(|w| {
        for (key, value) in &config.metadata {
            w.line(&format!("{}: {}", key, text(value)));
        }
    });
    w.line("}");
}

/// `@name`, `@name(<value>)` or `@name(k: v, ...)`
fn custom_annotation(custom: &CustomAnnotation) -> String {
    match custom.params.as_slice() {
        [] => format!("@{}", custom.name),
        [(name, value)] if name == DEFAULT_PARAM => format!("@{}({})", custom.name, value),
        params => {
            let args: Vec<String> = params
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect();
            format!("@{}({})", custom.name, args.join(", "))
        }
    }
}

fn is_default_usage(usages: &[AllowedUsage]) -> bool {
    matches!(usages, [only] if *only == AllowedUsage::unrestricted())
}

fn text(value: &str) -> Literal {
    Literal::Text(value.to_string())
}
