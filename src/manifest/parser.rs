//! Parser for the policy manifest notation.
//!
//! Uses a pest grammar (`policy.pest`) and converts the parse tree into the
//! declaration tree in [`ast`](super::ast).

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::ast::{
    AnnotationArg, AnnotationNode, ConfigNode, FieldNode, Literal, ManifestNode, PolicyMember,
    PolicyNode, TargetNode,
};
use super::errors::{ManifestError, ManifestResult};

/// Parser for the policy manifest grammar.
#[derive(Parser)]
#[grammar = "manifest/policy.pest"]
pub struct ManifestParser;

/// Parses manifest text into a declaration tree.
pub fn parse_manifest(input: &str) -> ManifestResult<ManifestNode> {
    let mut pairs =
        ManifestParser::parse(Rule::manifest, input).map_err(ManifestError::from_pest)?;

    let root = pairs
        .next()
        .ok_or_else(|| ManifestError::syntax(1, 1, "empty parse result"))?;

    let mut policies = Vec::new();
    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::policy => policies.push(build_policy(pair)?),
            Rule::EOI => {}
            _ => return Err(unexpected(&pair)),
        }
    }

    Ok(ManifestNode { policies })
}

fn build_policy(pair: Pair<Rule>) -> ManifestResult<PolicyNode> {
    let mut node = PolicyNode {
        name: String::new(),
        annotations: Vec::new(),
        members: Vec::new(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => node.annotations.push(build_annotation(inner)?),
            Rule::kw_policy => {}
            Rule::ident => node.name = inner.as_str().to_string(),
            Rule::target => node.members.push(PolicyMember::Target(build_target(inner)?)),
            Rule::config => node.members.push(PolicyMember::Config(build_config(inner)?)),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(node)
}

fn build_target(pair: Pair<Rule>) -> ManifestResult<TargetNode> {
    let mut node = TargetNode {
        schema_name: String::new(),
        annotations: Vec::new(),
        fields: Vec::new(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => node.annotations.push(build_annotation(inner)?),
            Rule::kw_from | Rule::kw_access => {}
            Rule::ident => node.schema_name = inner.as_str().to_string(),
            Rule::field_block => node.fields = build_field_block(inner)?,
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(node)
}

fn build_field_block(pair: Pair<Rule>) -> ManifestResult<Vec<FieldNode>> {
    pair.into_inner().map(build_field).collect()
}

fn build_field(pair: Pair<Rule>) -> ManifestResult<FieldNode> {
    if pair.as_rule() != Rule::field {
        return Err(unexpected(&pair));
    }

    let mut node = FieldNode {
        name: String::new(),
        annotations: Vec::new(),
        subfields: None,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => node.annotations.push(build_annotation(inner)?),
            Rule::ident => node.name = inner.as_str().to_string(),
            Rule::field_block => node.subfields = Some(build_field_block(inner)?),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(node)
}

fn build_config(pair: Pair<Rule>) -> ManifestResult<ConfigNode> {
    let mut node = ConfigNode {
        name: String::new(),
        entries: Vec::new(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_config => {}
            Rule::ident => node.name = inner.as_str().to_string(),
            Rule::config_entry => {
                let mut key = String::new();
                let mut value = String::new();
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::ident => key = part.as_str().to_string(),
                        Rule::string => value = unquote(part),
                        _ => return Err(unexpected(&part)),
                    }
                }
                node.entries.push((key, value));
            }
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(node)
}

fn build_annotation(pair: Pair<Rule>) -> ManifestResult<AnnotationNode> {
    let mut node = AnnotationNode::new(String::new());

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation_name => {
                // `@` is part of the atomic rule; only the ident is emitted.
                node.name = inner
                    .into_inner()
                    .next()
                    .map(|ident| ident.as_str().to_string())
                    .unwrap_or_default();
            }
            Rule::annotation_arg => node.args.push(build_annotation_arg(inner)?),
            _ => return Err(unexpected(&inner)),
        }
    }

    Ok(node)
}

fn build_annotation_arg(pair: Pair<Rule>) -> ManifestResult<AnnotationArg> {
    let (line, column) = pair.as_span().start_pos().line_col();
    let mut name = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::string | Rule::boolean | Rule::integer => value = Some(build_literal(inner)?),
            _ => return Err(unexpected(&inner)),
        }
    }

    let value = value
        .ok_or_else(|| ManifestError::syntax(line, column, "annotation argument without value"))?;
    Ok(AnnotationArg { name, value })
}

fn build_literal(pair: Pair<Rule>) -> ManifestResult<Literal> {
    match pair.as_rule() {
        Rule::string => Ok(Literal::Text(unquote(pair))),
        Rule::boolean => Ok(Literal::Bool(pair.as_str() == "true")),
        Rule::integer => pair.as_str().parse::<i64>().map(Literal::Int).map_err(|e| {
            let (line, column) = pair.as_span().start_pos().line_col();
            ManifestError::syntax(line, column, format!("invalid integer: {}", e))
        }),
        _ => Err(unexpected(&pair)),
    }
}

/// Returns the unescaped contents of a quoted string pair.
fn unquote(pair: Pair<Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or("");

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn unexpected(pair: &Pair<Rule>) -> ManifestError {
    let (line, column) = pair.as_span().start_pos().line_col();
    ManifestError::syntax(line, column, format!("unexpected {:?}", pair.as_rule()))
}
