//! Declaration tree produced by the manifest parser.
//!
//! Nodes carry names and annotations exactly as written. Semantic checks
//! (schema resolution, closed enums, uniqueness) happen in the policy builders.

use std::fmt;

use serde::Serialize;

/// Literal value of an annotation parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl Literal {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the kind name used in parameter errors
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Text(_) => "text",
            Literal::Int(_) => "an integer",
            Literal::Bool(_) => "a boolean",
        }
    }
}

/// Formats the literal in manifest syntax, quoting and escaping text.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "'")
            }
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One annotation argument, named (`medium: 'Disk'`) or positional (`'2d'`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArg {
    pub name: Option<String>,
    pub value: Literal,
}

/// `@name(args...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationNode {
    pub name: String,
    pub args: Vec<AnnotationArg>,
}

impl AnnotationNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, name: Option<&str>, value: Literal) -> Self {
        self.args.push(AnnotationArg {
            name: name.map(str::to_string),
            value,
        });
        self
    }
}

/// Field selection: `name,` or `name { subfields }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    pub name: String,
    pub annotations: Vec<AnnotationNode>,
    /// `None` when no block follows the name
    pub subfields: Option<Vec<FieldNode>>,
}

/// `from <Schema> access { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNode {
    pub schema_name: String,
    pub annotations: Vec<AnnotationNode>,
    pub fields: Vec<FieldNode>,
}

/// `config <Name> { key: 'value' }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// Target or config block inside a policy body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyMember {
    Target(TargetNode),
    Config(ConfigNode),
}

/// `policy <Name> { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyNode {
    pub name: String,
    pub annotations: Vec<AnnotationNode>,
    /// Body blocks exactly as interleaved in the source
    pub members: Vec<PolicyMember>,
}

impl PolicyNode {
    pub fn targets(&self) -> impl Iterator<Item = &TargetNode> {
        self.members.iter().filter_map(|member| match member {
            PolicyMember::Target(target) => Some(target),
            PolicyMember::Config(_) => None,
        })
    }

    pub fn configs(&self) -> impl Iterator<Item = &ConfigNode> {
        self.members.iter().filter_map(|member| match member {
            PolicyMember::Config(config) => Some(config),
            PolicyMember::Target(_) => None,
        })
    }
}

/// Root of one parsed manifest
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestNode {
    pub policies: Vec<PolicyNode>,
}
