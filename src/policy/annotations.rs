//! Annotation parameter extraction
//!
//! Known annotations accept named or positional parameters; positional
//! parameters bind in the declared order.

use crate::manifest::ast::{AnnotationNode, Literal};

use super::errors::{PolicyError, PolicyResult};
use super::types::CustomAnnotation;

pub(crate) const INTENDED_PURPOSE: &str = "intendedPurpose";
pub(crate) const EGRESS_TYPE: &str = "egressType";
pub(crate) const ALLOWED_RETENTION: &str = "allowedRetention";
pub(crate) const MAX_AGE: &str = "maxAge";
pub(crate) const ALLOWED_USAGE: &str = "allowedUsage";

/// Name a lone positional parameter of a custom annotation is stored under
pub(crate) const DEFAULT_PARAM: &str = "value";

/// Parameter view over a known annotation
pub(crate) struct AnnotationArgs<'a> {
    node: &'a AnnotationNode,
    positional: &'static [&'static str],
}

impl<'a> AnnotationArgs<'a> {
    pub(crate) fn new(node: &'a AnnotationNode, positional: &'static [&'static str]) -> Self {
        Self { node, positional }
    }

    fn get(&self, param: &str) -> Option<&'a Literal> {
        self.node.args.iter().enumerate().find_map(|(i, arg)| {
            let matches = match &arg.name {
                Some(name) => name == param,
                None => self.positional.get(i) == Some(&param),
            };
            matches.then_some(&arg.value)
        })
    }

    fn require(&self, param: &str) -> PolicyResult<&'a Literal> {
        self.get(param).ok_or_else(|| PolicyError::MissingParameter {
            annotation: self.node.name.clone(),
            param: param.to_string(),
        })
    }

    pub(crate) fn text(&self, param: &str) -> PolicyResult<&'a str> {
        self.require(param)?
            .as_text()
            .ok_or_else(|| self.invalid(param, "text"))
    }

    pub(crate) fn boolean(&self, param: &str) -> PolicyResult<bool> {
        self.require(param)?
            .as_bool()
            .ok_or_else(|| self.invalid(param, "a boolean"))
    }

    fn invalid(&self, param: &str, expected: &'static str) -> PolicyError {
        PolicyError::InvalidParameter {
            annotation: self.node.name.clone(),
            param: param.to_string(),
            expected,
        }
    }
}

/// Converts an uninterpreted annotation into its stored form.
pub(crate) fn to_custom(node: &AnnotationNode) -> PolicyResult<CustomAnnotation> {
    let positional = node.args.iter().filter(|a| a.name.is_none()).count();
    if positional > 1 || (positional == 1 && node.args.len() > 1) {
        return Err(PolicyError::UnnamedParameters(node.name.clone()));
    }

    let params = node
        .args
        .iter()
        .map(|arg| {
            let name = arg.name.as_deref().unwrap_or(DEFAULT_PARAM).to_string();
            (name, arg.value.clone())
        })
        .collect();

    Ok(CustomAnnotation {
        name: node.name.clone(),
        params,
    })
}

/// Fails if the once-only annotation `name` already filled `slot`.
pub(crate) fn ensure_unset<T>(slot: &Option<T>, name: &str) -> PolicyResult<()> {
    match slot {
        Some(_) => Err(PolicyError::DuplicateAnnotation(name.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_positional_binding() {
        let named = AnnotationNode::new("allowedRetention")
            .with_arg(Some("encryption"), Literal::Bool(true))
            .with_arg(Some("medium"), Literal::Text("Disk".into()));
        let args = AnnotationArgs::new(&named, &["medium", "encryption"]);
        assert_eq!(args.text("medium").unwrap(), "Disk");
        assert!(args.boolean("encryption").unwrap());

        let positional = AnnotationNode::new("allowedRetention")
            .with_arg(None, Literal::Text("Ram".into()))
            .with_arg(None, Literal::Bool(false));
        let args = AnnotationArgs::new(&positional, &["medium", "encryption"]);
        assert_eq!(args.text("medium").unwrap(), "Ram");
        assert!(!args.boolean("encryption").unwrap());
    }

    #[test]
    fn test_missing_and_mistyped_parameters() {
        let node = AnnotationNode::new("allowedRetention").with_arg(None, Literal::Int(1));
        let args = AnnotationArgs::new(&node, &["medium", "encryption"]);

        assert_eq!(
            args.text("medium").unwrap_err().to_string(),
            "Parameter 'medium' of @allowedRetention must be text."
        );
        assert_eq!(
            args.boolean("encryption").unwrap_err().to_string(),
            "Annotation @allowedRetention is missing parameter 'encryption'."
        );
    }

    #[test]
    fn test_custom_annotation_params() {
        let single = AnnotationNode::new("owner").with_arg(None, Literal::Text("core".into()));
        let custom = to_custom(&single).unwrap();
        assert_eq!(custom.param(DEFAULT_PARAM), Some(&Literal::Text("core".into())));

        let mixed = AnnotationNode::new("owner")
            .with_arg(None, Literal::Text("core".into()))
            .with_arg(Some("size"), Literal::Int(3));
        assert_eq!(
            to_custom(&mixed).unwrap_err(),
            PolicyError::UnnamedParameters("owner".into())
        );
    }

    #[test]
    fn test_once_only_slots() {
        let empty: Option<&str> = None;
        assert!(ensure_unset(&empty, EGRESS_TYPE).is_ok());

        assert_eq!(
            ensure_unset(&Some("2d"), MAX_AGE).unwrap_err().to_string(),
            "Annotation @maxAge may only be declared once."
        );
    }
}
