//! Factory parameter templates
//!
//! A factory class declares which positional parameters its constructor
//! takes as a template over the construction context: the raw property
//! value, the parent snapshot, the (cleaned) argument sub-map, a named
//! argument, or a literal null. Templates keep factories uniform enough to
//! dispatch through a single table.

use serde_json::Value;

use crate::args::ArgMap;

use super::context::{BuildContext, ParentRef};

/// One slot of a factory's parameter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// The containing property's raw value.
    Value,
    /// The owner snapshot.
    Parent,
    /// The argument sub-map, with context and audit keys stripped.
    Args,
    /// A named argument, falling back to the annotation's custom bag.
    Named(&'static str),
    /// Always null.
    Null,
}

/// A realized parameter.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Value(Value),
    Parent(ParentRef),
    Args(ArgMap),
    Null,
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Value(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ParamValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_args(self) -> ArgMap {
        match self {
            ParamValue::Args(args) => args,
            ParamValue::Value(v) => ArgMap::from_value(&v),
            _ => ArgMap::new(),
        }
    }

    pub fn into_parent(self) -> ParentRef {
        match self {
            ParamValue::Parent(parent) => parent,
            _ => ParentRef::None,
        }
    }
}

/// Realize a parameter template against a construction context.
///
/// A named parameter found in neither the argument sub-map nor the custom
/// bag is reported and realized as null; a broken template must degrade, not
/// abort the build.
pub fn build_parameters(
    template: &[ParamSpec],
    object_args: &ArgMap,
    ctx: &BuildContext,
) -> Vec<ParamValue> {
    template
        .iter()
        .map(|spec| match spec {
            ParamSpec::Value => ParamValue::Value(ctx.value.clone()),
            ParamSpec::Parent => ParamValue::Parent(ctx.parent.clone()),
            ParamSpec::Args => {
                let mut args = object_args.clone();
                args.strip_reserved();
                ParamValue::Args(args)
            }
            ParamSpec::Named(name) => match object_args.get(name).or_else(|| ctx.custom.get(name))
            {
                Some(value) => ParamValue::Value(value.clone()),
                None => {
                    tracing::warn!("Unknown factory parameter '{}'", name);
                    ParamValue::Null
                }
            },
            ParamSpec::Null => ParamValue::Null,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_parameter_resolution() {
        let args = ArgMap::from([("view_type", json!("text"))]);
        let ctx = BuildContext::default();

        let params = build_parameters(&[ParamSpec::Named("view_type")], &args, &ctx);
        assert_eq!(params[0].as_str(), Some("text"));
    }

    #[test]
    fn test_named_parameter_custom_bag_fallback() {
        let ctx = BuildContext {
            custom: ArgMap::from([("html_tag", json!("label"))]),
            ..Default::default()
        };

        let params = build_parameters(&[ParamSpec::Named("html_tag")], &ArgMap::new(), &ctx);
        assert_eq!(params[0].as_str(), Some("label"));
    }

    #[test]
    fn test_unknown_named_parameter_is_null() {
        let params = build_parameters(
            &[ParamSpec::Named("missing")],
            &ArgMap::new(),
            &BuildContext::default(),
        );
        assert!(matches!(params[0], ParamValue::Null));
    }

    #[test]
    fn test_args_parameter_strips_context_keys() {
        let args = ArgMap::from([
            ("$value", json!("leak")),
            ("_expanded_args", json!({})),
            ("size", json!(50)),
        ]);
        let ctx = BuildContext::default();

        let params = build_parameters(&[ParamSpec::Args], &args, &ctx);
        let cleaned = params.into_iter().next().unwrap().into_args();

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get("size"), Some(&json!(50)));
    }
}
