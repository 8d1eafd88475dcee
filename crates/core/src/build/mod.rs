//! Object builder - from configuration map to constructed object
//!
//! Construction is one fixed pipeline: admit the class, gate on
//! `accepts_args`, layer defaults, expand shorthand keys, collect prefixed
//! keys, assign (scalars first, contained objects built through their
//! factories), then run the pre-initialize filter and initialize action
//! chains. Configuration mistakes degrade: they are logged and the affected
//! property is skipped, never the whole build.

mod context;
mod params;

pub use context::{BuildContext, BuiltObject, ParentRef};
pub use params::{build_parameters, ParamSpec, ParamValue};

use std::cmp::Ordering;

use serde_json::Value;

use crate::args::{collect_args, expand_args, is_reserved_key, ArgMap, ShortnameRule};
use crate::meta::{AnnotatedProperty, Lineage, MergedMeta, PropertyKind};

/// An object assembled by the builder pipeline.
///
/// Implementations supply the seams the pipeline needs: the gate, the
/// shorthand table override, setter interception, direct field assignment,
/// contained-object assignment, and the custom bag that absorbs unknown
/// keys.
pub trait Constructible: Sized + 'static {
    /// Gate: a false return discards the argument map entirely; only the
    /// hook chains still run.
    fn accepts_args(&mut self, args: &ArgMap) -> bool {
        let _ = args;
        true
    }

    /// Shorthand table for this construction. The default is the lineage's
    /// merged table; overriders may add rules derived from the args.
    fn shortname_rules(&self, merged: &[ShortnameRule], args: &ArgMap) -> Vec<ShortnameRule> {
        let _ = args;
        merged.to_vec()
    }

    /// Snapshot handed to contained objects as their parent.
    fn parent_ref(&self) -> ParentRef {
        ParentRef::None
    }

    /// Setter seam: return true when the value was consumed by a setter.
    fn call_setter(&mut self, name: &str, value: &Value) -> bool {
        let _ = (name, value);
        false
    }

    /// Assign a plain value to a named field. Return the value back when no
    /// such field exists; it then lands in the custom bag.
    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value>;

    /// Assign a factory-built contained object. Return false when the
    /// property cannot take it.
    fn assign_object(&mut self, name: &str, built: BuiltObject) -> bool;

    fn custom_args_mut(&mut self) -> &mut ArgMap;

    /// Retain the final argument map for diagnostics, or release it.
    fn set_raw_args(&mut self, args: Option<ArgMap>);
}

/// Run the construction pipeline for `target`.
pub fn build<T: Constructible>(lineage: &Lineage<T>, target: &mut T, mut args: ArgMap) {
    lineage.admit();

    if target.accepts_args(&args) {
        let meta = lineage.meta();
        args.apply_defaults(&meta.defaults);
        let rules = target.shortname_rules(&meta.shortnames, &args);
        args = expand_args(args, &rules);
        args = collect_args(args, &meta.prefixes);
        assign_args(meta, target, &args);
    } else {
        args = ArgMap::new();
    }

    args = lineage.apply_filters(target, args);
    lineage.do_action(target, &args);

    let retained = crate::config::debug_args_enabled().then_some(args);
    target.set_raw_args(retained);
}

/// Assign a fully normalized argument map to the target.
fn assign_args<T: Constructible>(meta: &MergedMeta, target: &mut T, args: &ArgMap) {
    for (name, value) in sorted_entries(args, meta) {
        if is_reserved_key(&name) {
            continue;
        }
        if target.call_setter(&name, &value) {
            continue;
        }

        if let Some(ann) = meta.annotation(&name) {
            if ann.auto_create && ann.is_class() {
                build_contained(target, ann, args, value);
                continue;
            }
            if ann.auto_create && ann.is_array() {
                build_keyed(target, ann, value);
                continue;
            }
        }

        if let Some(leftover) = target.assign_field(&name, value) {
            target.custom_args_mut().insert(name, leftover);
        }
    }
}

/// Entries ordered for assignment: unannotated keys first, then annotated
/// ones with keyed arrays ahead of contained objects. The sort is stable, so
/// ties keep map order.
fn sorted_entries(args: &ArgMap, meta: &MergedMeta) -> Vec<(String, Value)> {
    let mut entries: Vec<(String, Value)> = args
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

    entries.sort_by(|(a, _), (b, _)| {
        assignment_order(meta.annotation(a), meta.annotation(b))
    });
    entries
}

fn assignment_order(
    a: Option<&AnnotatedProperty>,
    b: Option<&AnnotatedProperty>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if a.is_array() && b.is_class() {
                Ordering::Less
            } else if a.is_class() && b.is_array() {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Build a single contained object and hand it to the target.
fn build_contained<T: Constructible>(
    target: &mut T,
    ann: &AnnotatedProperty,
    args: &ArgMap,
    value: Value,
) {
    let PropertyKind::Class(class) = &ann.kind else {
        return;
    };

    let mut sub_args = ArgMap::from_value(&value);
    if ann.prefix() != ann.name {
        for (k, v) in args.sub_map(ann.prefix()) {
            sub_args.insert(k, v);
        }
    }

    // A scalar the collector folded into the sub-map (the type selection)
    // comes back out as the construction value.
    let value = match value {
        Value::Object(map) => match map.get(crate::args::VALUE_CONTEXT_KEY) {
            Some(scalar) => scalar.clone(),
            None => Value::Object(map),
        },
        other => other,
    };

    let ctx = BuildContext {
        value,
        parent: target.parent_ref(),
        custom: ann.custom.clone(),
    };

    match crate::classes::make_object(class, &sub_args, &ctx) {
        Some(built) => {
            if !target.assign_object(&ann.name, built) {
                tracing::warn!("Property '{}' rejected its built object", ann.name);
            }
        }
        None => {
            tracing::debug!("Skipped contained object for property '{}'", ann.name);
        }
    }
}

/// Build every declared key of a registry-typed keyed array.
fn build_keyed<T: Constructible>(target: &mut T, ann: &AnnotatedProperty, value: Value) {
    let PropertyKind::Array { of } = &ann.kind else {
        return;
    };
    let Some(registry) = ann.registry.as_deref() else {
        tracing::warn!("Keyed array property '{}' declares no registry", ann.name);
        return;
    };

    let value_map = ArgMap::from_value(&value);
    let mut built = Vec::new();

    for key in &ann.keys {
        let Some(class) = crate::classes::registry_class(registry, key) else {
            tracing::warn!("'{}' is not registered in the {} registry", key, registry);
            continue;
        };
        if !crate::classes::is_subtype(class, of) {
            tracing::warn!(
                "Registry entry '{}' resolves to '{}', which is not a kind of '{}'",
                key,
                class,
                of
            );
            continue;
        }

        let sub_args = value_map.sub_map(key);
        let ctx = BuildContext {
            value: Value::String(key.clone()),
            parent: target.parent_ref(),
            custom: ann.custom.clone(),
        };

        match crate::classes::make_object(class, &sub_args, &ctx) {
            Some(object) => built.push((key.clone(), object)),
            None => tracing::debug!("Skipped '{}' entry of property '{}'", key, ann.name),
        }
    }

    if !target.assign_object(&ann.name, BuiltObject::Keyed(built)) {
        tracing::warn!("Property '{}' rejected its built objects", ann.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ClassValues, PropertySpec, TypeLevel};
    use serde_json::json;

    #[derive(Default)]
    struct Widget {
        title: Option<String>,
        element: Option<crate::html::HtmlElement>,
        custom_args: ArgMap,
        raw_args: Option<ArgMap>,
        gate_open: bool,
    }

    impl Constructible for Widget {
        fn accepts_args(&mut self, _args: &ArgMap) -> bool {
            self.gate_open
        }

        fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
            match name {
                "title" => {
                    self.title = value.as_str().map(str::to_string);
                    None
                }
                _ => Some(value),
            }
        }

        fn assign_object(&mut self, name: &str, built: BuiltObject) -> bool {
            match (name, built) {
                ("element", BuiltObject::Element(element)) => {
                    self.element = Some(element);
                    true
                }
                _ => false,
            }
        }

        fn custom_args_mut(&mut self) -> &mut ArgMap {
            &mut self.custom_args
        }

        fn set_raw_args(&mut self, args: Option<ArgMap>) {
            self.raw_args = args;
        }
    }

    static WIDGET: TypeLevel<Widget> = TypeLevel {
        name: "widget",
        class_values: Some(|| {
            ClassValues::new()
                .default_arg("title", "Untitled")
                .shortname("^t$", "title")
        }),
        properties: Some(|| {
            vec![PropertySpec::new("element")
                .ty("element")
                .custom("html_tag", "span")]
        }),
        initialize_class: None,
        pre_initialize: None,
        initialize: None,
    };

    static WIDGET_LINEAGE: Lineage<Widget> = Lineage::new(&[&WIDGET]);

    #[test]
    fn test_full_pipeline() {
        let mut widget = Widget {
            gate_open: true,
            ..Default::default()
        };
        build(
            &WIDGET_LINEAGE,
            &mut widget,
            ArgMap::from([
                ("t", json!("Hello")),
                ("element:class", json!("hero")),
                ("mystery", json!(42)),
            ]),
        );

        assert_eq!(widget.title.as_deref(), Some("Hello"));
        let element = widget.element.unwrap();
        assert_eq!(element.tag(), "span");
        assert_eq!(element.attribute("class"), Some(&json!("hero")));
        // Unknown keys degrade into the custom bag
        assert_eq!(widget.custom_args.get("mystery"), Some(&json!(42)));
    }

    #[test]
    fn test_defaults_apply() {
        let mut widget = Widget {
            gate_open: true,
            ..Default::default()
        };
        build(&WIDGET_LINEAGE, &mut widget, ArgMap::new());

        assert_eq!(widget.title.as_deref(), Some("Untitled"));
    }

    #[test]
    fn test_closed_gate_discards_args() {
        let mut widget = Widget::default();
        build(
            &WIDGET_LINEAGE,
            &mut widget,
            ArgMap::from([("t", json!("Hello"))]),
        );

        assert_eq!(widget.title, None);
        assert!(widget.custom_args.is_empty());
    }

    #[derive(Default)]
    struct Gadget {
        parts: Vec<String>,
        custom_args: ArgMap,
    }

    impl Constructible for Gadget {
        fn assign_field(&mut self, _name: &str, value: Value) -> Option<Value> {
            Some(value)
        }

        fn assign_object(&mut self, name: &str, built: BuiltObject) -> bool {
            match (name, built) {
                ("parts", BuiltObject::Keyed(entries)) => {
                    self.parts = entries.into_iter().map(|(k, _)| k).collect();
                    true
                }
                _ => false,
            }
        }

        fn custom_args_mut(&mut self) -> &mut ArgMap {
            &mut self.custom_args
        }

        fn set_raw_args(&mut self, _args: Option<ArgMap>) {}
    }

    fn part_class(key: &str) -> Option<&'static str> {
        match key {
            "label" => Some("label_feature"),
            // Registered class, but not a kind of feature.
            "rogue" => Some("element"),
            _ => None,
        }
    }

    static GADGET: TypeLevel<Gadget> = TypeLevel {
        name: "gadget",
        class_values: None,
        properties: Some(|| {
            vec![PropertySpec::new("parts")
                .ty("feature[]")
                .registry("gadget_parts")
                .keys(&["label", "bogus", "rogue"])]
        }),
        initialize_class: None,
        pre_initialize: None,
        initialize: None,
    };

    static GADGET_LINEAGE: Lineage<Gadget> = Lineage::new(&[&GADGET]);

    #[test]
    fn test_keyed_array_skips_unresolvable_keys() {
        crate::classes::register_type_registry("gadget_parts", part_class);

        let mut gadget = Gadget::default();
        build(
            &GADGET_LINEAGE,
            &mut gadget,
            ArgMap::from([("parts", json!({"label": {"label_text": "Name"}}))]),
        );

        // The unknown key and the subtype mismatch skip; the sibling builds.
        assert_eq!(gadget.parts, vec!["label"]);
    }
}
