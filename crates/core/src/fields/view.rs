//! Field views - how a field renders
//!
//! A view owns the field's features and the wrapper/element pair that frames
//! them. View types resolve through the `view_types` registry; each entry
//! also names the tag of its input control, which drives the shorthand rules
//! for that control's attributes (`size` on a text view expands against
//! `<input>`, on a textarea view against `<textarea>`).

use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::{ArgMap, ShortnameRule};
use crate::build::{self, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
use crate::classes::ClassDef;
use crate::html::HtmlElement;
use crate::meta::{ClassValues, Lineage, PropertySpec, TypeLevel};
use crate::registry::Registry;

use super::features::{Feature, DEFAULT_FEATURE_KEYS};
use super::Field;

/// The rendering side of a field.
#[derive(Debug, Clone, Default)]
pub struct FieldView {
    pub view_type: String,
    /// Owning field's name, from the parent snapshot.
    pub field_name: Option<String>,
    pub form_name: Option<String>,
    pub wrapper: Option<HtmlElement>,
    /// Carries the view's id and class; features render in its place.
    pub element: Option<HtmlElement>,
    /// Built features in declared-key order.
    pub features: Vec<(String, Feature)>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl FieldView {
    pub fn feature(&self, key: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, feature)| feature)
    }

    fn feature_mut(&mut self, key: &str) -> Option<&mut Feature> {
        self.features
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, feature)| feature)
    }

    /// The id of the input feature's control, for label wiring.
    pub fn input_element_id(&self) -> Option<String> {
        self.feature("input").and_then(Feature::element_id)
    }

    /// Render the view: every feature in order, framed by the wrapper.
    pub fn html(&self, field: &Field) -> String {
        let features_html: String = self
            .features
            .iter()
            .map(|(_, feature)| feature.html(Some(field)))
            .collect();

        match &self.wrapper {
            Some(wrapper) => {
                let mut wrapper = wrapper.clone();
                wrapper.value = Some(features_html);
                wrapper.html()
            }
            None => features_html,
        }
    }

    fn initial_element_id(&self) -> String {
        let field = self.field_name.as_deref().unwrap_or_default();
        format!("{field}-custom-field")
    }
}

impl Constructible for FieldView {
    fn shortname_rules(&self, merged: &[ShortnameRule], _args: &ArgMap) -> Vec<ShortnameRule> {
        let mut rules = merged.to_vec();

        // Bare input attributes address the input control's element, and
        // `wrapper:` the frame around it. The valid set depends on the tag
        // this view uses for its control.
        let mut attributes = crate::html::valid_attributes(input_tag(&self.view_type));
        attributes.retain(|a| *a != "form");
        if !attributes.is_empty() {
            let alternation = attributes.join("|");
            let pairs = [
                (
                    format!(r"^features\[([^\]]+)\]:({alternation})$"),
                    "features[$1]:element:$2",
                ),
                (
                    format!(r"^features\[([^\]]+)\]:wrapper:({alternation})$"),
                    "features[$1]:wrapper:$2",
                ),
            ];
            rules.extend(
                pairs
                    .iter()
                    .filter_map(|(pattern, template)| ShortnameRule::new(pattern, *template)),
            );
        }
        rules
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::View {
            view_type: self.view_type.clone(),
            field_name: self.field_name.clone(),
            form_name: self.form_name.clone(),
        }
    }

    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match name {
            "view_type" => {
                if let Some(s) = value.as_str() {
                    self.view_type = s.to_string();
                }
                None
            }
            // Factory-assigned from the parent snapshot.
            "field" => None,
            _ => Some(value),
        }
    }

    fn assign_object(&mut self, name: &str, built: BuiltObject) -> bool {
        match (name, built) {
            ("wrapper", BuiltObject::Element(element)) => {
                self.wrapper = Some(element);
                true
            }
            ("element", BuiltObject::Element(element)) => {
                self.element = Some(element);
                true
            }
            ("features", BuiltObject::Keyed(built)) => {
                self.features = built
                    .into_iter()
                    .filter_map(|(key, object)| match object {
                        BuiltObject::Feature(feature) => Some((key, *feature)),
                        _ => None,
                    })
                    .collect();
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

static VIEW_CHROME: TypeLevel<FieldView> = TypeLevel {
    name: "view",
    class_values: None,
    properties: Some(|| {
        vec![
            PropertySpec::new("wrapper").ty("element"),
            PropertySpec::new("element").ty("element"),
        ]
    }),
    initialize_class: None,
    pre_initialize: None,
    initialize: Some(|view, _| {
        let id = view.initial_element_id();
        super::apply_chrome(&mut view.element, &mut view.wrapper, &id, "custom-field");
    }),
};

fn field_view_values() -> ClassValues {
    let features = DEFAULT_FEATURE_KEYS.join("|");
    ClassValues::new().shortname(format!("^({features}):(.+)$"), "features[$1]:$2")
}

static FIELD_VIEW_BASE: TypeLevel<FieldView> = TypeLevel {
    name: "field_view",
    class_values: Some(field_view_values),
    properties: Some(|| {
        vec![
            PropertySpec::new("field").ty("field").auto_create(false),
            PropertySpec::new("features")
                .ty("feature[]")
                .registry("feature_types")
                .keys(DEFAULT_FEATURE_KEYS),
        ]
    }),
    initialize_class: None,
    pre_initialize: None,
    initialize: Some(|view, _| {
        // Point the label at the input control.
        if let Some(input_id) = view.input_element_id() {
            if let Some(element) = view.feature_mut("label").and_then(|f| f.element.as_mut()) {
                element.set_attribute("for", input_id);
            }
        }
    }),
};

static TEXT_VIEW: TypeLevel<FieldView> = TypeLevel::new("text_field_view");

static TEXTAREA_VIEW: TypeLevel<FieldView> = TypeLevel {
    name: "textarea_field_view",
    class_values: Some(|| {
        ClassValues::new().default_arg("features[input]:element:html_tag", "textarea")
    }),
    properties: None,
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static HIDDEN_VIEW: TypeLevel<FieldView> = TypeLevel {
    name: "hidden_field_view",
    class_values: Some(|| ClassValues::new().default_arg("features[input]:element:type", "hidden")),
    // A hidden control has no visible chrome, so only the input feature
    // builds.
    properties: Some(|| vec![PropertySpec::new("features").keys(&["input"])]),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static TEXT_VIEW_LINEAGE: Lineage<FieldView> =
    Lineage::new(&[&VIEW_CHROME, &FIELD_VIEW_BASE, &TEXT_VIEW]);
static TEXTAREA_VIEW_LINEAGE: Lineage<FieldView> =
    Lineage::new(&[&VIEW_CHROME, &FIELD_VIEW_BASE, &TEXTAREA_VIEW]);
static HIDDEN_VIEW_LINEAGE: Lineage<FieldView> =
    Lineage::new(&[&VIEW_CHROME, &FIELD_VIEW_BASE, &HIDDEN_VIEW]);

/// A registered view type.
#[derive(Clone)]
pub struct FieldViewType {
    pub class: &'static str,
    pub lineage: &'static Lineage<FieldView>,
    /// Tag of the input control this view renders.
    pub input_tag: &'static str,
}

static VIEW_TYPES: LazyLock<RwLock<Registry<FieldViewType>>> = LazyLock::new(|| {
    let mut registry = Registry::new("view_types");
    let builtin: &[(&str, FieldViewType)] = &[
        (
            "text",
            FieldViewType {
                class: "text_field_view",
                lineage: &TEXT_VIEW_LINEAGE,
                input_tag: "input",
            },
        ),
        (
            "textarea",
            FieldViewType {
                class: "textarea_field_view",
                lineage: &TEXTAREA_VIEW_LINEAGE,
                input_tag: "textarea",
            },
        ),
        (
            "hidden",
            FieldViewType {
                class: "hidden_field_view",
                lineage: &HIDDEN_VIEW_LINEAGE,
                input_tag: "input",
            },
        ),
    ];
    for (name, view_type) in builtin {
        let _ = registry.register(name, view_type.clone());
    }
    RwLock::new(registry)
});

/// Register a view type. Returns false if the name is taken.
pub fn register_view_type(name: &str, view_type: FieldViewType) -> bool {
    VIEW_TYPES.write().register(name, view_type).is_ok()
}

/// Tag of the input control a view type renders, `input` when unregistered.
pub fn input_tag(view_type: &str) -> &'static str {
    VIEW_TYPES
        .read()
        .get(view_type)
        .map(|t| t.input_tag)
        .unwrap_or("input")
}

/// Build a field view by type name.
pub fn make_view(view_type: &str, parent: ParentRef, mut args: ArgMap) -> Option<FieldView> {
    let entry = VIEW_TYPES.read().get(view_type).cloned();
    let Some(entry) = entry else {
        tracing::warn!("Unknown field view type '{}'", view_type);
        return None;
    };

    args.remove("view_type");
    let mut view = FieldView {
        view_type: view_type.to_string(),
        field_name: parent.field_name().map(str::to_string),
        form_name: parent.form_name().map(str::to_string),
        ..Default::default()
    };
    build::build(entry.lineage, &mut view, args);
    Some(view)
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    const PARAMS: &[ParamSpec] = &[ParamSpec::Named("view_type"), ParamSpec::Parent, ParamSpec::Args];

    let mut defs = vec![ClassDef {
        name: "field_view",
        base: Some("view"),
        parameters: PARAMS,
        make: Some(view_factory),
    }];
    for name in ["text_field_view", "textarea_field_view", "hidden_field_view"] {
        defs.push(ClassDef::abstract_base(name, Some("field_view")));
    }
    defs
}

fn view_factory(params: Vec<ParamValue>) -> Option<BuiltObject> {
    // An unnamed view renders as text.
    let view_type = params
        .first()
        .and_then(|p| p.as_str())
        .unwrap_or("text")
        .to_string();
    let mut iter = params.into_iter().skip(1);
    let parent = iter.next().map(ParamValue::into_parent).unwrap_or_default();
    let args = iter.next().map(ParamValue::into_args).unwrap_or_default();

    make_view(&view_type, parent, args).map(|v| BuiltObject::FieldView(Box::new(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_parent(name: &str) -> ParentRef {
        ParentRef::Field {
            field_name: name.to_string(),
            form_name: None,
            object_type: crate::object_type::ObjectType::post(Some("post")),
        }
    }

    #[test]
    fn test_default_features_build_in_order() {
        let view = make_view("text", field_parent("website"), ArgMap::new()).unwrap();

        let keys: Vec<&str> = view.features.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, DEFAULT_FEATURE_KEYS);
    }

    #[test]
    fn test_feature_shorthand_reaches_input_element() {
        let view = make_view(
            "text",
            field_parent("website"),
            ArgMap::from([("input:size", json!(50))]),
        )
        .unwrap();

        let input = view.feature("input").unwrap();
        let element = input.element.as_ref().unwrap();
        assert_eq!(element.attribute("size"), Some(&json!(50)));
    }

    #[test]
    fn test_label_points_at_input() {
        let view = make_view(
            "text",
            field_parent("website"),
            ArgMap::from([("label:label_text", json!("Website"))]),
        )
        .unwrap();

        let label = view.feature("label").unwrap();
        assert_eq!(label.label_text.as_deref(), Some("Website"));
        let element = label.element.as_ref().unwrap();
        assert_eq!(element.attribute("for"), Some(&json!("website-field-input")));
    }

    #[test]
    fn test_textarea_view_switches_input_tag() {
        let view = make_view("textarea", field_parent("bio"), ArgMap::new()).unwrap();

        let input = view.feature("input").unwrap();
        assert_eq!(input.element.as_ref().unwrap().tag(), "textarea");
    }

    #[test]
    fn test_view_chrome() {
        let view = make_view("text", field_parent("website"), ArgMap::new()).unwrap();

        let element = view.element.as_ref().unwrap();
        assert_eq!(element.id().as_deref(), Some("website-custom-field"));
        assert_eq!(element.class().as_deref(), Some("custom-field"));
        let wrapper = view.wrapper.as_ref().unwrap();
        assert_eq!(wrapper.id().as_deref(), Some("website-custom-field-wrapper"));
    }
}
