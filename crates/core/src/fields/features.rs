//! Field features - the labeled parts of a rendered field
//!
//! A field view is assembled from features: label, input, help, message and
//! infobox. Each feature owns a wrapper and an inner element; the input
//! feature's element carries the actual form control. Feature types resolve
//! through the `feature_types` registry, so plugins can add their own or
//! replace what a view renders by overriding the declared keys.

use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::ArgMap;
use crate::build::{self, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
use crate::classes::ClassDef;
use crate::html::HtmlElement;
use crate::meta::{Lineage, PropertySpec, TypeLevel};
use crate::registry::Registry;

use super::Field;

/// The feature keys a default field view declares, in render order.
pub const DEFAULT_FEATURE_KEYS: &[&str] = &["label", "input", "help", "message", "infobox"];

/// One feature of a field view.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub feature_type: String,
    /// Owning field's name, from the parent view snapshot.
    pub field_name: Option<String>,
    /// Owning form's name, when the field renders inside a form.
    pub form_name: Option<String>,
    pub wrapper: Option<HtmlElement>,
    pub element: Option<HtmlElement>,
    /// Label feature text.
    pub label_text: Option<String>,
    /// Text for help, message and infobox features.
    pub text: Option<String>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl Feature {
    fn initial_element_id(&self) -> String {
        let field = self.field_name.as_deref().unwrap_or_default();
        format!("{}-field-{}", field.replace('_', "-"), self.feature_type)
    }

    fn initial_element_class(&self) -> String {
        format!("field-feature field-{}", self.feature_type)
    }

    /// The form-control name the input feature submits under.
    fn initial_element_name(&self) -> String {
        let field = self.field_name.as_deref().unwrap_or_default();
        match &self.form_name {
            Some(form) => format!("formforge_forms[{form}][{field}]"),
            None => field.to_string(),
        }
    }

    /// The inner element's value for rendering.
    fn element_value(&self, field: Option<&Field>) -> Option<String> {
        match self.feature_type.as_str() {
            "label" => self.label_text.clone(),
            "input" => field
                .and_then(Field::value)
                .and_then(crate::html::attribute_text),
            _ => self.text.clone(),
        }
    }

    /// Render the feature: the element, wrapped when a wrapper exists.
    pub fn html(&self, field: Option<&Field>) -> String {
        let Some(element) = &self.element else {
            return String::new();
        };
        let mut element = element.clone();
        element.value = self.element_value(field);
        let element_html = element.html();

        match &self.wrapper {
            Some(wrapper) => {
                let mut wrapper = wrapper.clone();
                wrapper.value = Some(element_html);
                wrapper.html()
            }
            None => element_html,
        }
    }

    pub fn element_id(&self) -> Option<String> {
        self.element.as_ref().and_then(HtmlElement::id)
    }
}

impl Constructible for Feature {
    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match name {
            "feature_type" => {
                if let Some(s) = value.as_str() {
                    self.feature_type = s.to_string();
                }
                None
            }
            "label_text" => {
                self.label_text = value.as_str().map(str::to_string);
                None
            }
            "text" => {
                self.text = value.as_str().map(str::to_string);
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

fn view_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::new("wrapper").ty("element"),
        PropertySpec::new("element").ty("element"),
    ]
}

/// Set element id and class, then derive the wrapper's from them.
fn apply_chrome(feature: &mut Feature, _args: &ArgMap) {
    let id = feature.initial_element_id();
    let class = feature.initial_element_class();
    super::apply_chrome(&mut feature.element, &mut feature.wrapper, &id, &class);
}

static FEATURE_VIEW: TypeLevel<Feature> = TypeLevel {
    name: "view",
    class_values: None,
    properties: Some(view_properties),
    initialize_class: None,
    pre_initialize: None,
    initialize: Some(apply_chrome),
};

static FEATURE_BASE: TypeLevel<Feature> = TypeLevel {
    name: "feature",
    class_values: None,
    properties: Some(|| vec![PropertySpec::new("field").auto_create(false)]),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static LABEL_FEATURE: TypeLevel<Feature> = TypeLevel {
    name: "label_feature",
    class_values: None,
    properties: Some(|| vec![PropertySpec::new("element").custom("html_tag", "label")]),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static INPUT_FEATURE: TypeLevel<Feature> = TypeLevel {
    name: "input_feature",
    class_values: None,
    properties: Some(|| vec![PropertySpec::new("element").custom("html_tag", "input")]),
    initialize_class: None,
    pre_initialize: Some(|feature, args| {
        // The control needs its submit name before anything else sees it.
        let name = feature.initial_element_name();
        if let Some(element) = &mut feature.element {
            element.set_name(&name);
        }
        args
    }),
    initialize: None,
};

static HELP_FEATURE: TypeLevel<Feature> = TypeLevel::new("help_feature");
static MESSAGE_FEATURE: TypeLevel<Feature> = TypeLevel::new("message_feature");
static INFOBOX_FEATURE: TypeLevel<Feature> = TypeLevel::new("infobox_feature");

static LABEL_LINEAGE: Lineage<Feature> = Lineage::new(&[&FEATURE_VIEW, &FEATURE_BASE, &LABEL_FEATURE]);
static INPUT_LINEAGE: Lineage<Feature> = Lineage::new(&[&FEATURE_VIEW, &FEATURE_BASE, &INPUT_FEATURE]);
static HELP_LINEAGE: Lineage<Feature> = Lineage::new(&[&FEATURE_VIEW, &FEATURE_BASE, &HELP_FEATURE]);
static MESSAGE_LINEAGE: Lineage<Feature> =
    Lineage::new(&[&FEATURE_VIEW, &FEATURE_BASE, &MESSAGE_FEATURE]);
static INFOBOX_LINEAGE: Lineage<Feature> =
    Lineage::new(&[&FEATURE_VIEW, &FEATURE_BASE, &INFOBOX_FEATURE]);

/// A registered feature type.
#[derive(Clone)]
pub struct FeatureType {
    pub class: &'static str,
    pub lineage: &'static Lineage<Feature>,
}

static FEATURE_TYPES: LazyLock<RwLock<Registry<FeatureType>>> = LazyLock::new(|| {
    let mut registry = Registry::new("feature_types");
    let builtin: &[(&str, &'static str, &'static Lineage<Feature>)] = &[
        ("label", "label_feature", &LABEL_LINEAGE),
        ("input", "input_feature", &INPUT_LINEAGE),
        ("help", "help_feature", &HELP_LINEAGE),
        ("message", "message_feature", &MESSAGE_LINEAGE),
        ("infobox", "infobox_feature", &INFOBOX_LINEAGE),
    ];
    for (name, class, lineage) in builtin {
        let _ = registry.register(name, FeatureType { class, lineage });
    }
    RwLock::new(registry)
});

/// Register a feature type. Returns false if the name is taken.
pub fn register_feature_type(name: &str, feature_type: FeatureType) -> bool {
    FEATURE_TYPES.write().register(name, feature_type).is_ok()
}

/// The factory class behind a feature type key, for keyed-array dispatch.
pub fn class_for(key: &str) -> Option<&'static str> {
    FEATURE_TYPES.read().get(key).map(|t| t.class)
}

/// Build a feature by type name.
pub fn make_feature(feature_type: &str, parent: ParentRef, mut args: ArgMap) -> Option<Feature> {
    let entry = FEATURE_TYPES.read().get(feature_type).cloned();
    let Some(entry) = entry else {
        tracing::warn!("Unknown feature type '{}'", feature_type);
        return None;
    };

    args.insert("feature_type", feature_type);
    let mut feature = Feature {
        feature_type: feature_type.to_string(),
        field_name: parent.field_name().map(str::to_string),
        form_name: parent.form_name().map(str::to_string),
        ..Default::default()
    };
    build::build(entry.lineage, &mut feature, args);
    Some(feature)
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    const PARAMS: &[ParamSpec] = &[ParamSpec::Value, ParamSpec::Parent, ParamSpec::Args];

    let mut defs = vec![ClassDef::abstract_base("feature", Some("view"))];
    for name in [
        "label_feature",
        "input_feature",
        "help_feature",
        "message_feature",
        "infobox_feature",
    ] {
        defs.push(ClassDef {
            name,
            base: Some("feature"),
            parameters: PARAMS,
            make: Some(feature_factory),
        });
    }
    defs
}

fn feature_factory(params: Vec<ParamValue>) -> Option<BuiltObject> {
    let Some(feature_type) = params.first().and_then(|p| p.as_str()).map(str::to_string) else {
        tracing::warn!("Feature factory called without a feature type");
        return None;
    };
    let mut iter = params.into_iter().skip(1);
    let parent = iter.next().map(ParamValue::into_parent).unwrap_or_default();
    let args = iter.next().map(ParamValue::into_args).unwrap_or_default();

    make_feature(&feature_type, parent, args).map(|f| BuiltObject::Feature(Box::new(f)))
}
