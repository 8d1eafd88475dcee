//! Fields - named, typed, storable values attached to content objects
//!
//! A [`Field`] ties together a name, an object type, a storage adapter and a
//! view. Field types resolve through the `field_types` registry; the
//! built-in types differ only in the defaults they layer under the caller's
//! configuration. Construction accepts a rich shorthand: `"label"` reaches
//! the label feature's text, `"size"` the input control's attribute, both
//! expanding to full canonical paths before assignment.

pub mod features;
pub mod view;

pub use features::{register_feature_type, Feature, FeatureType};
pub use view::{register_view_type, FieldView, FieldViewType};

use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::{ArgMap, ShortnameRule};
use crate::build::{self, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
use crate::classes::ClassDef;
use crate::html::HtmlElement;
use crate::meta::{ClassValues, Lineage, PropertySpec, TypeLevel};
use crate::object_type::ObjectType;
use crate::registry::Registry;
use crate::storage::{Backend, Storage};

/// Set an element's identity and derive the wrapper's from it.
///
/// Wrapper ids take the element id plus `-wrapper`; each element class gains
/// a `-wrapper` suffix on the wrapper.
pub(crate) fn apply_chrome(
    element: &mut Option<HtmlElement>,
    wrapper: &mut Option<HtmlElement>,
    id: &str,
    class: &str,
) {
    if let Some(element) = element {
        element.append_class(class);
        element.set_id(id);
    }

    let (wrapper_id, wrapper_class) = match element {
        Some(element) => (
            element.id().map(|id| format!("{id}-wrapper")),
            element.class().map(|classes| {
                classes
                    .split_whitespace()
                    .map(|class| format!("{class}-wrapper"))
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
        ),
        None => (None, None),
    };

    if let Some(wrapper) = wrapper {
        if let Some(class) = wrapper_class {
            wrapper.append_class(&class);
        }
        if let Some(id) = wrapper_id {
            wrapper.set_id(&id);
        }
    }
}

/// A custom field bound to an object type.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub field_name: String,
    pub field_type: String,
    pub field_required: bool,
    pub field_default: Option<Value>,
    pub object_type: ObjectType,
    /// Set when the field renders inside a form.
    pub form_name: Option<String>,
    pub storage: Option<Storage>,
    pub view: Option<FieldView>,
    value: Option<Value>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl Field {
    /// The cached value; [`Field::load_value`] fills it from storage.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Fill the cached value from storage unless already set.
    pub fn load_value(&mut self, backend: &dyn Backend) {
        if self.value.is_none() {
            if let Some(storage) = &self.storage {
                self.value = storage.get_value(backend);
            }
        }
    }

    /// Persist the (optionally updated) value.
    pub fn update_value(&mut self, value: Option<Value>, backend: &mut dyn Backend) {
        if let Some(value) = value {
            self.set_value(value);
        }
        if let (Some(storage), Some(value)) = (&mut self.storage, &self.value) {
            storage.update_value(backend, value.clone());
        }
    }

    /// Bind the field (and its storage) to a concrete object.
    pub fn set_object_id(&mut self, object_id: Option<i64>) {
        if let Some(storage) = &mut self.storage {
            storage.set_object_id(object_id);
        }
    }

    pub fn html(&self) -> String {
        match &self.view {
            Some(view) => view.html(self),
            None => String::new(),
        }
    }
}

impl Constructible for Field {
    fn shortname_rules(&self, merged: &[ShortnameRule], args: &ArgMap) -> Vec<ShortnameRule> {
        let mut rules = merged.to_vec();

        // Bare input attributes are shorthand all the way down to the input
        // control; the valid set depends on the view's control tag. `form`
        // stays reserved for form membership.
        let view_type = args
            .get_str("view:view_type")
            .or_else(|| args.get_str("view_type"))
            .unwrap_or("text");
        let mut attributes = crate::html::valid_attributes(view::input_tag(view_type));
        attributes.retain(|a| *a != "form");
        if !attributes.is_empty() {
            let pattern = format!("^({})$", attributes.join("|"));
            rules.extend(ShortnameRule::new(&pattern, "view:input:element:$1"));
        }
        rules
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::Field {
            field_name: self.field_name.clone(),
            form_name: self.form_name.clone(),
            object_type: self.object_type.clone(),
        }
    }

    fn call_setter(&mut self, name: &str, value: &Value) -> bool {
        if name == "value" {
            self.set_value(value.clone());
            return true;
        }
        false
    }

    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match name {
            "field_name" => {
                if let Some(s) = value.as_str() {
                    self.field_name = s.to_string();
                }
                None
            }
            "field_type" => {
                if let Some(s) = value.as_str() {
                    self.field_type = s.to_string();
                }
                None
            }
            "field_required" => {
                self.field_required = value.as_bool().unwrap_or(false);
                None
            }
            "field_default" => {
                self.field_default = Some(value);
                None
            }
            "object_type" => {
                if let Some(s) = value.as_str() {
                    self.object_type = ObjectType::parse(s);
                }
                None
            }
            _ => Some(value),
        }
    }

    fn assign_object(&mut self, name: &str, built: BuiltObject) -> bool {
        match (name, built) {
            ("storage", BuiltObject::Storage(storage)) => {
                self.storage = Some(*storage);
                true
            }
            ("view", BuiltObject::FieldView(view)) => {
                self.view = Some(*view);
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

fn field_base_values() -> ClassValues {
    let keys = features::DEFAULT_FEATURE_KEYS.join("|");
    ClassValues::new()
        .default_arg("view:view_type", "text")
        .shortname("^view_type$", "view:view_type")
        .shortname("^label$", "view:features[label]:label_text")
        .shortname("^element:(.+)$", "view:features[input]:element:$1")
        .shortname(
            format!("^({keys}):wrapper:(.+)$"),
            "view:features[$1]:wrapper:$2",
        )
        .shortname(
            format!("^({keys}):(element:)?(.+)$"),
            "view:features[$1]:element:$3",
        )
        .shortname(
            format!(r"^features\[({keys})\]:(element:)?(.+)$"),
            "view:features[$1]:element:$3",
        )
}

fn field_base_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::new("value").ty("mixed"),
        PropertySpec::new("form").ty("form").auto_create(false),
        PropertySpec::new("storage").ty("storage").default("meta"),
        PropertySpec::new("view").ty("field_view"),
    ]
}

static FIELD_BASE: TypeLevel<Field> = TypeLevel {
    name: "field",
    class_values: Some(field_base_values),
    properties: Some(field_base_properties),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static TEXT_FIELD: TypeLevel<Field> = TypeLevel::new("text_field");

static TEXTAREA_FIELD: TypeLevel<Field> = TypeLevel {
    name: "textarea_field",
    class_values: Some(|| ClassValues::new().default_arg("view:view_type", "textarea")),
    properties: None,
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static URL_FIELD: TypeLevel<Field> = TypeLevel {
    name: "url_field",
    class_values: Some(|| {
        ClassValues::new().default_arg("view:features[input]:element:type", "url")
    }),
    properties: None,
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static DATE_FIELD: TypeLevel<Field> = TypeLevel {
    name: "date_field",
    class_values: Some(|| {
        ClassValues::new().default_arg("view:features[input]:element:type", "date")
    }),
    properties: None,
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static HIDDEN_FIELD: TypeLevel<Field> = TypeLevel {
    name: "hidden_field",
    class_values: Some(|| ClassValues::new().default_arg("view:view_type", "hidden")),
    properties: None,
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static TEXT_LINEAGE: Lineage<Field> = Lineage::new(&[&FIELD_BASE, &TEXT_FIELD]);
static TEXTAREA_LINEAGE: Lineage<Field> = Lineage::new(&[&FIELD_BASE, &TEXTAREA_FIELD]);
static URL_LINEAGE: Lineage<Field> = Lineage::new(&[&FIELD_BASE, &URL_FIELD]);
static DATE_LINEAGE: Lineage<Field> = Lineage::new(&[&FIELD_BASE, &DATE_FIELD]);
static HIDDEN_LINEAGE: Lineage<Field> = Lineage::new(&[&FIELD_BASE, &HIDDEN_FIELD]);

/// A registered field type.
#[derive(Clone)]
pub struct FieldType {
    pub class: &'static str,
    pub lineage: &'static Lineage<Field>,
}

static FIELD_TYPES: LazyLock<RwLock<Registry<FieldType>>> = LazyLock::new(|| {
    let mut registry = Registry::new("field_types");
    let builtin: &[(&str, &'static str, &'static Lineage<Field>)] = &[
        ("text", "text_field", &TEXT_LINEAGE),
        ("textarea", "textarea_field", &TEXTAREA_LINEAGE),
        ("url", "url_field", &URL_LINEAGE),
        ("date", "date_field", &DATE_LINEAGE),
        ("hidden", "hidden_field", &HIDDEN_LINEAGE),
    ];
    for (name, class, lineage) in builtin {
        let _ = registry.register(name, FieldType { class, lineage });
    }
    RwLock::new(registry)
});

/// Register a field type. Returns false if the name is taken.
pub fn register_field_type(name: &str, field_type: FieldType) -> bool {
    FIELD_TYPES.write().register(name, field_type).is_ok()
}

pub fn field_type_exists(name: &str) -> bool {
    FIELD_TYPES.read().contains(name)
}

/// Build a field.
///
/// The type comes from the `field_type` argument (with `type` accepted as an
/// alias), defaulting to `text`. Form membership is taken off the args up
/// front so contained objects see it in their parent snapshot.
pub fn make_field(field_name: &str, object_type: ObjectType, mut args: ArgMap) -> Option<Field> {
    let field_type = match args.get_str("field_type").map(str::to_string) {
        Some(t) => t,
        None => {
            let renamed = args
                .remove("type")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "text".to_string());
            args.insert("field_type", renamed.clone());
            renamed
        }
    };

    let entry = FIELD_TYPES.read().get(&field_type).cloned();
    let Some(entry) = entry else {
        tracing::warn!("Unknown field type '{}' for field '{}'", field_type, field_name);
        return None;
    };

    let form_name = args
        .remove("form")
        .or_else(|| args.remove("form_name"))
        .and_then(|v| v.as_str().map(str::to_string));

    let mut field = Field {
        field_name: field_name.to_string(),
        field_type,
        object_type,
        form_name,
        ..Default::default()
    };
    build::build(entry.lineage, &mut field, args);
    Some(field)
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    const PARAMS: &[ParamSpec] = &[
        ParamSpec::Value,
        ParamSpec::Named("object_type"),
        ParamSpec::Args,
    ];

    let mut defs = vec![ClassDef {
        name: "field",
        base: Some("base"),
        parameters: PARAMS,
        make: Some(field_factory),
    }];
    for name in ["text_field", "textarea_field", "url_field", "date_field", "hidden_field"] {
        defs.push(ClassDef::abstract_base(name, Some("field")));
    }
    defs
}

fn field_factory(params: Vec<ParamValue>) -> Option<BuiltObject> {
    let Some(field_name) = params.first().and_then(|p| p.as_str()).map(str::to_string) else {
        tracing::warn!("Field factory called without a field name");
        return None;
    };
    let object_type = params
        .get(1)
        .and_then(|p| p.as_str())
        .map(ObjectType::parse)
        .unwrap_or_default();
    let args = params
        .into_iter()
        .nth(2)
        .map(ParamValue::into_args)
        .unwrap_or_default();

    make_field(&field_name, object_type, args).map(|f| BuiltObject::Field(Box::new(f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn make(field_type: &str, args: ArgMap) -> Field {
        let mut args = args;
        args.insert("field_type", field_type);
        make_field("website", ObjectType::parse("post:solution"), args).unwrap()
    }

    #[test]
    fn test_storage_selection_survives_storage_sub_args() {
        let field = make_field(
            "motto",
            ObjectType::option("branding"),
            ArgMap::from([
                ("storage", json!("option")),
                ("storage:option_prefix", json!("x_")),
            ]),
        )
        .unwrap();

        let storage = field.storage.as_ref().unwrap();
        assert_eq!(storage.storage_type, "option");
        assert_eq!(storage.storage_key(), "x_branding[motto]");
    }

    #[test]
    fn test_default_field_builds_text_view() {
        let field = make("text", ArgMap::new());

        assert_eq!(field.field_type, "text");
        let view = field.view.as_ref().unwrap();
        assert_eq!(view.view_type, "text");
        assert!(field.storage.is_some());
    }

    #[test]
    fn test_label_shorthand_reaches_label_feature() {
        let field = make("text", ArgMap::from([("label", json!("Website"))]));

        let view = field.view.as_ref().unwrap();
        let label = view.feature("label").unwrap();
        assert_eq!(label.label_text.as_deref(), Some("Website"));
    }

    #[test]
    fn test_input_attribute_shorthand() {
        let field = make("text", ArgMap::from([("size", json!(50))]));

        let view = field.view.as_ref().unwrap();
        let element = view.feature("input").unwrap().element.as_ref().unwrap();
        assert_eq!(element.attribute("size"), Some(&json!(50)));
    }

    #[test]
    fn test_url_field_sets_input_type() {
        let field = make("url", ArgMap::new());

        let view = field.view.as_ref().unwrap();
        let element = view.feature("input").unwrap().element.as_ref().unwrap();
        assert_eq!(element.attribute("type"), Some(&json!("url")));
    }

    #[test]
    fn test_textarea_field_switches_view() {
        let field = make("textarea", ArgMap::new());

        let view = field.view.as_ref().unwrap();
        assert_eq!(view.view_type, "textarea");
        let element = view.feature("input").unwrap().element.as_ref().unwrap();
        assert_eq!(element.tag(), "textarea");
    }

    #[test]
    fn test_unknown_field_type() {
        let args = ArgMap::from([("field_type", json!("bogus"))]);
        assert!(make_field("x", ObjectType::parse("post:any"), args).is_none());
    }

    #[test]
    fn test_value_round_trip_through_storage() {
        let mut backend = MemoryBackend::new();
        let mut field = make("text", ArgMap::new());
        field.set_object_id(Some(11));

        field.update_value(Some(json!("hello")), &mut backend);

        let mut reloaded = make("text", ArgMap::new());
        reloaded.set_object_id(Some(11));
        reloaded.load_value(&backend);
        assert_eq!(reloaded.value(), Some(&json!("hello")));
    }

    #[test]
    fn test_form_membership_moves_to_snapshot() {
        let field = make(
            "text",
            ArgMap::from([("form", json!("profile"))]),
        );

        assert_eq!(field.form_name.as_deref(), Some("profile"));
        let view = field.view.as_ref().unwrap();
        let input = view.feature("input").unwrap();
        let element = input.element.as_ref().unwrap();
        assert_eq!(
            element.name().as_deref(),
            Some("formforge_forms[profile][website]")
        );
    }
}
