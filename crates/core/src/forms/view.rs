//! Form views - how a form renders
//!
//! A form view frames the rendered fields in a wrapper. The `default` view
//! renders each field in registration order, one per line; alternative
//! layouts register under their own names.

use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::ArgMap;
use crate::build::{self, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
use crate::classes::ClassDef;
use crate::html::HtmlElement;
use crate::meta::{Lineage, PropertySpec, TypeLevel};
use crate::registry::Registry;

use super::Form;

/// The rendering side of a form.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    pub view_type: String,
    /// Owning form's name, from the parent snapshot.
    pub form_name: Option<String>,
    pub wrapper: Option<HtmlElement>,
    /// Carries the view's id and class; fields render in its place.
    pub element: Option<HtmlElement>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl FormView {
    /// Render every field of the form, framed by the wrapper.
    pub fn html(&self, form: &Form) -> String {
        let fields_html = form
            .fields
            .iter()
            .map(|(_, field)| field.html())
            .collect::<Vec<_>>()
            .join("\n");

        match &self.wrapper {
            Some(wrapper) => {
                let mut wrapper = wrapper.clone();
                wrapper.value = Some(fields_html);
                wrapper.html()
            }
            None => fields_html,
        }
    }

    fn initial_element_id(&self) -> String {
        let form = self.form_name.as_deref().unwrap_or_default();
        format!("{}-custom-form", form.replace('_', "-"))
    }

    fn initial_element_name(&self) -> String {
        let form = self.form_name.as_deref().unwrap_or_default();
        form.replace('-', "_")
    }
}

impl Constructible for FormView {
    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match name {
            "view_type" => {
                if let Some(s) = value.as_str() {
                    self.view_type = s.to_string();
                }
                None
            }
            // Factory-assigned from the parent snapshot.
            "form" => None,
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

static FORM_VIEW_CHROME: TypeLevel<FormView> = TypeLevel {
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
        let name = view.initial_element_name();
        if let Some(element) = &mut view.element {
            element.set_name(&name);
        }
        let id = view.initial_element_id();
        crate::fields::apply_chrome(&mut view.element, &mut view.wrapper, &id, "custom-form");
    }),
};

static FORM_VIEW_BASE: TypeLevel<FormView> = TypeLevel {
    name: "form_view",
    class_values: None,
    properties: Some(|| vec![PropertySpec::new("form").ty("form").auto_create(false)]),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static DEFAULT_FORM_VIEW_LINEAGE: Lineage<FormView> =
    Lineage::new(&[&FORM_VIEW_CHROME, &FORM_VIEW_BASE]);

/// A registered form view type.
#[derive(Clone)]
pub struct FormViewType {
    pub class: &'static str,
    pub lineage: &'static Lineage<FormView>,
}

static FORM_VIEW_TYPES: LazyLock<RwLock<Registry<FormViewType>>> = LazyLock::new(|| {
    let mut registry = Registry::new("form_view_types");
    let _ = registry.register(
        "default",
        FormViewType {
            class: "form_view",
            lineage: &DEFAULT_FORM_VIEW_LINEAGE,
        },
    );
    RwLock::new(registry)
});

/// Register a form view type. Returns false if the name is taken.
pub fn register_form_view_type(name: &str, view_type: FormViewType) -> bool {
    FORM_VIEW_TYPES.write().register(name, view_type).is_ok()
}

/// Build a form view by type name.
pub fn make_form_view(view_type: &str, parent: ParentRef, mut args: ArgMap) -> Option<FormView> {
    let entry = FORM_VIEW_TYPES.read().get(view_type).cloned();
    let Some(entry) = entry else {
        tracing::warn!("Unknown form view type '{}'", view_type);
        return None;
    };

    args.remove("view_type");
    let mut view = FormView {
        view_type: view_type.to_string(),
        form_name: parent.form_name().map(str::to_string),
        ..Default::default()
    };
    build::build(entry.lineage, &mut view, args);
    Some(view)
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    const PARAMS: &[ParamSpec] = &[ParamSpec::Value, ParamSpec::Parent, ParamSpec::Args];

    vec![ClassDef {
        name: "form_view",
        base: Some("view"),
        parameters: PARAMS,
        make: Some(form_view_factory),
    }]
}

fn form_view_factory(params: Vec<ParamValue>) -> Option<BuiltObject> {
    let view_type = params
        .first()
        .and_then(|p| p.as_str())
        .unwrap_or("default")
        .to_string();
    let mut iter = params.into_iter().skip(1);
    let parent = iter.next().map(ParamValue::into_parent).unwrap_or_default();
    let args = iter.next().map(ParamValue::into_args).unwrap_or_default();

    make_form_view(&view_type, parent, args).map(|v| BuiltObject::FormView(Box::new(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_type::ObjectType;

    fn form_parent(name: &str) -> ParentRef {
        ParentRef::Form {
            form_name: name.to_string(),
            object_type: ObjectType::parse("post:solution"),
        }
    }

    #[test]
    fn test_form_view_chrome() {
        let view = make_form_view("default", form_parent("author_profile"), ArgMap::new()).unwrap();

        let element = view.element.as_ref().unwrap();
        assert_eq!(element.id().as_deref(), Some("author-profile-custom-form"));
        assert_eq!(element.class().as_deref(), Some("custom-form"));
        assert_eq!(element.name().as_deref(), Some("author_profile"));
        let wrapper = view.wrapper.as_ref().unwrap();
        assert_eq!(
            wrapper.id().as_deref(),
            Some("author-profile-custom-form-wrapper")
        );
    }

    #[test]
    fn test_unknown_form_view_type() {
        assert!(make_form_view("fancy", form_parent("x"), ArgMap::new()).is_none());
    }
}
