//! Forms - ordered collections of fields for one object type
//!
//! A [`Form`] gathers the fields registered for its object type and renders
//! them through a form view. Value round-trips go through each field's own
//! storage adapter; the form only fans the calls out.

pub mod view;

pub use view::{register_form_view_type, FormView, FormViewType};

use serde_json::Value;

use crate::args::ArgMap;
use crate::build::{self, BuiltObject, Constructible, ParentRef};
use crate::classes::ClassDef;
use crate::fields::Field;
use crate::meta::{Lineage, PropertySpec, TypeLevel};
use crate::object_type::ObjectType;
use crate::storage::{Backend, Storage};

/// A form bound to an object type.
#[derive(Debug, Clone, Default)]
pub struct Form {
    pub form_name: String,
    pub object_type: ObjectType,
    pub view: Option<FormView>,
    pub storage: Option<Storage>,
    /// Fields in registration order.
    pub fields: Vec<(String, Field)>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl Form {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }

    /// Add a field, claiming it for this form. Replaces any same-named one.
    pub fn add_field(&mut self, mut field: Field) {
        field.form_name = Some(self.form_name.clone());
        let name = field.field_name.clone();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = field,
            None => self.fields.push((name, field)),
        }
    }

    /// Bind every field to a concrete object.
    pub fn set_object_id(&mut self, object_id: Option<i64>) {
        for (_, field) in &mut self.fields {
            field.set_object_id(object_id);
        }
    }

    /// Fill every field's cached value from storage.
    pub fn load_values(&mut self, backend: &dyn Backend) {
        for (_, field) in &mut self.fields {
            field.load_value(backend);
        }
    }

    /// Persist submitted values.
    ///
    /// With no value map every field writes its cached value. With one, only
    /// named fields update; an explicit null clears (stored as `false`, so an
    /// unchecked box round-trips distinguishably from an absent key).
    pub fn update_values(&mut self, values: Option<&ArgMap>, backend: &mut dyn Backend) {
        match values {
            None => {
                for (_, field) in &mut self.fields {
                    field.update_value(None, backend);
                }
            }
            Some(values) => {
                for (name, field) in &mut self.fields {
                    let Some(value) = values.get(name) else {
                        continue;
                    };
                    let value = if value.is_null() {
                        Value::Bool(false)
                    } else {
                        value.clone()
                    };
                    field.update_value(Some(value), backend);
                }
            }
        }
    }

    pub fn html(&self) -> String {
        match &self.view {
            Some(view) => view.html(self),
            None => String::new(),
        }
    }
}

impl Constructible for Form {
    fn parent_ref(&self) -> ParentRef {
        ParentRef::Form {
            form_name: self.form_name.clone(),
            object_type: self.object_type.clone(),
        }
    }

    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match name {
            "form_name" => {
                if let Some(s) = value.as_str() {
                    self.form_name = s.to_string();
                }
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
            ("view", BuiltObject::FormView(view)) => {
                self.view = Some(*view);
                true
            }
            ("storage", BuiltObject::Storage(storage)) => {
                self.storage = Some(*storage);
                true
            }
            ("fields", BuiltObject::Keyed(built)) => {
                for (_, object) in built {
                    if let BuiltObject::Field(field) = object {
                        self.add_field(*field);
                    }
                }
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

static FORM_BASE: TypeLevel<Form> = TypeLevel {
    name: "form",
    class_values: None,
    properties: Some(|| {
        vec![
            PropertySpec::new("view").ty("form_view").default("default"),
            PropertySpec::new("storage").ty("storage").default("meta"),
            PropertySpec::new("fields").ty("field[]").auto_create(false),
        ]
    }),
    initialize_class: None,
    pre_initialize: None,
    initialize: Some(|form, _| {
        // Fields registered for this object type join the form.
        if form.fields.is_empty() {
            for field_name in crate::catalog::get_field_names(&form.object_type) {
                let extra = ArgMap::from([("form", Value::String(form.form_name.clone()))]);
                if let Some(field) = crate::catalog::get_field(&field_name, &form.object_type, extra)
                {
                    form.add_field(field);
                }
            }
        }
    }),
};

static FORM_LINEAGE: Lineage<Form> = Lineage::new(&[&FORM_BASE]);

/// Build a form for an object type.
pub fn make_form(form_name: &str, object_type: ObjectType, args: ArgMap) -> Form {
    let mut form = Form {
        form_name: form_name.to_string(),
        object_type,
        ..Default::default()
    };
    build::build(&FORM_LINEAGE, &mut form, args);
    form
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    let mut defs = vec![ClassDef::abstract_base("form", Some("base"))];
    defs.extend(view::class_defs());
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn form_with_field(field_name: &str) -> Form {
        let mut form = make_form("profile", ObjectType::parse("post:solution"), ArgMap::new());
        let field = crate::fields::make_field(
            field_name,
            ObjectType::parse("post:solution"),
            ArgMap::new(),
        )
        .unwrap();
        form.add_field(field);
        form
    }

    #[test]
    fn test_default_view_builds() {
        let form = make_form("profile", ObjectType::parse("post:solution"), ArgMap::new());
        let view = form.view.as_ref().unwrap();
        assert_eq!(view.view_type, "default");
    }

    #[test]
    fn test_add_field_claims_membership() {
        let form = form_with_field("website");
        assert_eq!(
            form.field("website").unwrap().form_name.as_deref(),
            Some("profile")
        );
    }

    #[test]
    fn test_update_values_null_clears() {
        let mut backend = MemoryBackend::new();
        let mut form = form_with_field("website");
        form.set_object_id(Some(3));

        let values = ArgMap::from([("website", Value::Null)]);
        form.update_values(Some(&values), &mut backend);

        assert_eq!(form.field("website").unwrap().value(), Some(&json!(false)));
    }

    #[test]
    fn test_update_values_skips_absent_fields() {
        let mut backend = MemoryBackend::new();
        let mut form = form_with_field("website");
        form.set_object_id(Some(3));

        let values = ArgMap::from([("other", json!("x"))]);
        form.update_values(Some(&values), &mut backend);

        assert_eq!(form.field("website").unwrap().value(), None);
    }
}
