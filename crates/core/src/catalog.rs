//! Field and form catalog - registration and retrieval
//!
//! Definitions register once as argument maps; objects build fresh on every
//! retrieval, so two forms showing the same field never share state.
//! Lookups key on the exact object type literal.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::args::ArgMap;
use crate::fields::{self, Field};
use crate::forms::{self, Form};
use crate::object_type::ObjectType;

new_key_type! {
    /// Handle for a registered field definition
    pub struct FieldDefKey;

    /// Handle for a registered form definition
    pub struct FormDefKey;
}

/// A registered field definition
struct FieldDef {
    field_name: String,
    /// Construction args as registered, layered under retrieval args.
    args: ArgMap,
}

/// A registered form definition
struct FormDef {
    form_name: String,
    args: ArgMap,
}

/// Global definition catalog
pub struct Catalog {
    fields: SlotMap<FieldDefKey, FieldDef>,
    forms: SlotMap<FormDefKey, FormDef>,

    /// Field keys per object type literal, in registration order
    fields_by_type: HashMap<String, Vec<FieldDefKey>>,

    /// Form keys per object type literal, in registration order
    forms_by_type: HashMap<String, Vec<FormDefKey>>,

    /// Form lookup by (object type literal, form name)
    forms_by_name: HashMap<(String, String), FormDefKey>,
}

impl Catalog {
    fn new() -> Self {
        Self {
            fields: SlotMap::with_key(),
            forms: SlotMap::with_key(),
            fields_by_type: HashMap::new(),
            forms_by_type: HashMap::new(),
            forms_by_name: HashMap::new(),
        }
    }

    fn register_field(
        &mut self,
        field_name: &str,
        object_type: ObjectType,
        args: ArgMap,
    ) -> FieldDefKey {
        let type_literal = object_type.to_string();

        // Re-registration replaces the stored definition.
        let existing = self.fields_by_type.get(&type_literal).and_then(|keys| {
            keys.iter()
                .copied()
                .find(|k| self.fields[*k].field_name == field_name)
        });
        if let Some(existing) = existing {
            tracing::warn!(
                "Field '{}' re-registered for '{}'",
                field_name,
                object_type
            );
            self.fields[existing].args = args;
            return existing;
        }

        let key = self.fields.insert(FieldDef {
            field_name: field_name.to_string(),
            args,
        });
        self.fields_by_type.entry(type_literal).or_default().push(key);
        key
    }

    fn field_def(&self, field_name: &str, object_type: &ObjectType) -> Option<&FieldDef> {
        self.fields_by_type
            .get(&object_type.to_string())?
            .iter()
            .map(|k| &self.fields[*k])
            .find(|def| def.field_name == field_name)
    }

    fn field_names(&self, object_type: &ObjectType) -> Vec<String> {
        self.fields_by_type
            .get(&object_type.to_string())
            .map(|keys| {
                keys.iter()
                    .map(|k| self.fields[*k].field_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn register_form(
        &mut self,
        form_name: &str,
        object_type: ObjectType,
        args: ArgMap,
    ) -> FormDefKey {
        let index = (object_type.to_string(), form_name.to_string());
        if let Some(existing) = self.forms_by_name.get(&index) {
            tracing::warn!("Form '{}' re-registered for '{}'", form_name, object_type);
            self.forms[*existing].args = args;
            return *existing;
        }

        let key = self.forms.insert(FormDef {
            form_name: form_name.to_string(),
            args,
        });
        self.forms_by_type.entry(index.0.clone()).or_default().push(key);
        self.forms_by_name.insert(index, key);
        key
    }

    fn form_def(&self, form_name: &str, object_type: &ObjectType) -> Option<&FormDef> {
        let index = (object_type.to_string(), form_name.to_string());
        self.forms_by_name.get(&index).map(|k| &self.forms[*k])
    }

    fn form_names(&self, object_type: &ObjectType) -> Vec<String> {
        self.forms_by_type
            .get(&object_type.to_string())
            .map(|keys| {
                keys.iter()
                    .map(|k| self.forms[*k].form_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

static CATALOG: LazyLock<RwLock<Catalog>> = LazyLock::new(|| RwLock::new(Catalog::new()));

/// Register a field definition for an object type.
pub fn register_field(field_name: &str, object_type: ObjectType, args: ArgMap) -> FieldDefKey {
    CATALOG.write().register_field(field_name, object_type, args)
}

/// Register a field definition for a post type.
pub fn register_post_field(field_name: &str, post_type: &str, args: ArgMap) -> FieldDefKey {
    register_field(field_name, ObjectType::post(Some(post_type)), args)
}

/// Register a field definition for a user role (`None` for every role).
pub fn register_user_field(field_name: &str, role: Option<&str>, args: ArgMap) -> FieldDefKey {
    register_field(field_name, ObjectType::user(role), args)
}

/// Register a field definition for a comment type (`None` for every type).
pub fn register_comment_field(
    field_name: &str,
    comment_type: Option<&str>,
    args: ArgMap,
) -> FieldDefKey {
    register_field(field_name, ObjectType::comment(comment_type), args)
}

/// Register a field definition for an option group.
pub fn register_option_field(field_name: &str, option_group: &str, args: ArgMap) -> FieldDefKey {
    register_field(field_name, ObjectType::option(option_group), args)
}

/// Names of the fields registered for an object type, in registration order.
pub fn get_field_names(object_type: &ObjectType) -> Vec<String> {
    CATALOG.read().field_names(object_type)
}

/// Build a registered field.
///
/// Retrieval args layer over the stored definition, so a form can inject its
/// membership without touching the registration.
pub fn get_field(field_name: &str, object_type: &ObjectType, args: ArgMap) -> Option<Field> {
    let merged = {
        let catalog = CATALOG.read();
        let def = catalog.field_def(field_name, object_type)?;
        let mut merged = def.args.clone();
        for (k, v) in args {
            merged.insert(k, v);
        }
        merged
    };
    fields::make_field(field_name, object_type.clone(), merged)
}

/// Register a form definition for an object type.
pub fn register_form(form_name: &str, object_type: ObjectType, args: ArgMap) -> FormDefKey {
    CATALOG.write().register_form(form_name, object_type, args)
}

/// Register a form definition for a post type.
pub fn register_post_form(form_name: &str, post_type: &str, args: ArgMap) -> FormDefKey {
    register_form(form_name, ObjectType::post(Some(post_type)), args)
}

/// Register a form definition for a user role (`None` for every role).
pub fn register_user_form(form_name: &str, role: Option<&str>, args: ArgMap) -> FormDefKey {
    register_form(form_name, ObjectType::user(role), args)
}

/// Register a form definition for a comment type (`None` for every type).
pub fn register_comment_form(
    form_name: &str,
    comment_type: Option<&str>,
    args: ArgMap,
) -> FormDefKey {
    register_form(form_name, ObjectType::comment(comment_type), args)
}

/// Register a form definition for an option group.
pub fn register_option_form(form_name: &str, option_group: &str, args: ArgMap) -> FormDefKey {
    register_form(form_name, ObjectType::option(option_group), args)
}

/// Names of the forms registered for an object type, in registration order.
pub fn get_form_names(object_type: &ObjectType) -> Vec<String> {
    CATALOG.read().form_names(object_type)
}

/// Build a registered form, which picks up the type's registered fields.
///
/// An unregistered name still yields a form; registration only contributes
/// stored args.
pub fn get_form(form_name: &str, object_type: &ObjectType, args: ArgMap) -> Form {
    let merged = {
        let catalog = CATALOG.read();
        match catalog.form_def(form_name, object_type) {
            Some(def) => {
                let mut merged = def.args.clone();
                for (k, v) in args.iter() {
                    merged.insert(k, v.clone());
                }
                merged
            }
            None => args,
        }
    };
    forms::make_form(form_name, object_type.clone(), merged)
}

/// Build every registered form for an object type, or just the named ones.
///
/// Unknown names are skipped. Forms come back in registration order (or in
/// the requested order when names are given).
pub fn get_forms(object_type: &ObjectType, form_names: Option<&[&str]>) -> Vec<Form> {
    let registered = get_form_names(object_type);
    let selected: Vec<String> = match form_names {
        Some(names) => names
            .iter()
            .filter(|n| registered.iter().any(|r| r == *n))
            .map(|n| n.to_string())
            .collect(),
        None => registered,
    };
    selected
        .iter()
        .map(|name| get_form(name, object_type, ArgMap::new()))
        .collect()
}
