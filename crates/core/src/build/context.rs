//! Construction context - what a factory knows about its surroundings
//!
//! Contained objects are built while their owner is still being assembled,
//! so they receive a [`ParentRef`]: a snapshot of the owner's identifying
//! names rather than a reference into it. Rendering later threads the real
//! owner back down by reference.

use serde_json::Value;

use crate::args::ArgMap;
use crate::fields::{Feature, Field, FieldView};
use crate::forms::FormView;
use crate::html::HtmlElement;
use crate::object_type::ObjectType;
use crate::storage::Storage;

/// Snapshot of the owner an object is being built into.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParentRef {
    #[default]
    None,
    /// Owned by a field (views, storage).
    Field {
        field_name: String,
        form_name: Option<String>,
        object_type: ObjectType,
    },
    /// Owned by a view (features, elements).
    View {
        view_type: String,
        field_name: Option<String>,
        form_name: Option<String>,
    },
    /// Owned by a form (form views).
    Form {
        form_name: String,
        object_type: ObjectType,
    },
}

impl ParentRef {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ParentRef::Field { field_name, .. } => Some(field_name),
            ParentRef::View { field_name, .. } => field_name.as_deref(),
            _ => None,
        }
    }

    pub fn form_name(&self) -> Option<&str> {
        match self {
            ParentRef::Field { form_name, .. } | ParentRef::View { form_name, .. } => {
                form_name.as_deref()
            }
            ParentRef::Form { form_name, .. } => Some(form_name),
            ParentRef::None => None,
        }
    }

    pub fn object_type(&self) -> Option<&ObjectType> {
        match self {
            ParentRef::Field { object_type, .. } | ParentRef::Form { object_type, .. } => {
                Some(object_type)
            }
            _ => None,
        }
    }
}

/// Context handed to a factory along with the object's own argument sub-map.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// The raw value of the containing property (a sub-map for contained
    /// objects, the entry key for keyed-array members).
    pub value: Value,
    /// Snapshot of the owner under construction.
    pub parent: ParentRef,
    /// The annotation's custom bag, consulted for named parameters the
    /// argument sub-map does not carry.
    pub custom: ArgMap,
}

/// A factory's product, still untyped at the assignment seam.
#[derive(Debug, Clone)]
pub enum BuiltObject {
    Element(HtmlElement),
    Field(Box<Field>),
    FieldView(Box<FieldView>),
    FormView(Box<FormView>),
    Feature(Box<Feature>),
    Storage(Box<Storage>),
    /// A keyed array of built objects, in declared-key order.
    Keyed(Vec<(String, BuiltObject)>),
}
