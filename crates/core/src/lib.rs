//! formforge - declarative custom fields and forms
//!
//! Fields, forms, views, features and storage adapters all build through one
//! configuration pipeline: an ordered argument map passes through shorthand
//! expansion, prefix collection and annotated assignment, with contained
//! objects built through their factory classes along the way. Registries
//! keep every type name open to extension, and configuration mistakes
//! degrade to logged warnings rather than failures.
//!
//! ```
//! use formforge_core::{catalog, ArgMap, ObjectType};
//! use serde_json::json;
//!
//! catalog::register_post_field(
//!     "website",
//!     "solution",
//!     ArgMap::from([
//!         ("type", json!("url")),
//!         ("label", json!("Website")),
//!         ("size", json!(50)),
//!     ]),
//! );
//!
//! let form = catalog::get_form(
//!     "profile",
//!     &ObjectType::post(Some("solution")),
//!     ArgMap::new(),
//! );
//! let html = form.html();
//! assert!(html.contains("Website"));
//! ```

pub mod args;
pub mod build;
pub mod catalog;
pub mod classes;
pub mod config;
pub mod fields;
pub mod forms;
pub mod html;
pub mod meta;
pub mod object_type;
pub mod registry;
pub mod storage;

// Re-export commonly used items
pub use args::{ArgMap, ArgPath, PathSegment, ShortnameRule};
pub use build::{build, BuildContext, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
pub use catalog::{
    get_field, get_field_names, get_form, get_form_names, get_forms, register_comment_field,
    register_comment_form, register_field, register_form, register_option_field,
    register_option_form, register_post_field, register_post_form, register_user_field,
    register_user_form,
};
pub use classes::{register_class, register_type_registry, ClassDef};
pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use fields::{
    make_field, register_feature_type, register_field_type, register_view_type, Feature, Field,
    FieldType, FieldView,
};
pub use forms::{make_form, register_form_view_type, Form, FormView};
pub use html::HtmlElement;
pub use meta::{AnnotatedProperty, ClassValues, Lineage, PropertySpec, TypeLevel};
pub use object_type::{register_object_type_class, ObjectType};
pub use registry::{Registry, RegistryError};
pub use storage::{register_storage_type, Backend, MemoryBackend, Storage, StorageKind};
