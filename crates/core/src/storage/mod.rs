//! Storage adapters - where field values live
//!
//! A field delegates persistence to a storage adapter chosen by name from
//! the storage type registry: `meta` (per-object metadata, the default),
//! `core` (a column of the core object record), `option` (site-wide named
//! settings) and `memory` (transient, test-friendly). Adapters address a
//! [`Backend`], the actual datastore boundary, which callers pass in
//! explicitly.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::ArgMap;
use crate::build::{self, BuiltObject, Constructible, ParamSpec, ParamValue, ParentRef};
use crate::classes::ClassDef;
use crate::meta::{Lineage, PropertySpec, TypeLevel};
use crate::object_type::{ObjectType, ANY_SUBTYPE};
use crate::registry::Registry;

/// The datastore boundary storage adapters write through.
pub trait Backend {
    fn get_meta(&self, meta_type: &str, object_id: i64, key: &str) -> Option<Value>;
    fn update_meta(&mut self, meta_type: &str, object_id: i64, key: &str, value: Value);
    fn get_option(&self, name: &str) -> Option<Value>;
    fn update_option(&mut self, name: &str, value: Value);
    /// A column of the core object record (post title, post content, …).
    fn get_core(&self, object_id: i64, column: &str) -> Option<Value>;
    fn update_core(&mut self, object_id: i64, column: &str, value: Value);
}

/// In-memory [`Backend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    meta: HashMap<(String, i64, String), Value>,
    options: HashMap<String, Value>,
    core: HashMap<(i64, String), Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get_meta(&self, meta_type: &str, object_id: i64, key: &str) -> Option<Value> {
        self.meta
            .get(&(meta_type.to_string(), object_id, key.to_string()))
            .cloned()
    }

    fn update_meta(&mut self, meta_type: &str, object_id: i64, key: &str, value: Value) {
        self.meta
            .insert((meta_type.to_string(), object_id, key.to_string()), value);
    }

    fn get_option(&self, name: &str) -> Option<Value> {
        self.options.get(name).cloned()
    }

    fn update_option(&mut self, name: &str, value: Value) {
        self.options.insert(name.to_string(), value);
    }

    fn get_core(&self, object_id: i64, column: &str) -> Option<Value> {
        self.core.get(&(object_id, column.to_string())).cloned()
    }

    fn update_core(&mut self, object_id: i64, column: &str, value: Value) {
        self.core.insert((object_id, column.to_string()), value);
    }
}

/// Adapter-specific state and addressing.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageKind {
    Meta { meta_type: String },
    Core,
    Option { option_prefix: Option<String> },
    Memory { value: Option<Value> },
}

/// A storage adapter bound to its owning field.
#[derive(Debug, Clone)]
pub struct Storage {
    pub storage_type: String,
    pub kind: StorageKind,
    /// Owning field's name, from the parent snapshot.
    pub field_name: String,
    /// Owning field's object type, which scopes option keys.
    pub object_type: ObjectType,
    /// The concrete object the adapter reads and writes for.
    pub object_id: Option<i64>,
    pub custom_args: ArgMap,
    raw_args: Option<ArgMap>,
}

impl Storage {
    fn new(storage_type: &str, kind: StorageKind, owner: &ParentRef) -> Self {
        Storage {
            storage_type: storage_type.to_string(),
            kind,
            field_name: owner.field_name().unwrap_or_default().to_string(),
            object_type: owner.object_type().cloned().unwrap_or_default(),
            object_id: None,
            custom_args: ArgMap::new(),
            raw_args: None,
        }
    }

    pub fn set_object_id(&mut self, object_id: Option<i64>) {
        self.object_id = object_id;
    }

    /// The key this adapter stores under.
    ///
    /// Meta keys hide behind an underscore, matching core convention for
    /// non-user-facing metadata. Option keys group by the object type's
    /// subtype: `{prefix}{subtype}[{field_name}]`, or `{prefix}{field_name}`
    /// for the `any` subtype.
    pub fn storage_key(&self) -> String {
        match &self.kind {
            StorageKind::Option { option_prefix } => {
                let prefix = option_prefix
                    .clone()
                    .unwrap_or_else(crate::config::option_prefix);
                if self.object_type.subtype == ANY_SUBTYPE {
                    format!("{prefix}{}", self.field_name)
                } else {
                    format!("{prefix}{}[{}]", self.object_type.subtype, self.field_name)
                }
            }
            _ => format!("_{}", self.field_name),
        }
    }

    pub fn get_value(&self, backend: &dyn Backend) -> Option<Value> {
        match &self.kind {
            StorageKind::Meta { meta_type } => {
                backend.get_meta(meta_type, self.object_id?, &self.storage_key())
            }
            StorageKind::Core => backend.get_core(self.object_id?, &self.field_name),
            StorageKind::Option { .. } => backend.get_option(&self.storage_key()),
            StorageKind::Memory { value } => value.clone(),
        }
    }

    pub fn update_value(&mut self, backend: &mut dyn Backend, value: Value) {
        match &mut self.kind {
            StorageKind::Meta { meta_type } => {
                let Some(object_id) = self.object_id else {
                    tracing::warn!("Meta storage for '{}' has no object", self.field_name);
                    return;
                };
                let key = format!("_{}", self.field_name);
                backend.update_meta(meta_type, object_id, &key, value);
            }
            StorageKind::Core => {
                let Some(object_id) = self.object_id else {
                    tracing::warn!("Core storage for '{}' has no object", self.field_name);
                    return;
                };
                backend.update_core(object_id, &self.field_name, value);
            }
            StorageKind::Option { .. } => {
                backend.update_option(&self.storage_key(), value);
            }
            StorageKind::Memory { value: stored } => {
                *stored = Some(value);
            }
        }
    }
}

impl Constructible for Storage {
    fn assign_field(&mut self, name: &str, value: Value) -> Option<Value> {
        match (name, &mut self.kind) {
            ("meta_type", StorageKind::Meta { meta_type }) => {
                if let Some(s) = value.as_str() {
                    *meta_type = s.to_string();
                }
                None
            }
            ("option_prefix", StorageKind::Option { option_prefix }) => {
                *option_prefix = value.as_str().map(str::to_string);
                None
            }
            ("object_id", _) => {
                self.object_id = value.as_i64();
                None
            }
            // Declared but factory-assigned; never overwritten from args.
            ("owner" | "object", _) => None,
            _ => Some(value),
        }
    }

    fn assign_object(&mut self, _name: &str, _built: BuiltObject) -> bool {
        false
    }

    fn custom_args_mut(&mut self) -> &mut ArgMap {
        &mut self.custom_args
    }

    fn set_raw_args(&mut self, args: Option<ArgMap>) {
        self.raw_args = args;
    }
}

fn storage_base_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::new("owner").auto_create(false),
        PropertySpec::new("object").auto_create(false),
    ]
}

static STORAGE_BASE: TypeLevel<Storage> = TypeLevel {
    name: "storage",
    class_values: None,
    properties: Some(storage_base_properties),
    initialize_class: None,
    pre_initialize: None,
    initialize: None,
};

static META_STORAGE: TypeLevel<Storage> = TypeLevel::new("meta_storage");
static CORE_STORAGE: TypeLevel<Storage> = TypeLevel::new("core_storage");
static OPTION_STORAGE: TypeLevel<Storage> = TypeLevel::new("option_storage");
static MEMORY_STORAGE: TypeLevel<Storage> = TypeLevel::new("memory_storage");

static META_LINEAGE: Lineage<Storage> = Lineage::new(&[&STORAGE_BASE, &META_STORAGE]);
static CORE_LINEAGE: Lineage<Storage> = Lineage::new(&[&STORAGE_BASE, &CORE_STORAGE]);
static OPTION_LINEAGE: Lineage<Storage> = Lineage::new(&[&STORAGE_BASE, &OPTION_STORAGE]);
static MEMORY_LINEAGE: Lineage<Storage> = Lineage::new(&[&STORAGE_BASE, &MEMORY_STORAGE]);

/// A registered storage type.
#[derive(Clone)]
pub struct StorageType {
    pub class: &'static str,
    pub lineage: &'static Lineage<Storage>,
    pub make_kind: fn() -> StorageKind,
}

static STORAGE_TYPES: LazyLock<RwLock<Registry<StorageType>>> = LazyLock::new(|| {
    let mut registry = Registry::new("storage_types");
    let _ = registry.register(
        "meta",
        StorageType {
            class: "meta_storage",
            lineage: &META_LINEAGE,
            make_kind: || StorageKind::Meta {
                meta_type: "post".to_string(),
            },
        },
    );
    let _ = registry.register(
        "core",
        StorageType {
            class: "core_storage",
            lineage: &CORE_LINEAGE,
            make_kind: || StorageKind::Core,
        },
    );
    let _ = registry.register(
        "option",
        StorageType {
            class: "option_storage",
            lineage: &OPTION_LINEAGE,
            make_kind: || StorageKind::Option { option_prefix: None },
        },
    );
    let _ = registry.register(
        "memory",
        StorageType {
            class: "memory_storage",
            lineage: &MEMORY_LINEAGE,
            make_kind: || StorageKind::Memory { value: None },
        },
    );
    RwLock::new(registry)
});

/// Register a storage type. Returns false if the name is taken.
pub fn register_storage_type(name: &str, storage_type: StorageType) -> bool {
    STORAGE_TYPES.write().register(name, storage_type).is_ok()
}

/// Build a storage adapter by type name.
pub fn make_storage(storage_type: &str, owner: ParentRef, args: ArgMap) -> Option<Storage> {
    let storage_type = if storage_type.is_empty() {
        "meta"
    } else {
        storage_type
    };

    let entry = STORAGE_TYPES.read().get(storage_type).cloned();
    let Some(entry) = entry else {
        tracing::warn!("Unknown storage type '{}'", storage_type);
        return None;
    };

    let mut storage = Storage::new(storage_type, (entry.make_kind)(), &owner);
    build::build(entry.lineage, &mut storage, args);
    Some(storage)
}

pub(crate) fn class_defs() -> Vec<ClassDef> {
    const PARAMS: &[ParamSpec] = &[ParamSpec::Value, ParamSpec::Parent, ParamSpec::Args];
    let make: fn(Vec<ParamValue>) -> Option<BuiltObject> = storage_factory;

    // The base class dispatches by storage type name, so a property can
    // declare `storage` and pick the concrete adapter through its value.
    let mut defs = vec![ClassDef {
        name: "storage",
        base: Some("base"),
        parameters: PARAMS,
        make: Some(make),
    }];
    for name in ["meta_storage", "core_storage", "option_storage", "memory_storage"] {
        defs.push(ClassDef {
            name,
            base: Some("storage"),
            parameters: PARAMS,
            make: Some(make),
        });
    }
    defs
}

fn storage_factory(params: Vec<ParamValue>) -> Option<BuiltObject> {
    let storage_type = params
        .first()
        .and_then(|p| p.as_str())
        .unwrap_or("meta")
        .to_string();
    let mut iter = params.into_iter().skip(1);
    let owner = iter.next().map(ParamValue::into_parent).unwrap_or_default();
    let args = iter.next().map(ParamValue::into_args).unwrap_or_default();

    make_storage(&storage_type, owner, args).map(|s| BuiltObject::Storage(Box::new(s)))
}
