//! Factory class table
//!
//! Contained objects are declared by class name (`"element"`,
//! `"field_view"`, `"label_feature"`, …). This table maps each name to its
//! factory: a parameter template plus a make function, and a base class name
//! for subtype checks on registry-typed arrays. Built-in classes seed the
//! table on first use; plugins may register their own.

use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::build::{build_parameters, BuildContext, BuiltObject, ParamSpec, ParamValue};
use crate::registry::Registry;

/// A factory class entry.
#[derive(Clone)]
pub struct ClassDef {
    pub name: &'static str,
    /// Base class, for subtype checks. `None` for roots.
    pub base: Option<&'static str>,
    /// Constructor parameter template.
    pub parameters: &'static [ParamSpec],
    /// Factory function. `None` marks an abstract base.
    pub make: Option<fn(Vec<ParamValue>) -> Option<BuiltObject>>,
}

impl ClassDef {
    pub const fn abstract_base(name: &'static str, base: Option<&'static str>) -> Self {
        ClassDef {
            name,
            base,
            parameters: &[],
            make: None,
        }
    }
}

static CLASSES: LazyLock<RwLock<Registry<ClassDef>>> = LazyLock::new(|| {
    let mut registry = Registry::new("classes");

    let mut defs: Vec<ClassDef> = vec![
        ClassDef::abstract_base("base", None),
        ClassDef::abstract_base("view", Some("base")),
    ];
    defs.extend(crate::html::class_defs());
    defs.extend(crate::fields::class_defs());
    defs.extend(crate::fields::view::class_defs());
    defs.extend(crate::fields::features::class_defs());
    defs.extend(crate::forms::class_defs());
    defs.extend(crate::storage::class_defs());

    for def in defs {
        // Seed entries are distinct by construction.
        let _ = registry.register(def.name, def);
    }

    RwLock::new(registry)
});

/// Register a factory class. Returns false if the name is taken.
pub fn register_class(def: ClassDef) -> bool {
    CLASSES.write().register(def.name, def).is_ok()
}

/// Whether `name` is a registered factory class.
pub fn contains(name: &str) -> bool {
    CLASSES.read().contains(name)
}

/// Look up a class entry.
pub fn get(name: &str) -> Option<ClassDef> {
    CLASSES.read().get(name).cloned()
}

/// The base chain of a class, most distant ancestor first, ending with the
/// class itself. An unregistered name is its own chain.
pub fn ancestry(name: &str) -> Vec<String> {
    let registry = CLASSES.read();
    let mut chain = vec![name.to_string()];
    let mut current = name.to_string();
    while let Some(base) = registry.get(&current).and_then(|d| d.base) {
        if chain.iter().any(|c| c == base) {
            tracing::warn!("Class base cycle through '{}'", base);
            break;
        }
        chain.push(base.to_string());
        current = base.to_string();
    }
    chain.reverse();
    chain
}

/// Whether `name` is `base` or descends from it.
pub fn is_subtype(name: &str, base: &str) -> bool {
    ancestry(name).iter().any(|c| c == base)
}

/// Resolvers mapping a type-registry key to a factory class name, used when
/// building registry-typed keyed arrays (`"feature_types"` maps `"label"` to
/// `"label_feature"`).
static TYPE_REGISTRIES: LazyLock<RwLock<Registry<fn(&str) -> Option<&'static str>>>> =
    LazyLock::new(|| {
        let mut registry = Registry::new("type_registries");
        let _ = registry.register(
            "feature_types",
            crate::fields::features::class_for as fn(&str) -> Option<&'static str>,
        );
        RwLock::new(registry)
    });

/// Register a type-registry resolver for keyed-array annotations.
pub fn register_type_registry(name: &str, resolver: fn(&str) -> Option<&'static str>) -> bool {
    TYPE_REGISTRIES.write().register(name, resolver).is_ok()
}

/// Resolve a key of a named type registry to its factory class.
pub fn registry_class(registry: &str, key: &str) -> Option<&'static str> {
    let registries = TYPE_REGISTRIES.read();
    let resolver = registries.get(registry)?;
    resolver(key)
}

/// Build an instance of `class` from its argument sub-map and context.
///
/// Unknown and abstract classes are reported and yield `None`; the caller
/// skips the property and construction continues.
pub fn make_object(class: &str, object_args: &crate::args::ArgMap, ctx: &BuildContext) -> Option<BuiltObject> {
    let Some(def) = get(class) else {
        tracing::warn!("Unknown factory class '{}'", class);
        return None;
    };
    let Some(make) = def.make else {
        tracing::warn!("Factory class '{}' is abstract", class);
        return None;
    };
    let params = build_parameters(def.parameters, object_args, ctx);
    make(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_classes_seed() {
        assert!(contains("element"));
        assert!(contains("field_view"));
        assert!(contains("label_feature"));
        assert!(contains("meta_storage"));
    }

    #[test]
    fn test_subtype_chains() {
        assert!(is_subtype("label_feature", "feature"));
        assert!(is_subtype("label_feature", "view"));
        assert!(is_subtype("field_view", "view"));
        assert!(!is_subtype("element", "view"));
        assert!(is_subtype("element", "element"));
    }

    #[test]
    fn test_unknown_class_is_its_own_ancestry() {
        assert_eq!(ancestry("no_such_class"), vec!["no_such_class".to_string()]);
    }
}
