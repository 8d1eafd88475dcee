//! Property annotations
//!
//! An annotation describes one declared property of a constructible class:
//! its kind (scalar, contained object, or keyed array of registry-typed
//! objects), its default, the argument prefix it collects under, and a
//! custom bag of extra values that factories may consult. Levels declare
//! partial [`PropertySpec`]s; descendant specs merge field-wise over
//! ancestor specs before resolving into an [`AnnotatedProperty`].

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;

use crate::args::ArgMap;

/// A partial property declaration on one type level.
///
/// Unset fields inherit from ancestor declarations of the same property.
#[derive(Debug, Clone, Default)]
pub struct PropertySpec {
    pub name: String,
    pub type_tag: Option<String>,
    pub default: Option<Value>,
    pub auto_create: Option<bool>,
    pub prefix: Option<String>,
    pub registry: Option<String>,
    pub keys: Option<Vec<String>>,
    pub custom: ArgMap,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>) -> Self {
        PropertySpec {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declared type: a factory class name, `"name[]"` for a keyed array of
    /// that class, or a scalar tag such as `"mixed"`.
    pub fn ty(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_create(mut self, auto: bool) -> Self {
        self.auto_create = Some(auto);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn keys(mut self, keys: &[&str]) -> Self {
        self.keys = Some(keys.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key, value);
        self
    }

    /// Merge this (descendant) spec over an ancestor spec of the same
    /// property. Set fields win; custom values merge key-wise.
    pub fn merge_over(self, ancestor: &PropertySpec) -> PropertySpec {
        let mut custom = ancestor.custom.clone();
        for (k, v) in self.custom.iter() {
            custom.insert(k, v.clone());
        }
        PropertySpec {
            name: self.name,
            type_tag: self.type_tag.or_else(|| ancestor.type_tag.clone()),
            default: self.default.or_else(|| ancestor.default.clone()),
            auto_create: self.auto_create.or(ancestor.auto_create),
            prefix: self.prefix.or_else(|| ancestor.prefix.clone()),
            registry: self.registry.or_else(|| ancestor.registry.clone()),
            keys: self.keys.or_else(|| ancestor.keys.clone()),
            custom,
        }
    }
}

/// What kind of value a property holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// A plain value assigned directly.
    Scalar,
    /// A single contained object built through the named factory class.
    Class(String),
    /// A keyed array of objects whose classes come from a registry.
    Array { of: String },
}

/// A fully resolved property annotation.
#[derive(Debug, Clone)]
pub struct AnnotatedProperty {
    pub name: String,
    pub kind: PropertyKind,
    pub default: Option<Value>,
    pub auto_create: bool,
    prefix: String,
    pub registry: Option<String>,
    pub keys: Vec<String>,
    pub custom: ArgMap,
}

impl AnnotatedProperty {
    /// Resolve a merged spec into an annotation.
    ///
    /// A type tag ending in `[]` is a keyed array of the named class; a tag
    /// naming a registered factory class is a contained object; anything
    /// else (including no tag) is a scalar. For object kinds the custom bag
    /// starts from the class's registered default annotations.
    pub fn resolve(spec: &PropertySpec) -> AnnotatedProperty {
        let tag = spec.type_tag.as_deref().unwrap_or("mixed");

        let kind = if let Some(element) = tag.strip_suffix("[]") {
            PropertyKind::Array {
                of: element.to_string(),
            }
        } else if crate::classes::contains(tag) {
            PropertyKind::Class(tag.to_string())
        } else {
            PropertyKind::Scalar
        };

        let mut custom = match &kind {
            PropertyKind::Class(class) | PropertyKind::Array { of: class } => {
                default_annotations_for(class)
            }
            PropertyKind::Scalar => ArgMap::new(),
        };
        for (k, v) in spec.custom.iter() {
            custom.insert(k, v.clone());
        }

        AnnotatedProperty {
            name: spec.name.clone(),
            kind,
            default: spec.default.clone(),
            auto_create: spec.auto_create.unwrap_or(true),
            prefix: spec
                .prefix
                .clone()
                .unwrap_or_else(|| spec.name.clone()),
            registry: spec.registry.clone(),
            keys: spec.keys.clone().unwrap_or_default(),
            custom,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, PropertyKind::Class(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, PropertyKind::Array { .. })
    }

    /// The factory class this property contains, for object kinds.
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Class(c) | PropertyKind::Array { of: c } => Some(c),
            PropertyKind::Scalar => None,
        }
    }

    /// The argument prefix this property collects under (defaults to the
    /// property name).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Default annotation values per factory class, applied to every property of
/// that class unless the declaring spec overrides them.
static DEFAULT_ANNOTATIONS: LazyLock<RwLock<HashMap<String, ArgMap>>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    // Elements render as <div> unless a property says otherwise.
    map.insert(
        "element".to_string(),
        ArgMap::from([("html_tag", Value::String("div".to_string()))]),
    );
    RwLock::new(map)
});

/// Register default annotation values for a factory class.
///
/// Values merge over any previously registered defaults for the same class.
pub fn register_default_annotations(class: &str, defaults: ArgMap) {
    let mut store = DEFAULT_ANNOTATIONS.write();
    let entry = store.entry(class.to_string()).or_default();
    for (k, v) in defaults {
        entry.insert(k, v);
    }
}

/// The merged default annotations for a class, most distant ancestor first.
pub fn default_annotations_for(class: &str) -> ArgMap {
    let store = DEFAULT_ANNOTATIONS.read();
    let mut merged = ArgMap::new();
    for ancestor in crate::classes::ancestry(class) {
        if let Some(defaults) = store.get(&ancestor) {
            for (k, v) in defaults.iter() {
                merged.insert(k, v.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_type_tag() {
        let ann = AnnotatedProperty::resolve(
            &PropertySpec::new("features")
                .ty("feature[]")
                .registry("feature_types")
                .keys(&["label", "input"]),
        );

        assert!(ann.is_array());
        assert_eq!(ann.class_name(), Some("feature"));
        assert_eq!(ann.keys, vec!["label", "input"]);
        assert_eq!(ann.prefix(), "features");
    }

    #[test]
    fn test_scalar_default() {
        let ann = AnnotatedProperty::resolve(&PropertySpec::new("required").default(false));
        assert_eq!(ann.kind, PropertyKind::Scalar);
        assert_eq!(ann.default, Some(json!(false)));
        assert!(ann.auto_create);
    }

    #[test]
    fn test_element_gets_default_html_tag() {
        let ann = AnnotatedProperty::resolve(&PropertySpec::new("wrapper").ty("element"));
        assert!(ann.is_class());
        assert_eq!(ann.custom.get_str("html_tag"), Some("div"));
    }

    #[test]
    fn test_spec_custom_overrides_default_annotations() {
        let ann = AnnotatedProperty::resolve(
            &PropertySpec::new("element")
                .ty("element")
                .custom("html_tag", "input"),
        );
        assert_eq!(ann.custom.get_str("html_tag"), Some("input"));
    }

    #[test]
    fn test_merge_over() {
        let parent = PropertySpec::new("element").ty("element").auto_create(true);
        let child = PropertySpec::new("element").custom("html_tag", "label");
        let merged = child.merge_over(&parent);

        assert_eq!(merged.type_tag.as_deref(), Some("element"));
        assert_eq!(merged.custom.get_str("html_tag"), Some("label"));
    }
}
