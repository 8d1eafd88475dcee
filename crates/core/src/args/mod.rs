//! Configuration maps - the currency of object construction
//!
//! Every constructible object in formforge is described by a flat
//! string-keyed configuration map. Keys use a compact path syntax
//! (`"view:features[input]:element:size"`) that the expander and collector
//! normalize before assignment. Values are [`serde_json::Value`] because a
//! single map mixes strings, numbers, booleans and nested maps.
//!
//! [`ArgMap`] preserves insertion order: defaults layer in declaration order
//! and caller keys keep their relative positions, which keeps assignment and
//! rendering deterministic.

mod collect;
mod expand;
mod path;

pub use collect::collect_args;
pub use expand::{expand_args, ShortnameRule};
pub use path::{split_head, ArgPath, PathSegment};

use serde_json::Value;

/// Reserved key recording the expansions performed on a map.
pub const EXPANDED_ARGS_KEY: &str = "_expanded_args";

/// Reserved key recording the keys collected into sub-maps.
pub const COLLECTED_ARGS_KEY: &str = "_collected_args";

/// Prefix marking context keys that must never leak into child construction.
pub const CONTEXT_SIGIL: char = '$';

/// Context key a collected sub-map uses to carry a scalar that previously
/// occupied the whole slot (the contained object's type selection).
pub const VALUE_CONTEXT_KEY: &str = "$value";

/// True for keys that carry construction bookkeeping rather than settings.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(CONTEXT_SIGIL) || key == EXPANDED_ARGS_KEY || key == COLLECTED_ARGS_KEY
}

/// An insertion-ordered string-to-value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap {
    entries: Vec<(String, Value)>,
}

impl ArgMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// String view of a value, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Insert a value. An existing key is updated in place, keeping its
    /// position; a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Move an existing key to the end of the map, keeping its value.
    pub fn move_to_end(&mut self, key: &str) {
        if let Some(idx) = self.entries.iter().position(|(k, _)| k == key) {
            let entry = self.entries.remove(idx);
            self.entries.push(entry);
        }
    }

    /// Layer `defaults` under this map: default keys come first in their own
    /// order, keys of this map override matching defaults in place, and keys
    /// unique to this map follow in their original order.
    pub fn apply_defaults(&mut self, defaults: &ArgMap) {
        if defaults.is_empty() {
            return;
        }
        let overrides = std::mem::take(&mut self.entries);
        self.entries = defaults.entries.clone();
        for (key, value) in overrides {
            self.insert(key, value);
        }
    }

    /// The value under `key` coerced to a sub-map.
    ///
    /// A missing key or a non-map value yields an empty map.
    pub fn sub_map(&self, key: &str) -> ArgMap {
        match self.get(key) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => ArgMap::new(),
        }
    }

    /// Drop context keys (`$`-prefixed) and reserved audit keys.
    pub fn strip_reserved(&mut self) {
        self.entries.retain(|(k, _)| !is_reserved_key(k));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The map as a JSON object value, in entry order.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.entries {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    /// Build a map from a JSON value; anything but an object is empty.
    pub fn from_value(value: &Value) -> ArgMap {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => ArgMap::new(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ArgMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ArgMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for ArgMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for ArgMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_preserves_order() {
        let mut args = ArgMap::new();
        args.insert("zulu", json!(1));
        args.insert("alpha", json!(2));
        args.insert("zulu", json!(3)); // update in place

        let keys: Vec<&str> = args.keys().collect();
        assert_eq!(keys, vec!["zulu", "alpha"]);
        assert_eq!(args.get("zulu"), Some(&json!(3)));
    }

    #[test]
    fn test_apply_defaults_layering() {
        let mut args = ArgMap::from([("size", json!(50)), ("label", json!("Website"))]);
        let defaults = ArgMap::from([("type", json!("text")), ("size", json!(25))]);

        args.apply_defaults(&defaults);

        let keys: Vec<&str> = args.keys().collect();
        assert_eq!(keys, vec!["type", "size", "label"]);
        assert_eq!(args.get("size"), Some(&json!(50)));
        assert_eq!(args.get("type"), Some(&json!("text")));
    }

    #[test]
    fn test_sub_map_coerces_non_objects() {
        let args = ArgMap::from([("view", json!({"view_type": "text"})), ("size", json!(50))]);

        assert_eq!(args.sub_map("view").get_str("view_type"), Some("text"));
        assert!(args.sub_map("size").is_empty());
        assert!(args.sub_map("missing").is_empty());
    }

    #[test]
    fn test_strip_reserved() {
        let mut args = ArgMap::from([
            ("$value", json!("x")),
            ("label", json!("Website")),
            ("_expanded_args", json!({})),
        ]);
        args.strip_reserved();

        let keys: Vec<&str> = args.keys().collect();
        assert_eq!(keys, vec!["label"]);
    }

    #[test]
    fn test_move_to_end() {
        let mut args = ArgMap::from([("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);
        args.move_to_end("a");

        let keys: Vec<&str> = args.keys().collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }
}
