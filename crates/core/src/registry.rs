//! Named registries - append-only name/value tables
//!
//! Every extension point in formforge (field types, view types, feature
//! types, storage types, factory classes) is a named registry: a map from a
//! string name to an implementation entry. Registries are append-only; a name,
//! once registered, keeps its first meaning for the life of the process so
//! that definitions captured early cannot be silently rebound later.

use std::collections::HashMap;

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already registered
    #[error("'{name}' is already registered in the {registry} registry")]
    Duplicate { registry: &'static str, name: String },

    /// The name was never registered
    #[error("'{name}' is not registered in the {registry} registry")]
    NotFound { registry: &'static str, name: String },
}

/// An append-only name/value table.
///
/// Insertion order is preserved for iteration so that listings are stable.
pub struct Registry<T> {
    name: &'static str,
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Registry<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry name, used in log messages and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register an entry under `key`.
    ///
    /// Fails without modifying the registry if `key` is already taken.
    pub fn register(&mut self, key: &str, entry: T) -> Result<(), RegistryError> {
        if self.entries.contains_key(key) {
            tracing::warn!("'{}' already registered in {} registry", key, self.name);
            return Err(RegistryError::Duplicate {
                registry: self.name,
                name: key.to_string(),
            });
        }

        self.entries.insert(key.to_string(), entry);
        self.order.push(key.to_string());
        tracing::debug!("Registered '{}' in {} registry", key, self.name);
        Ok(())
    }

    /// Look up an entry by name.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Registered entries, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = Registry::new("test");
        registry.register("alpha", 1).unwrap();
        registry.register("beta", 2).unwrap();

        assert_eq!(registry.get("alpha"), Some(&1));
        assert_eq!(registry.get("beta"), Some(&2));
        assert!(registry.get("gamma").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_append_only() {
        let mut registry = Registry::new("test");
        registry.register("alpha", 1).unwrap();

        // Re-registration fails and the first entry survives
        let err = registry.register("alpha", 99).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(registry.get("alpha"), Some(&1));
    }

    #[test]
    fn test_iteration_order() {
        let mut registry = Registry::new("test");
        registry.register("zulu", 1).unwrap();
        registry.register("alpha", 2).unwrap();
        registry.register("mike", 3).unwrap();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);
    }
}
