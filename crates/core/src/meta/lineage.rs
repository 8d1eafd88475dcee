//! Type levels and lineages
//!
//! A [`TypeLevel`] is one explicit slice of a constructible kind's behavior:
//! the values, property declarations and lifecycle hooks one "class" in the
//! conceptual hierarchy contributes. A [`Lineage`] is the ordered chain of
//! levels for a concrete type, most distant ancestor first. Merged metadata
//! is computed once per lineage and cached; the once-per-process class
//! admission hook is likewise guarded per lineage rather than through a
//! global class-name cache.

use std::sync::{Once, OnceLock};

use crate::args::{ArgMap, ShortnameRule};

use super::{AnnotatedProperty, PropertySpec};

/// Static values one level contributes: default args and shorthand rules.
#[derive(Debug, Clone, Default)]
pub struct ClassValues {
    /// Default argument values, layered under caller args.
    pub defaults: ArgMap,
    /// Shorthand table entries as (pattern, template) pairs.
    pub shortnames: Vec<(String, String)>,
}

impl ClassValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    pub fn shortname(mut self, pattern: impl Into<String>, template: impl Into<String>) -> Self {
        self.shortnames.push((pattern.into(), template.into()));
        self
    }
}

/// One level of a constructible type's behavior.
///
/// All members are optional; a level contributes only what it declares.
/// Hooks receive the concrete target type, so a level is always written for
/// the kind it serves.
pub struct TypeLevel<T: 'static> {
    /// Level name, used in merged-metadata diagnostics.
    pub name: &'static str,
    /// Static values (defaults, shorthand rules).
    pub class_values: Option<fn() -> ClassValues>,
    /// Property declarations.
    pub properties: Option<fn() -> Vec<PropertySpec>>,
    /// Runs once per process when the first instance of the lineage is
    /// admitted.
    pub initialize_class: Option<fn()>,
    /// Filter hook: may rewrite the final argument map before assignment is
    /// published to the initialize hooks.
    pub pre_initialize: Option<fn(&mut T, ArgMap) -> ArgMap>,
    /// Action hook: runs after assignment with the final argument map.
    pub initialize: Option<fn(&mut T, &ArgMap)>,
}

impl<T> TypeLevel<T> {
    pub const fn new(name: &'static str) -> Self {
        TypeLevel {
            name,
            class_values: None,
            properties: None,
            initialize_class: None,
            pre_initialize: None,
            initialize: None,
        }
    }
}

/// Metadata merged across a lineage's levels.
pub struct MergedMeta {
    /// Merged default args (ancestor declarations first, descendants
    /// override in place).
    pub defaults: ArgMap,
    /// Compiled shorthand table, ancestor rules first; a descendant rule
    /// with the same pattern replaces the ancestor's template in place.
    pub shortnames: Vec<ShortnameRule>,
    /// Resolved property annotations, in declaration order.
    pub annotations: Vec<AnnotatedProperty>,
    /// Argument prefixes of containing properties, for collection.
    pub prefixes: Vec<String>,
}

impl MergedMeta {
    pub fn annotation(&self, name: &str) -> Option<&AnnotatedProperty> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// The ordered level chain of a concrete constructible type.
pub struct Lineage<T: 'static> {
    levels: &'static [&'static TypeLevel<T>],
    admitted: Once,
    meta: OnceLock<MergedMeta>,
}

impl<T> Lineage<T> {
    /// Build a lineage from its level chain, most distant ancestor first.
    pub const fn new(levels: &'static [&'static TypeLevel<T>]) -> Self {
        Lineage {
            levels,
            admitted: Once::new(),
            meta: OnceLock::new(),
        }
    }

    /// The most derived level's name.
    pub fn name(&self) -> &'static str {
        self.levels.last().map(|l| l.name).unwrap_or("")
    }

    /// Levels, most distant ancestor first.
    pub fn levels(&self) -> impl Iterator<Item = &'static TypeLevel<T>> + '_ {
        self.levels.iter().copied()
    }

    /// Run the once-per-process admission hooks, ancestor first.
    ///
    /// Subsequent calls are no-ops, including calls racing the first one.
    pub fn admit(&self) {
        self.admitted.call_once(|| {
            for level in self.levels {
                if let Some(hook) = level.initialize_class {
                    hook();
                }
            }
        });
    }

    /// The merged metadata, computed on first use.
    pub fn meta(&self) -> &MergedMeta {
        self.meta.get_or_init(|| self.merge())
    }

    fn merge(&self) -> MergedMeta {
        let mut defaults = ArgMap::new();
        let mut raw_shortnames: Vec<(String, String)> = Vec::new();
        let mut specs: Vec<PropertySpec> = Vec::new();

        for level in self.levels {
            if let Some(values) = level.class_values {
                let values = values();
                for (k, v) in values.defaults {
                    defaults.insert(k, v);
                }
                for (pattern, template) in values.shortnames {
                    match raw_shortnames.iter_mut().find(|(p, _)| *p == pattern) {
                        Some(slot) => slot.1 = template,
                        None => raw_shortnames.push((pattern, template)),
                    }
                }
            }
            if let Some(properties) = level.properties {
                for spec in properties() {
                    match specs.iter().position(|s| s.name == spec.name) {
                        Some(idx) => specs[idx] = spec.merge_over(&specs[idx]),
                        None => specs.push(spec),
                    }
                }
            }
        }

        let annotations: Vec<AnnotatedProperty> =
            specs.iter().map(AnnotatedProperty::resolve).collect();

        // Property defaults layer under the level defaults. Auto-created
        // object properties always get an entry, so they are built even when
        // the caller passes nothing for them.
        let mut merged_defaults = ArgMap::new();
        for ann in &annotations {
            if let Some(default) = &ann.default {
                merged_defaults.insert(ann.name.clone(), default.clone());
            } else if ann.auto_create && (ann.is_class() || ann.is_array()) {
                let seed = if ann.is_array() {
                    serde_json::Value::Object(serde_json::Map::new())
                } else {
                    serde_json::Value::Null
                };
                merged_defaults.insert(ann.name.clone(), seed);
            }
        }
        for (k, v) in defaults {
            merged_defaults.insert(k, v);
        }

        let prefixes = annotations
            .iter()
            .filter(|a| a.is_class() || a.is_array())
            .map(|a| a.prefix().to_string())
            .collect();

        let shortnames = raw_shortnames
            .iter()
            .filter_map(|(p, t)| ShortnameRule::new(p, t.as_str()))
            .collect();

        MergedMeta {
            defaults: merged_defaults,
            shortnames,
            annotations,
            prefixes,
        }
    }

    /// Run the `pre_initialize` filter chain, ancestor first, threading the
    /// argument map through each hook.
    pub fn apply_filters(&self, target: &mut T, mut args: ArgMap) -> ArgMap {
        for level in self.levels {
            if let Some(hook) = level.pre_initialize {
                args = hook(target, args);
            }
        }
        args
    }

    /// Run the `initialize` action chain, ancestor first.
    pub fn do_action(&self, target: &mut T, args: &ArgMap) {
        for level in self.levels {
            if let Some(hook) = level.initialize {
                hook(target, args);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Probe {
        calls: Vec<&'static str>,
    }

    static GRANDPARENT: TypeLevel<Probe> = TypeLevel {
        name: "grandparent",
        class_values: Some(|| {
            ClassValues::new()
                .default_arg("color", "red")
                .default_arg("size", 1)
        }),
        properties: None,
        initialize_class: Some(|| {
            ADMISSIONS.fetch_add(1, Ordering::SeqCst);
        }),
        pre_initialize: Some(|probe, args| {
            probe.calls.push("grandparent:pre");
            args
        }),
        initialize: Some(|probe, _| probe.calls.push("grandparent:init")),
    };

    static PARENT: TypeLevel<Probe> = TypeLevel {
        name: "parent",
        class_values: Some(|| ClassValues::new().default_arg("size", 2)),
        properties: None,
        initialize_class: None,
        pre_initialize: Some(|probe, args| {
            probe.calls.push("parent:pre");
            args
        }),
        initialize: Some(|probe, _| probe.calls.push("parent:init")),
    };

    static CHILD: TypeLevel<Probe> = TypeLevel {
        name: "child",
        class_values: None,
        properties: None,
        initialize_class: None,
        pre_initialize: None,
        initialize: Some(|probe, _| probe.calls.push("child:init")),
    };

    static ADMISSIONS: AtomicUsize = AtomicUsize::new(0);
    static LINEAGE: Lineage<Probe> = Lineage::new(&[&GRANDPARENT, &PARENT, &CHILD]);
    static ADMIT_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn test_hooks_run_ancestor_first() {
        let mut probe = Probe::default();
        let args = LINEAGE.apply_filters(&mut probe, ArgMap::new());
        LINEAGE.do_action(&mut probe, &args);

        assert_eq!(
            probe.calls,
            vec![
                "grandparent:pre",
                "parent:pre",
                "grandparent:init",
                "parent:init",
                "child:init"
            ]
        );
    }

    #[test]
    fn test_admission_runs_once() {
        let _guard = ADMIT_GUARD.lock().unwrap();
        let before = ADMISSIONS.load(Ordering::SeqCst);
        LINEAGE.admit();
        LINEAGE.admit();
        let after = ADMISSIONS.load(Ordering::SeqCst);

        // At most one admission ever happens, no matter how often called.
        assert!(after - before <= 1);
        LINEAGE.admit();
        assert_eq!(ADMISSIONS.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_descendant_defaults_override_in_place() {
        let meta = LINEAGE.meta();
        let keys: Vec<&str> = meta.defaults.keys().collect();
        assert_eq!(keys, vec!["color", "size"]);
        assert_eq!(meta.defaults.get("size"), Some(&json!(2)));
    }
}
