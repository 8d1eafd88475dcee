//! Path collector - grouping prefixed keys into sub-maps
//!
//! After expansion a map holds canonical compound keys such as
//! `"view:view_type"` or `"features[input]:element:size"`. Collection groups
//! these, one level deep, under their head segment: everything after the
//! first colon stays a single (possibly still compound) key inside the
//! sub-map, to be collected again when the child object is constructed.
//! Only heads naming a declared containing property are collected; anything
//! else stays in place so that unknown keys degrade to custom values instead
//! of failing construction.

use serde_json::Value;

use super::{split_head, ArgMap, COLLECTED_ARGS_KEY};

/// Collect compound keys with recognized head prefixes into sub-maps.
///
/// Compound keys move to the end of the map (in their relative order) before
/// collection, so plain settings keep their positions up front. For an
/// indexed head (`features[input]:…`) the value lands two levels down, under
/// the index. The original key/value pairs that were collected are recorded
/// under [`COLLECTED_ARGS_KEY`].
pub fn collect_args(mut args: ArgMap, prefixes: &[String]) -> ArgMap {
    let compound: Vec<String> = args
        .keys()
        .filter(|k| !super::is_reserved_key(k) && k.contains(':'))
        .map(str::to_string)
        .collect();

    for key in &compound {
        args.move_to_end(key);
    }

    let mut audit = serde_json::Map::new();

    for key in compound {
        let Some((head, rest)) = split_head(&key) else {
            continue;
        };
        if !prefixes.iter().any(|p| p == &head.name) {
            continue;
        }
        let Some(value) = args.remove(&key) else {
            continue;
        };
        audit.insert(key.clone(), value.clone());

        let container = container_mut(&mut args, &head.name);
        match head.index {
            Some(index) => {
                let inner = container
                    .entry(index)
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                fold_scalar(inner);
                if let Value::Object(inner) = inner {
                    inner.insert(rest.to_string(), value);
                }
            }
            None => {
                container.insert(rest.to_string(), value);
            }
        }
    }

    if !audit.is_empty() {
        args.insert(COLLECTED_ARGS_KEY, Value::Object(audit));
    }

    args
}

/// Rewrite a scalar in place as a sub-map carrying the scalar under the
/// `$value` context key, so a type selection (`storage = "option"`) survives
/// sub-args arriving for the same head.
fn fold_scalar(slot: &mut Value) {
    if slot.is_object() {
        return;
    }
    let mut map = serde_json::Map::new();
    if !slot.is_null() {
        map.insert(super::VALUE_CONTEXT_KEY.to_string(), slot.take());
    }
    *slot = Value::Object(map);
}

/// The sub-map for `name`, creating it (or folding a scalar value in place)
/// as needed.
fn container_mut<'a>(args: &'a mut ArgMap, name: &str) -> &'a mut serde_json::Map<String, Value> {
    if args.get(name).is_none() {
        args.insert(name.to_string(), Value::Object(serde_json::Map::new()));
    }
    match args.get_mut(name) {
        Some(slot) => {
            fold_scalar(slot);
            match slot {
                Value::Object(map) => map,
                _ => unreachable!("container was just folded to an object"),
            }
        }
        None => unreachable!("container was just inserted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prefixes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_level_collection() {
        let args = collect_args(
            ArgMap::from([("features[input]:element:size", json!(50))]),
            &prefixes(&["features"]),
        );

        assert_eq!(
            args.get("features"),
            Some(&json!({"input": {"element:size": 50}}))
        );
        assert!(args.get("features[input]:element:size").is_none());
    }

    #[test]
    fn test_plain_head_collection() {
        let args = collect_args(
            ArgMap::from([
                ("view:view_type", json!("text")),
                ("view:features[label]:label_text", json!("Website")),
            ]),
            &prefixes(&["view"]),
        );

        let view = args.sub_map("view");
        assert_eq!(view.get_str("view_type"), Some("text"));
        assert_eq!(
            view.get_str("features[label]:label_text"),
            Some("Website")
        );
    }

    #[test]
    fn test_unrecognized_prefix_left_in_place() {
        let args = collect_args(
            ArgMap::from([("custom:thing", json!(1))]),
            &prefixes(&["view"]),
        );

        assert_eq!(args.get("custom:thing"), Some(&json!(1)));
        assert!(args.get(COLLECTED_ARGS_KEY).is_none());
    }

    #[test]
    fn test_merges_into_existing_container() {
        let args = collect_args(
            ArgMap::from([
                ("view", json!({"view_type": "text"})),
                ("view:wrapper:size", json!(3)),
            ]),
            &prefixes(&["view"]),
        );

        let view = args.sub_map("view");
        assert_eq!(view.get_str("view_type"), Some("text"));
        assert_eq!(view.get("wrapper:size"), Some(&json!(3)));
    }

    #[test]
    fn test_audit_records_collected_pairs() {
        let args = collect_args(
            ArgMap::from([("view:view_type", json!("text"))]),
            &prefixes(&["view"]),
        );

        assert_eq!(
            args.get(COLLECTED_ARGS_KEY),
            Some(&json!({"view:view_type": "text"}))
        );
    }

    #[test]
    fn test_scalar_head_folds_under_value_key() {
        let args = collect_args(
            ArgMap::from([
                ("storage", json!("option")),
                ("storage:option_prefix", json!("x_")),
            ]),
            &prefixes(&["storage"]),
        );

        // The type selection survives alongside the collected sub-arg.
        assert_eq!(
            args.get("storage"),
            Some(&json!({"$value": "option", "option_prefix": "x_"}))
        );
    }

    #[test]
    fn test_plain_keys_keep_positions() {
        let args = collect_args(
            ArgMap::from([
                ("view:view_type", json!("text")),
                ("required", json!(true)),
            ]),
            &prefixes(&["view"]),
        );

        // Plain settings sort ahead of collected containers.
        let first = args.keys().next().unwrap().to_string();
        assert_eq!(first, "required");
    }
}
