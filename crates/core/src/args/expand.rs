//! Path expander - shorthand keys to canonical paths
//!
//! Constructible classes publish shorthand tables: ordered lists of
//! regex/template pairs that rewrite ergonomic keys (`"label"`, `"size"`)
//! into full canonical paths (`"view:features[label]:label_text"`,
//! `"view:features[input]:element:size"`). Expansion runs once per
//! construction, before collection.

use regex::Regex;
use serde_json::Value;

use super::{ArgMap, EXPANDED_ARGS_KEY};

/// One shorthand rewrite rule.
///
/// The pattern carries its own anchors (`^label$`); the template may use
/// capture references (`$1`, `$2`).
#[derive(Debug, Clone)]
pub struct ShortnameRule {
    pattern: Regex,
    template: String,
}

impl ShortnameRule {
    /// Compile a rule. An invalid pattern is reported and dropped; a bad
    /// table entry must not abort construction of everything else.
    pub fn new(pattern: &str, template: impl Into<String>) -> Option<ShortnameRule> {
        match Regex::new(pattern) {
            Ok(regex) => Some(ShortnameRule {
                pattern: regex,
                template: template.into(),
            }),
            Err(err) => {
                tracing::warn!("Invalid shortname pattern '{}': {}", pattern, err);
                None
            }
        }
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The expanded key, if the rule matches.
    pub fn expand(&self, key: &str) -> Option<String> {
        if !self.pattern.is_match(key) {
            return None;
        }
        Some(self.pattern.replace(key, self.template.as_str()).into_owned())
    }
}

/// Apply a shorthand table to a configuration map.
///
/// Rules apply in table order; a key rewritten by an earlier rule is visible
/// to later rules under its new name. Expanded keys move to the end of the
/// map, matching remove-then-reinsert semantics. When any expansion happened,
/// the original key/value pairs are recorded under [`EXPANDED_ARGS_KEY`] so
/// a misbehaving shorthand table can be diagnosed from the constructed
/// object alone (the expanded key is recoverable from the rule table).
pub fn expand_args(mut args: ArgMap, rules: &[ShortnameRule]) -> ArgMap {
    let mut audit = serde_json::Map::new();

    for rule in rules {
        let keys: Vec<String> = args
            .keys()
            .filter(|k| !super::is_reserved_key(k))
            .map(str::to_string)
            .collect();

        for key in keys {
            let Some(expanded) = rule.expand(&key) else {
                continue;
            };
            if expanded == key {
                continue;
            }
            if let Some(value) = args.remove(&key) {
                audit.insert(key, value.clone());
                args.insert(expanded, value);
            }
        }
    }

    if !audit.is_empty() {
        args.insert(EXPANDED_ARGS_KEY, Value::Object(audit));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(table: &[(&str, &str)]) -> Vec<ShortnameRule> {
        table
            .iter()
            .filter_map(|(p, t)| ShortnameRule::new(p, *t))
            .collect()
    }

    #[test]
    fn test_literal_expansion() {
        let rules = rules(&[("^label$", "view:features[label]:label_text")]);
        let args = expand_args(ArgMap::from([("label", json!("Website"))]), &rules);

        assert_eq!(
            args.get("view:features[label]:label_text"),
            Some(&json!("Website"))
        );
        assert!(args.get("label").is_none());
    }

    #[test]
    fn test_capture_expansion() {
        let rules = rules(&[("^(size|maxlength)$", "view:features[input]:element:$1")]);
        let args = expand_args(
            ArgMap::from([("size", json!(50)), ("other", json!(true))]),
            &rules,
        );

        assert_eq!(
            args.get("view:features[input]:element:size"),
            Some(&json!(50))
        );
        // Non-matching keys pass through untouched
        assert_eq!(args.get("other"), Some(&json!(true)));
    }

    #[test]
    fn test_audit_keeps_original_pairs() {
        let rules = rules(&[("^label$", "view:features[label]:label_text")]);
        let args = expand_args(ArgMap::from([("label", json!("Website"))]), &rules);

        // The audit holds the pre-expansion pair, not the rewritten key.
        let audit = args.get(EXPANDED_ARGS_KEY).unwrap();
        assert_eq!(audit["label"], json!("Website"));
        assert_eq!(
            args.get("view:features[label]:label_text"),
            Some(&json!("Website"))
        );
    }

    #[test]
    fn test_no_audit_without_expansion() {
        let rules = rules(&[("^label$", "view:features[label]:label_text")]);
        let args = expand_args(ArgMap::from([("size", json!(50))]), &rules);

        assert!(args.get(EXPANDED_ARGS_KEY).is_none());
    }

    #[test]
    fn test_invalid_pattern_is_dropped() {
        assert!(ShortnameRule::new("^(unclosed$", "x").is_none());
    }

    #[test]
    fn test_rules_apply_in_order() {
        // The second rule sees the first rule's output.
        let rules = rules(&[("^width$", "size"), ("^size$", "element:size")]);
        let args = expand_args(ArgMap::from([("width", json!(10))]), &rules);

        assert_eq!(args.get("element:size"), Some(&json!(10)));
    }
}
