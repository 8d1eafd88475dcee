//! Per-tag attribute tables, identifier sanitizing and escaping
//!
//! Elements only render attributes that are valid for their tag: the HTML5
//! global attributes plus tag-specific ones. The merged table per tag is
//! memoized, since the same handful of tags render over and over.

use std::sync::LazyLock;

use dashmap::DashMap;
use serde_json::Value;

/// HTML5 elements that take no closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Whether `tag` is a void element (case-insensitive).
pub fn is_void_tag(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Global attributes valid on every element.
/// See <http://www.w3.org/TR/html5/dom.html#global-attributes>
const GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "dropzone",
    "hidden",
    "id",
    "lang",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
];

fn tag_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "input" => &[
            "accept",
            "alt",
            "autocomplete",
            "autofocus",
            "autosave",
            "checked",
            "dirname",
            "disabled",
            "form",
            "formaction",
            "formenctype",
            "formmethod",
            "formnovalidate",
            "formtarget",
            "height",
            "inputmode",
            "list",
            "max",
            "maxlength",
            "min",
            "minlength",
            "multiple",
            "name",
            "pattern",
            "placeholder",
            "readonly",
            "required",
            "selectionDirection",
            "size",
            "src",
            "step",
            "type",
            "value",
            "width",
        ],
        "textarea" => &["cols", "name", "rows", "tabindex", "wrap"],
        "label" => &["for", "form"],
        "ul" => &["compact", "type"],
        "ol" => &["compact", "reversed", "start", "type"],
        "li" => &["type", "value"],
        "a" => &[
            "charset", "coords", "download", "href", "hreflang", "media", "rel", "target", "type",
        ],
        _ => &[],
    }
}

static ATTRIBUTE_CACHE: LazyLock<DashMap<String, Vec<&'static str>>> = LazyLock::new(DashMap::new);

/// The full set of attribute names valid for `tag`, globals included.
pub fn valid_attributes(tag: &str) -> Vec<&'static str> {
    if let Some(cached) = ATTRIBUTE_CACHE.get(tag) {
        return cached.clone();
    }
    let mut attributes: Vec<&'static str> = GLOBAL_ATTRIBUTES.to_vec();
    attributes.extend_from_slice(tag_attributes(tag));
    ATTRIBUTE_CACHE.insert(tag.to_string(), attributes.clone());
    attributes
}

/// Whether `name` is a valid attribute of `tag`.
pub fn is_valid_attribute(tag: &str, name: &str) -> bool {
    valid_attributes(tag).iter().any(|a| *a == name)
}

/// Sanitize an identifier: lowercased, must start with a letter or
/// underscore and contain only `[a-z0-9_]` plus `allow`ed characters.
/// Anything else is rejected outright rather than partially cleaned.
pub fn sanitize_identifier_with(identifier: &str, allow: &[char]) -> Option<String> {
    let lowered = identifier.to_lowercase();
    let mut chars = lowered.chars();

    let first = chars.next()?;
    if !(first.is_ascii_lowercase() || first == '_') {
        return None;
    }
    let valid = lowered
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || allow.contains(&c));
    valid.then_some(lowered)
}

/// [`sanitize_identifier_with`] with no extra allowed characters.
pub fn sanitize_identifier(identifier: &str) -> Option<String> {
    sanitize_identifier_with(identifier, &[])
}

/// Escape text for an HTML attribute value.
pub fn escape_attr(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// An attribute value as renderable text.
///
/// Null and false suppress the attribute; true renders as `"1"`, matching
/// how boolean settings arrive from configuration maps.
pub fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("1".to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("input"));
        assert!(is_void_tag("BR"));
        assert!(!is_void_tag("div"));
    }

    #[test]
    fn test_valid_attributes_per_tag() {
        assert!(is_valid_attribute("input", "size"));
        assert!(is_valid_attribute("input", "type"));
        assert!(is_valid_attribute("label", "for"));
        assert!(is_valid_attribute("div", "class")); // global
        assert!(!is_valid_attribute("div", "size"));
        assert!(!is_valid_attribute("label", "size"));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("My_Field2"), Some("my_field2".to_string()));
        assert_eq!(sanitize_identifier("2bad"), None);
        assert_eq!(sanitize_identifier("has-dash"), None);
        assert_eq!(
            sanitize_identifier_with("has-dash", &['-']),
            Some("has-dash".to_string())
        );
        assert_eq!(sanitize_identifier(""), None);
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a<b>"c"&'d'"#), "a&lt;b&gt;&quot;c&quot;&amp;&#039;d&#039;");
    }

    #[test]
    fn test_attribute_text() {
        assert_eq!(attribute_text(&json!("x")), Some("x".to_string()));
        assert_eq!(attribute_text(&json!(50)), Some("50".to_string()));
        assert_eq!(attribute_text(&json!(true)), Some("1".to_string()));
        assert_eq!(attribute_text(&json!(false)), None);
        assert_eq!(attribute_text(&Value::Null), None);
    }
}
