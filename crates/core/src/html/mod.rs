//! HTML element generation
//!
//! [`HtmlElement`] turns a tag name, an attribute map and an inner value
//! into markup. Attributes pass through the validity table for the tag, so a
//! `size` sent to a `<div>` silently drops while the same key on an
//! `<input>` renders. Elements do not contain child elements; a composed
//! view renders its children first and sets the result as the parent's
//! value.

mod attributes;

pub use attributes::{
    attribute_text, escape_attr, is_valid_attribute, is_void_tag, sanitize_identifier,
    sanitize_identifier_with, valid_attributes, VOID_ELEMENTS,
};

use serde_json::Value;

use crate::args::ArgMap;
use crate::build::{BuiltObject, ParamSpec, ParamValue};
use crate::classes::ClassDef;

/// A single HTML element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlElement {
    tag: String,
    attributes: ArgMap,
    /// Inner text for normal elements, the `value` attribute for void ones.
    pub value: Option<String>,
}

impl HtmlElement {
    pub fn new(tag: impl Into<String>, attributes: ArgMap, value: Option<String>) -> Self {
        HtmlElement {
            tag: tag.into(),
            attributes,
            value,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// An attribute as trimmed text, if set to something renderable.
    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.attributes
            .get(name)
            .and_then(attribute_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Set an attribute. Null or false removes it.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if matches!(value, Value::Null | Value::Bool(false)) {
            self.attributes.remove(name);
        } else {
            self.attributes.insert(name, value);
        }
    }

    /// Append to an attribute's existing value, space-separated. Useful for
    /// stacking class selectors.
    pub fn append_attribute(&mut self, name: &str, value: &str) {
        match self.attribute_value(name) {
            Some(existing) => {
                self.attributes
                    .insert(name, format!("{existing} {value}").trim().to_string());
            }
            None => self.set_attribute(name, value),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.attribute_value("id")
    }

    pub fn set_id(&mut self, id: &str) {
        self.set_attribute("id", id);
    }

    pub fn name(&self) -> Option<String> {
        self.attribute_value("name")
    }

    pub fn set_name(&mut self, name: &str) {
        self.set_attribute("name", name);
    }

    pub fn class(&self) -> Option<String> {
        self.attribute_value("class")
    }

    pub fn set_class(&mut self, class: &str) {
        self.set_attribute("class", class);
    }

    pub fn append_class(&mut self, class: &str) {
        self.append_attribute("class", class);
    }

    /// Render the element.
    ///
    /// An unsanitizable tag renders as a comment, leaving a debuggable trace
    /// in the output instead of broken markup.
    pub fn html(&self) -> String {
        let Some(tag) = sanitize_identifier(&self.tag) else {
            return "<!-- invalid html element tag -->".to_string();
        };

        let attributes = self.attributes_html(&tag);
        let mut html = if attributes.is_empty() {
            format!("<{tag}>")
        } else {
            format!("<{tag} {attributes}>")
        };

        if !self.is_void() {
            if let Some(value) = &self.value {
                html.push_str(value);
            }
            html.push_str(&format!("</{tag}>"));
        }
        html
    }

    /// The `name="value"` pairs valid for this tag, space-separated.
    fn attributes_html(&self, tag: &str) -> String {
        let mut pairs: Vec<String> = Vec::new();

        for (name, value) in self.attributes.iter() {
            if !is_valid_attribute(tag, name) {
                continue;
            }
            let Some(name) = sanitize_identifier(name) else {
                continue;
            };
            if let Some(text) = attribute_text(value) {
                pairs.push(format!("{}=\"{}\"", name, escape_attr(&text)));
            }
        }

        // Void elements carry their value as the value attribute.
        if self.is_void() && is_valid_attribute(tag, "value") && !self.attributes.contains_key("value") {
            if let Some(value) = &self.value {
                pairs.push(format!("value=\"{}\"", escape_attr(value)));
            }
        }

        pairs.join(" ")
    }
}

/// Factory entry for the `element` class.
pub(crate) fn class_defs() -> Vec<ClassDef> {
    vec![ClassDef {
        name: "element",
        base: None,
        parameters: &[ParamSpec::Named("html_tag"), ParamSpec::Value, ParamSpec::Null],
        make: Some(make_element),
    }]
}

fn make_element(params: Vec<ParamValue>) -> Option<BuiltObject> {
    let Some(tag) = params.first().and_then(|p| p.as_str()).map(str::to_string) else {
        tracing::warn!("Element factory called without an html_tag");
        return None;
    };
    let attributes = params
        .get(1)
        .and_then(|p| p.as_value())
        .map(ArgMap::from_value)
        .unwrap_or_default();
    let value = params
        .get(2)
        .and_then(|p| p.as_str())
        .map(str::to_string);

    Some(BuiltObject::Element(HtmlElement::new(tag, attributes, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_normal_element() {
        let mut element = HtmlElement::new(
            "div",
            ArgMap::from([("class", json!("wrapper"))]),
            Some("inner".to_string()),
        );
        element.set_id("main");

        assert_eq!(element.html(), r#"<div class="wrapper" id="main">inner</div>"#);
    }

    #[test]
    fn test_render_void_element() {
        let element = HtmlElement::new(
            "input",
            ArgMap::from([("type", json!("text")), ("size", json!(50))]),
            Some("hello".to_string()),
        );

        let html = element.html();
        assert!(html.starts_with("<input "));
        assert!(!html.contains("</input>"));
        assert!(html.contains(r#"size="50""#));
        assert!(html.contains(r#"value="hello""#));
    }

    #[test]
    fn test_invalid_attributes_dropped() {
        let element = HtmlElement::new(
            "div",
            ArgMap::from([("size", json!(50)), ("class", json!("x"))]),
            None,
        );

        let html = element.html();
        assert!(!html.contains("size"));
        assert!(html.contains(r#"class="x""#));
    }

    #[test]
    fn test_invalid_tag_renders_comment() {
        let element = HtmlElement::new("scr ipt", ArgMap::new(), None);
        assert_eq!(element.html(), "<!-- invalid html element tag -->");
    }

    #[test]
    fn test_attribute_escaping() {
        let element = HtmlElement::new(
            "div",
            ArgMap::from([("title", json!(r#"a"b<c>"#))]),
            None,
        );
        assert!(element.html().contains(r#"title="a&quot;b&lt;c&gt;""#));
    }

    #[test]
    fn test_append_class() {
        let mut element = HtmlElement::new("div", ArgMap::new(), None);
        element.set_class("custom-field");
        element.append_class("text-field");
        assert_eq!(element.class().as_deref(), Some("custom-field text-field"));
    }

    #[test]
    fn test_false_attribute_suppressed() {
        let element = HtmlElement::new(
            "input",
            ArgMap::from([("required", json!(false)), ("type", json!("text"))]),
            None,
        );
        assert!(!element.html().contains("required"));
    }
}
