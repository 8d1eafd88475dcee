//! Object types - classifying fields and forms by what they attach to
//!
//! An object type pairs a class of storable object (`post`, `user`,
//! `comment`, `option`, …) with a subtype specific to that class (a post
//! type, a user role). Literals use a colon: `"post:solution"`. A bare
//! literal without a colon is shorthand for a post subtype, and a missing
//! subtype means `"any"`, which matches every subtype of the class.

use std::collections::HashSet;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::html::sanitize_identifier;

/// Subtype wildcard matching every subtype of a class.
pub const ANY_SUBTYPE: &str = "any";

/// Classes recognized out of the box. Plugins may register more.
static CLASSES: LazyLock<RwLock<HashSet<String>>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    for class in ["post", "user", "comment", "option", "site_option"] {
        set.insert(class.to_string());
    }
    RwLock::new(set)
});

/// Register a new object type class. Returns false if already registered.
pub fn register_object_type_class(class: &str) -> bool {
    CLASSES.write().insert(class.to_string())
}

/// Whether `class` is a registered object type class.
pub fn is_registered_class(class: &str) -> bool {
    CLASSES.read().contains(class)
}

/// A class/subtype pair identifying what a field or form attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectType {
    pub class: String,
    pub subtype: String,
}

impl ObjectType {
    pub fn new(class: &str, subtype: &str) -> Self {
        let subtype = if subtype.is_empty() {
            ANY_SUBTYPE.to_string()
        } else {
            // An unsanitizable subtype falls back to the wildcard.
            sanitize_identifier(subtype).unwrap_or_else(|| ANY_SUBTYPE.to_string())
        };
        ObjectType {
            class: sanitize_identifier(class).unwrap_or_default(),
            subtype,
        }
    }

    /// Parse an object type literal.
    ///
    /// `"post:page"` is class and subtype; `"user:"` is a class with the
    /// `any` subtype; a bare `"solution"` is a post subtype.
    pub fn parse(literal: &str) -> Self {
        match literal.split_once(':') {
            Some((class, subtype)) => ObjectType::new(class, subtype),
            None => ObjectType::new("post", literal),
        }
    }

    /// Object type for a post type, `post:any` when no type is given.
    pub fn post(post_type: Option<&str>) -> Self {
        match post_type {
            Some(post_type) if !post_type.is_empty() => ObjectType::new("post", post_type),
            _ => ObjectType::new("post", ANY_SUBTYPE),
        }
    }

    /// Object type for a user role, `user:any` when no role is given.
    pub fn user(role: Option<&str>) -> Self {
        match role {
            Some(role) if !role.is_empty() => ObjectType::new("user", role),
            _ => ObjectType::new("user", ANY_SUBTYPE),
        }
    }

    /// Object type for a comment type, `comment:any` when no type is given.
    pub fn comment(comment_type: Option<&str>) -> Self {
        match comment_type {
            Some(comment_type) if !comment_type.is_empty() => {
                ObjectType::new("comment", comment_type)
            }
            _ => ObjectType::new("comment", ANY_SUBTYPE),
        }
    }

    /// Object type for an option group.
    pub fn option(option_group: &str) -> Self {
        ObjectType::new("option", option_group)
    }

    /// The subtype unless it is `any`, else the class. Used for simplified
    /// output where full qualification is noise.
    pub fn unqualified_type(&self) -> &str {
        if self.subtype == ANY_SUBTYPE {
            &self.class
        } else {
            &self.subtype
        }
    }

    /// Valid object types have a non-empty class.
    pub fn is_valid(&self) -> bool {
        !self.class.is_empty()
    }

    /// Equivalent types have the same class and subtype.
    pub fn is_equivalent(&self, other: &ObjectType) -> bool {
        self == other
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.class, self.subtype)
    }
}

impl From<String> for ObjectType {
    fn from(literal: String) -> Self {
        ObjectType::parse(&literal)
    }
}

impl From<ObjectType> for String {
    fn from(object_type: ObjectType) -> Self {
        object_type.to_string()
    }
}

impl Default for ObjectType {
    fn default() -> Self {
        ObjectType::post(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_literal() {
        let ot = ObjectType::parse("post:page");
        assert_eq!(ot.class, "post");
        assert_eq!(ot.subtype, "page");
        assert_eq!(ot.to_string(), "post:page");
    }

    #[test]
    fn test_bare_literal_is_post_subtype() {
        let ot = ObjectType::parse("solution");
        assert_eq!(ot.class, "post");
        assert_eq!(ot.subtype, "solution");
    }

    #[test]
    fn test_trailing_colon_means_any() {
        let ot = ObjectType::parse("user:");
        assert_eq!(ot.class, "user");
        assert_eq!(ot.subtype, ANY_SUBTYPE);
        assert_eq!(ot.unqualified_type(), "user");
    }

    #[test]
    fn test_equivalence() {
        assert!(ObjectType::parse("post:page").is_equivalent(&ObjectType::new("post", "page")));
        assert!(!ObjectType::parse("post:page").is_equivalent(&ObjectType::parse("post:any")));
    }

    #[test]
    fn test_register_class() {
        assert!(register_object_type_class("event"));
        assert!(!register_object_type_class("event")); // second time fails
        assert!(is_registered_class("post"));
    }
}
