//! Typed parser for compact argument paths
//!
//! A path is a colon-separated chain of segments, each an identifier with an
//! optional bracketed index: `view:features[input]:element:size`. Parsing
//! happens once, up front; the expander and collector work on the parsed
//! form rather than re-splitting strings ad hoc.

/// One step of an argument path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Segment name (`features` in `features[input]`).
    pub name: String,
    /// Bracketed index, if present (`input` in `features[input]`).
    pub index: Option<String>,
}

impl PathSegment {
    /// Parse a single segment. A malformed bracket (no closing `]`, or
    /// trailing text after it) leaves the whole text as the name.
    pub fn parse(text: &str) -> PathSegment {
        if let Some(open) = text.find('[') {
            if let Some(close) = text.rfind(']') {
                if close == text.len() - 1 && close > open {
                    return PathSegment {
                        name: text[..open].to_string(),
                        index: Some(text[open + 1..close].to_string()),
                    };
                }
            }
        }
        PathSegment {
            name: text.to_string(),
            index: None,
        }
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A fully parsed argument path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPath {
    pub segments: Vec<PathSegment>,
}

impl ArgPath {
    pub fn parse(key: &str) -> ArgPath {
        ArgPath {
            segments: key.split(':').map(PathSegment::parse).collect(),
        }
    }

    /// True when the path has more than one segment.
    pub fn is_compound(&self) -> bool {
        self.segments.len() > 1
    }
}

impl std::fmt::Display for ArgPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, ":")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

/// Split a key into its head segment and the remainder after the first colon.
///
/// Returns `None` for keys without a colon; those are plain settings, not
/// paths, and never take part in collection.
pub fn split_head(key: &str) -> Option<(PathSegment, &str)> {
    let (head, rest) = key.split_once(':')?;
    Some((PathSegment::parse(head), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_segment() {
        let seg = PathSegment::parse("view_type");
        assert_eq!(seg.name, "view_type");
        assert_eq!(seg.index, None);
    }

    #[test]
    fn test_parse_indexed_segment() {
        let seg = PathSegment::parse("features[input]");
        assert_eq!(seg.name, "features");
        assert_eq!(seg.index.as_deref(), Some("input"));
    }

    #[test]
    fn test_malformed_bracket_is_literal() {
        let seg = PathSegment::parse("features[input");
        assert_eq!(seg.name, "features[input");
        assert_eq!(seg.index, None);
    }

    #[test]
    fn test_parse_compound_path() {
        let path = ArgPath::parse("view:features[input]:element:size");
        assert!(path.is_compound());
        assert_eq!(path.segments.len(), 4);
        assert_eq!(path.segments[1].name, "features");
        assert_eq!(path.segments[1].index.as_deref(), Some("input"));
        assert_eq!(path.to_string(), "view:features[input]:element:size");
    }

    #[test]
    fn test_split_head() {
        let (head, rest) = split_head("features[input]:element:size").unwrap();
        assert_eq!(head.name, "features");
        assert_eq!(head.index.as_deref(), Some("input"));
        assert_eq!(rest, "element:size");

        assert!(split_head("label").is_none());
    }
}
