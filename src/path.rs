//! Field paths and their dotted/bracketed text form
//!
//! `people[0].address.city` <-> `["people", 0, "address", "city"]`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{FormError, Result};

/// Segment of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object field access: `.name`
    Key(String),
    /// Array index access: `[0]`
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of one node in a value tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The empty path, addressing the whole tree
    pub fn root() -> Self {
        Self { segments: vec![] }
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// New path with a field segment appended
    pub fn push_key(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Key(name.to_string()));
        new
    }

    /// New path with an index segment appended
    pub fn push_index(&self, idx: usize) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Index(idx));
        new
    }

    /// Concatenate a relative path onto this one
    pub fn join(&self, other: &Path) -> Self {
        let mut new = self.clone();
        new.segments.extend(other.segments.iter().cloned());
        new
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path without its last segment (root stays root)
    pub fn parent(&self) -> Self {
        let mut new = self.clone();
        new.segments.pop();
        new
    }

    /// Name of the closest field segment, if any
    pub fn field_name(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(PathSegment::as_key)
    }

    /// True when `prefix` addresses this node or one of its ancestors
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Index segment directly following the last `alias` field segment
    ///
    /// `people[3].name` with alias `people` yields `3`.
    pub fn index_after(&self, alias: &str) -> Result<usize> {
        let position = self
            .segments
            .iter()
            .rposition(|seg| seg.as_key() == Some(alias));

        position
            .and_then(|pos| self.segments.get(pos + 1))
            .and_then(PathSegment::as_index)
            .ok_or_else(|| FormError::MissingIndex {
                alias: alias.to_string(),
                path: self.to_string(),
            })
    }

    /// Parse the text form of a path
    ///
    /// The empty string is the root path. Field names may not contain `.`, `[` or `]`,
    /// and indices are plain decimal numbers without leading zeros.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| FormError::InvalidPath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_dot = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() {
                        let follows_index = matches!(segments.last(), Some(PathSegment::Index(_)));
                        if after_dot || !follows_index {
                            return Err(invalid("empty field name"));
                        }
                    } else {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                    after_dot = true;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    } else if after_dot {
                        return Err(invalid("empty field name"));
                    }

                    let mut digits = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(c);
                    }
                    if !closed {
                        return Err(invalid("unclosed '['"));
                    }
                    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                        return Err(invalid("index must be a non-negative integer"));
                    }
                    if digits.len() > 1 && digits.starts_with('0') {
                        return Err(invalid("index has leading zeros"));
                    }
                    let idx = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index out of range"))?;
                    segments.push(PathSegment::Index(idx));
                    after_dot = false;
                }
                ']' => return Err(invalid("unexpected ']'")),
                _ => {
                    if current.is_empty()
                        && !after_dot
                        && matches!(segments.last(), Some(PathSegment::Index(_)))
                    {
                        return Err(invalid("expected '.' or '[' after index"));
                    }
                    current.push(ch);
                    after_dot = false;
                }
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        } else if after_dot {
            return Err(invalid("trailing '.'"));
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Key(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Path::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Build a [`Path`] from a list of segments: `path!["people", 0, "name"]`
#[macro_export]
macro_rules! path {
    () => { $crate::path::Path::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::Path::from_segments(vec![$($crate::path::PathSegment::from($seg)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_building() {
        let path = Path::root().push_key("user").push_key("address").push_key("city");

        assert_eq!(path.to_string(), "user.address.city");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_path_with_array() {
        let path = Path::root().push_key("items").push_index(0).push_key("name");
        assert_eq!(path.to_string(), "items[0].name");
    }

    #[test]
    fn test_parse_nested_indices() {
        let path = Path::parse("a[0][1]").unwrap();
        assert_eq!(path, crate::path!["a", 0usize, 1usize]);
    }

    #[test]
    fn test_parse_mixed() {
        let path = Path::parse("a.b[1].c").unwrap();
        assert_eq!(path, crate::path!["a", "b", 1usize, "c"]);
        assert_eq!(path.to_string(), "a.b[1].c");
    }

    #[test]
    fn test_root_index_is_standalone() {
        let path = crate::path![2usize, "name"];
        assert_eq!(path.to_string(), "[2].name");
        assert_eq!(Path::parse("[2].name").unwrap(), path);
    }

    #[test]
    fn test_empty_string_is_root() {
        assert!(Path::parse("").unwrap().is_root());
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["a..b", ".a", "a.", "a[", "a[x]", "a]", "a[0]b", "a[01]", "a.[0]"] {
            assert!(
                matches!(Path::parse(bad), Err(FormError::InvalidPath { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_index_after() {
        let path = Path::parse("people[3].name").unwrap();
        assert_eq!(path.index_after("people").unwrap(), 3);

        let err = path.index_after("name").unwrap_err();
        assert!(matches!(err, FormError::MissingIndex { ref alias, .. } if alias == "name"));
    }

    #[test]
    fn test_starts_with() {
        let path = Path::parse("address.city").unwrap();
        assert!(path.starts_with(&Path::parse("address").unwrap()));
        assert!(path.starts_with(&Path::root()));
        assert!(!Path::parse("addressee").unwrap().starts_with(&Path::parse("address").unwrap()));
    }

    #[test]
    fn test_serde_as_string() {
        let path = Path::parse("a[1].b").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a[1].b\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
