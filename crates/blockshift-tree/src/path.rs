//! Block paths for addressing positions within a block tree
//!
//! Provides [`BlockPath`], the dotted sequence of block names an operation
//! targets.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Position within a block tree, addressed by block names
///
/// An empty path is the root container. Each segment names a child block at
/// the previous position; a stream may hold several children with the same
/// name, so one path can match many nodes.
///
/// # Examples
/// - `[]` → `` (the root stream)
/// - `["nestedstruct", "stream1"]` → `nestedstruct.stream1`
/// - `["simplelist", "item"]` → `simplelist.item`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockPath(Vec<String>);

impl BlockPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path with a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// The root container
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.split_last().map(|(_, rest)| Self(rest.to_vec()))
    }

    /// Last segment, i.e. the name of the targeted block
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Iterator over segments from root to target
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for BlockPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for BlockPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if seg.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for BlockPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockPath> for String {
    fn from(path: BlockPath) -> Self {
        path.to_string()
    }
}

impl From<Vec<String>> for BlockPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl Default for BlockPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to block paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("block path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Invalid segment characters
    #[error("invalid block name in path: {0} (must be alphanumeric, '_' or '-')")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn path_root() {
        let path = BlockPath::root();
        assert!(path.is_empty());
        assert_eq!(path.len(), 0);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn path_parent() {
        let path: BlockPath = "nestedstream.stream1.char1".parse().unwrap();
        assert_eq!(path.parent().unwrap().segments(), &["nestedstream", "stream1"]);
        assert!(BlockPath::root().parent().is_none());
    }

    #[test]
    fn path_last_and_first() {
        let path: BlockPath = "nestedstruct.list1.item".parse().unwrap();
        assert_eq!(path.first(), Some("nestedstruct"));
        assert_eq!(path.last(), Some("item"));
    }

    #[test]
    fn path_child() {
        let child = BlockPath::single("simplestruct").child("char1");
        assert_eq!(child.to_string(), "simplestruct.char1");
    }

    #[test]
    fn path_from_str_empty_is_root() {
        let path: BlockPath = "".parse().unwrap();
        assert_eq!(path, BlockPath::root());
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<BlockPath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn path_from_str_invalid_chars() {
        let result: Result<BlockPath, _> = "a.b c".parse();
        assert_eq!(result, Err(PathError::InvalidSegment("b c".to_string())));
    }

    #[test]
    fn path_allows_dashes_and_underscores() {
        let path: BlockPath = "rich-text.invalid_name2".parse().unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn path_serde_as_dotted_string() {
        let path: BlockPath = "nestedstruct.char1".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"nestedstruct.char1\"");

        let back: BlockPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);

        let bad: Result<BlockPath, _> = serde_json::from_str("\"a..b\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(
            segments in proptest::collection::vec("[a-z_][a-z0-9_]{0,8}", 0..6)
        ) {
            let path = BlockPath::new(segments.clone());
            let parsed: BlockPath = path.to_string().parse().unwrap();
            prop_assert_eq!(parsed.segments(), segments.as_slice());
        }
    }
}
