//! Feature paths
//!
//! Provides [`FeaturePath`] for dotted addressing of features in the
//! compatibility tree (`api.AbortController.abort`).

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of a feature within the compatibility tree
///
/// Ordering is segment-wise, so every path sorts before its descendants and
/// an ordered map visits parents before children.
///
/// # Examples
/// - `["api", "AbortController"]` → `api.AbortController`
/// - `["css", "properties", "align-content"]` → `css.properties.align-content`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeaturePath(Vec<String>);

impl FeaturePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `api.Foo` is prefix of `api.Foo.bar`
    /// - `api.Foo` is NOT prefix of `api.FooBar`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for FeaturePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FeaturePath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(ModelError::EmptySegment)
                } else if seg.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    Err(ModelError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for FeaturePath {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeaturePath> for String {
    fn from(path: FeaturePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn path_from_str_valid() {
        let path: FeaturePath = "api.AbortController.abort".parse().unwrap();
        assert_eq!(path.segments(), &["api", "AbortController", "abort"]);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn path_allows_bcd_punctuation() {
        let path: FeaturePath = "javascript.builtins.Array.@@iterator".parse().unwrap();
        assert_eq!(path.last(), Some("@@iterator"));
        let css: FeaturePath = "css.properties.align-content".parse().unwrap();
        assert_eq!(css.last(), Some("align-content"));
    }

    #[test]
    fn path_from_str_empty() {
        let path: FeaturePath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<FeaturePath, _> = "api..Foo".parse();
        assert!(matches!(result, Err(ModelError::EmptySegment)));
    }

    #[test]
    fn path_from_str_whitespace() {
        let result: Result<FeaturePath, _> = "api.Foo bar".parse();
        assert!(matches!(result, Err(ModelError::InvalidSegment(_))));
    }

    #[test]
    fn path_parent() {
        let path: FeaturePath = "a.b.c".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "a.b");
        assert!(FeaturePath::root().parent().is_none());
    }

    #[test]
    fn path_child() {
        let parent: FeaturePath = "api".parse().unwrap();
        assert_eq!(parent.child("Foo").to_string(), "api.Foo");
    }

    #[test]
    fn path_prefix_and_ancestor() {
        let a: FeaturePath = "api.Foo".parse().unwrap();
        let b: FeaturePath = "api.Foo.bar".parse().unwrap();
        let c: FeaturePath = "api.FooBar".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(a.is_ancestor_of(&b));
        assert!(!a.is_prefix_of(&c));
        assert!(a.is_prefix_of(&a));
        assert!(!a.is_ancestor_of(&a));
    }

    #[test]
    fn path_order_visits_parents_first() {
        let paths: BTreeSet<FeaturePath> = ["api.Foo.bar", "api.Foo-x", "api.Foo", "api"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let ordered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        let foo = ordered.iter().position(|p| p == "api.Foo").unwrap();
        let bar = ordered.iter().position(|p| p == "api.Foo.bar").unwrap();
        assert_eq!(ordered[0], "api");
        assert!(foo < bar);
    }

    #[test]
    fn path_serde_as_dotted_string() {
        let path: FeaturePath = serde_json::from_str("\"api.Foo\"").unwrap();
        assert_eq!(path.iter().collect::<Vec<_>>(), vec!["api", "Foo"]);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"api.Foo\"");
    }
}
