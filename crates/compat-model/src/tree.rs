//! Compatibility tree
//!
//! A nested JSON object in which any node may carry `__compat.support`.
//! The tree is held as a raw [`Value`] so keys the model does not know about
//! survive untouched and in order; support data is decoded on demand.

use crate::error::ModelError;
use crate::path::FeaturePath;
use crate::statement::{decode_support, SupportMap, SupportValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the compat metadata object in a node
pub const COMPAT_KEY: &str = "__compat";

/// Key of the support map inside `__compat`
pub const SUPPORT_KEY: &str = "support";

/// Hierarchical compatibility database
///
/// # Contract
/// Single writer: the tree is borrowed mutably for the duration of one update
/// and there is no interior mutability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatTree {
    root: Value,
}

impl CompatTree {
    /// Create from a JSON value
    #[inline]
    #[must_use]
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error on invalid JSON.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Serialize as two-space indented JSON with a trailing newline
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        text.push('\n');
        Ok(text)
    }

    /// Raw root value
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Node at `path`
    #[must_use]
    pub fn node(&self, path: &FeaturePath) -> Option<&Map<String, Value>> {
        let mut current = self.root.as_object()?;
        for segment in path.iter() {
            current = current.get(segment)?.as_object()?;
        }
        Some(current)
    }

    fn node_mut(&mut self, path: &FeaturePath) -> Option<&mut Map<String, Value>> {
        let mut current = self.root.as_object_mut()?;
        for segment in path.iter() {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        Some(current)
    }

    /// Check if `path` names a node carrying compat metadata
    #[must_use]
    pub fn has_compat(&self, path: &FeaturePath) -> bool {
        self.node(path)
            .and_then(|node| node.get(COMPAT_KEY))
            .is_some_and(Value::is_object)
    }

    /// Decoded support map at `path`
    ///
    /// `Ok(None)` when the node or its `__compat` is missing; an absent
    /// `support` object decodes as empty.
    ///
    /// # Errors
    /// Returns error if the support data does not match the statement schema.
    pub fn support(&self, path: &FeaturePath) -> Result<Option<SupportMap>, ModelError> {
        let Some(compat) = self
            .node(path)
            .and_then(|node| node.get(COMPAT_KEY))
            .and_then(Value::as_object)
        else {
            return Ok(None);
        };

        match compat.get(SUPPORT_KEY) {
            None => Ok(Some(SupportMap::new())),
            Some(Value::Object(support)) => decode_support(path, support).map(Some),
            Some(other) => Err(ModelError::invalid_support(
                path,
                format!("expected object, got {other}"),
            )),
        }
    }

    /// Replace one browser's support value at `path`
    ///
    /// Existing browsers keep their position; new browsers are appended.
    ///
    /// # Errors
    /// Returns error if the node has no `__compat` object.
    pub fn set_support(
        &mut self,
        path: &FeaturePath,
        browser: &str,
        value: &SupportValue,
    ) -> Result<(), ModelError> {
        let encoded = serde_json::to_value(value)?;
        let compat = self
            .node_mut(path)
            .and_then(|node| node.get_mut(COMPAT_KEY))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ModelError::invalid_support(path, "missing __compat"))?;

        let support = compat
            .entry(SUPPORT_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        let support = support
            .as_object_mut()
            .ok_or_else(|| ModelError::invalid_support(path, "support is not an object"))?;

        support.insert(browser.to_string(), encoded);
        Ok(())
    }
}

impl From<Value> for CompatTree {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Statement;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(s: &str) -> FeaturePath {
        s.parse().unwrap()
    }

    fn sample() -> CompatTree {
        CompatTree::new(json!({
            "__meta": {"version": "5.0.0"},
            "api": {
                "AbortController": {
                    "__compat": {
                        "mdn_url": "https://developer.mozilla.org/docs/Web/API/AbortController",
                        "support": {
                            "chrome": {"version_added": "66"},
                            "chrome_android": "mirror",
                            "safari": [
                                {"version_added": "12.1"},
                                {"version_added": "11.1", "prefix": "webkit"}
                            ]
                        },
                        "status": {"experimental": false}
                    },
                    "abort": {
                        "__compat": {"support": {}}
                    }
                }
            }
        }))
    }

    #[test]
    fn tree_node_lookup() {
        let tree = sample();
        assert!(tree.node(&path("api.AbortController")).is_some());
        assert!(tree.node(&path("api.Missing")).is_none());
        assert!(tree.has_compat(&path("api.AbortController.abort")));
        assert!(!tree.has_compat(&path("api")));
    }

    #[test]
    fn tree_support_decodes() {
        let support = sample().support(&path("api.AbortController")).unwrap().unwrap();
        assert_eq!(support.len(), 3);
        assert!(support["chrome_android"].is_mirror());
        assert!(matches!(support["safari"], SupportValue::List(ref l) if l.len() == 2));
    }

    #[test]
    fn tree_support_missing_compat() {
        assert!(sample().support(&path("api")).unwrap().is_none());
        assert!(sample().support(&path("css")).unwrap().is_none());
    }

    #[test]
    fn tree_set_support_preserves_order() {
        let mut tree = sample();
        let p = path("api.AbortController");
        tree.set_support(&p, "chrome_android", &SupportValue::Single(Statement::new(false)))
            .unwrap();

        let compat = &tree.node(&p).unwrap()[COMPAT_KEY];
        let keys: Vec<_> = compat.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["mdn_url", "support", "status"]);

        let browsers: Vec<_> = compat["support"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(browsers, vec!["chrome", "chrome_android", "safari"]);
        assert_eq!(compat["support"]["chrome_android"], json!({"version_added": false}));
    }

    #[test]
    fn tree_set_support_appends_new_browser() {
        let mut tree = sample();
        let p = path("api.AbortController.abort");
        tree.set_support(&p, "firefox", &SupportValue::Single(Statement::new(false)))
            .unwrap();
        let support = tree.support(&p).unwrap().unwrap();
        assert!(support.contains_key("firefox"));
    }

    #[test]
    fn tree_set_support_requires_compat() {
        let mut tree = sample();
        let result = tree.set_support(&path("api"), "chrome", &SupportValue::Mirror);
        assert!(matches!(result, Err(ModelError::InvalidSupport { .. })));
    }

    #[test]
    fn tree_json_round_trip_is_exact() {
        let text = sample().to_json_pretty().unwrap();
        let reparsed = CompatTree::from_json(&text).unwrap();
        assert_eq!(reparsed.to_json_pretty().unwrap(), text);
        assert!(text.ends_with("}\n"));
    }
}
