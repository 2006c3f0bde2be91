//! Browser release catalog
//!
//! Supplied from outside; the core only reads the set of known browsers and
//! their releases. Release metadata is kept opaque.

use crate::version::Version;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One browser and its releases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserInfo {
    /// Display name
    pub name: String,

    /// Release metadata keyed by release identifier
    #[serde(default)]
    pub releases: IndexMap<String, Value>,

    /// Unmodelled fields
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl BrowserInfo {
    /// Create browser with the given releases and empty metadata
    #[must_use]
    pub fn new(name: impl Into<String>, releases: &[&str]) -> Self {
        Self {
            name: name.into(),
            releases: releases
                .iter()
                .map(|r| ((*r).to_string(), Value::Object(serde_json::Map::new())))
                .collect(),
            extra: IndexMap::new(),
        }
    }

    /// Parsed releases in ascending order
    ///
    /// Keys that are not valid releases are dropped.
    #[must_use]
    pub fn versions(&self) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .releases
            .keys()
            .filter_map(|key| match key.parse() {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::debug!("Dropping release '{}' of {}: {}", key, self.name, e);
                    None
                }
            })
            .collect();
        versions.sort();
        versions
    }

    /// Check if a release is listed
    #[inline]
    #[must_use]
    pub fn has_release(&self, version: &str) -> bool {
        self.releases.contains_key(version)
    }
}

/// Known browsers keyed by browser id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrowserCatalog {
    browsers: IndexMap<String, BrowserInfo>,
}

impl BrowserCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a browser
    #[must_use]
    pub fn with_browser(mut self, id: impl Into<String>, info: BrowserInfo) -> Self {
        self.browsers.insert(id.into(), info);
        self
    }

    /// Look up a browser
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BrowserInfo> {
        self.browsers.get(id)
    }

    /// Check if a browser is tracked
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.browsers.contains_key(id)
    }

    /// Iterate browser ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.browsers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_from_json() {
        let catalog: BrowserCatalog = serde_json::from_value(json!({
            "chrome": {
                "name": "Chrome",
                "type": "desktop",
                "releases": {"83": {"status": "retired"}, "9": {}, "100": {}}
            }
        }))
        .unwrap();

        assert!(catalog.contains("chrome"));
        assert!(!catalog.contains("firefox"));
        let chrome = catalog.get("chrome").unwrap();
        assert_eq!(chrome.extra["type"], json!("desktop"));
        let versions: Vec<_> = chrome.versions().iter().map(ToString::to_string).collect();
        assert_eq!(versions, vec!["9", "83", "100"]);
    }

    #[test]
    fn catalog_drops_invalid_release_keys() {
        let info = BrowserInfo::new("Odd", &["1", "nightly", "2"]);
        assert_eq!(info.versions().len(), 2);
        assert!(info.has_release("nightly"));
    }

    #[test]
    fn catalog_builder() {
        let catalog = BrowserCatalog::new()
            .with_browser("firefox", BrowserInfo::new("Firefox", &["91", "92"]));
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["firefox"]);
    }
}
