//! Update options and compiled filters

use crate::error::UpdateError;
use compat_model::{FeaturePath, Version};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Options controlling which pairs an update may touch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct UpdateOptions {
    /// Feature path prefix or glob (`api.Foo`, `api.*.bar`, `css.**`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Browser allow-list; empty allows all
    pub browsers: Vec<String>,

    /// Release filter, `X` or `X-Y`; `false` disables
    #[serde(deserialize_with = "deserialize_release", skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Refuse to write range-encoded versions into the default statement
    pub exact_only: bool,

    /// Fail when an override has no matching evidence; read by the matrix builder
    pub strict_overrides: bool,
}

impl UpdateOptions {
    /// Compile into filters
    ///
    /// # Errors
    /// Returns error if the path glob or release filter is malformed.
    pub fn compile(&self) -> Result<UpdateFilters, UpdateError> {
        Ok(UpdateFilters {
            path: self.path.as_deref().map(PathFilter::parse).transpose()?,
            browsers: self.browsers.clone(),
            release: self.release.as_deref().map(ReleaseFilter::parse).transpose()?,
            exact_only: self.exact_only,
        })
    }
}

fn deserialize_release<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected release string or false, got {other}"
        ))),
    }
}

/// Feature path filter
#[derive(Debug, Clone)]
pub enum PathFilter {
    /// Path and all its descendants
    Prefix(FeaturePath),

    /// Glob over the dotted path; `*` stays within a segment, `**` crosses segments
    Glob(Regex),
}

impl PathFilter {
    /// Parse a prefix or glob
    ///
    /// # Errors
    /// Returns error if the filter is neither a valid path nor a valid glob.
    pub fn parse(filter: &str) -> Result<Self, UpdateError> {
        if !filter.contains(['*', '?']) {
            if let Ok(path) = filter.parse::<FeaturePath>() {
                return Ok(Self::Prefix(path));
            }
        }

        let mut pattern = String::from("^");
        let mut chars = filter.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    pattern.push_str(".*");
                }
                '*' => pattern.push_str("[^.]*"),
                '?' => pattern.push_str("[^.]"),
                other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        pattern.push('$');

        Regex::new(&pattern)
            .map(Self::Glob)
            .map_err(|source| UpdateError::InvalidPathFilter {
                filter: filter.to_string(),
                source,
            })
    }

    /// Check if `path` passes
    #[must_use]
    pub fn matches(&self, path: &FeaturePath) -> bool {
        match self {
            Self::Prefix(prefix) => prefix.is_prefix_of(path),
            Self::Glob(regex) => regex.is_match(&path.to_string()),
        }
    }
}

/// Release window applied to the upper bound of inferred versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseFilter {
    /// Only this release
    Exact(Version),

    /// Inclusive window
    Window(Version, Version),
}

impl ReleaseFilter {
    /// Parse `X` or `X-Y`
    ///
    /// # Errors
    /// Returns [`UpdateError::InvalidReleaseFilter`] on other forms.
    pub fn parse(filter: &str) -> Result<Self, UpdateError> {
        let invalid = || UpdateError::InvalidReleaseFilter(filter.to_string());
        match filter.split_once('-') {
            Some((start, end)) => {
                let start: Version = start.trim().parse().map_err(|_| invalid())?;
                let end: Version = end.trim().parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                Ok(Self::Window(start, end))
            }
            None => filter.trim().parse().map(Self::Exact).map_err(|_| invalid()),
        }
    }

    /// Check if a release passes
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(v) => v == version,
            Self::Window(start, end) => version >= start && version <= end,
        }
    }
}

/// Compiled [`UpdateOptions`]
#[derive(Debug, Clone, Default)]
pub struct UpdateFilters {
    /// Feature path filter
    pub path: Option<PathFilter>,

    /// Browser allow-list; empty allows all
    pub browsers: Vec<String>,

    /// Release filter
    pub release: Option<ReleaseFilter>,

    /// Refuse ranges in the written default statement
    pub exact_only: bool,
}

impl UpdateFilters {
    /// Check the path filter
    #[must_use]
    pub fn allows_path(&self, path: &FeaturePath) -> bool {
        self.path.as_ref().map_or(true, |filter| filter.matches(path))
    }

    /// Check the browser allow-list
    #[must_use]
    pub fn allows_browser(&self, browser: &str) -> bool {
        self.browsers.is_empty() || self.browsers.iter().any(|b| b == browser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(s: &str) -> FeaturePath {
        s.parse().unwrap()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn path_prefix_matches_descendants() {
        let filter = PathFilter::parse("api.Foo").unwrap();
        assert!(filter.matches(&path("api.Foo")));
        assert!(filter.matches(&path("api.Foo.bar")));
        assert!(!filter.matches(&path("api.FooBar")));
        assert!(!filter.matches(&path("api")));
    }

    #[test]
    fn path_glob_segments() {
        let one = PathFilter::parse("api.*.bar").unwrap();
        assert!(one.matches(&path("api.Foo.bar")));
        assert!(!one.matches(&path("api.Foo.baz.bar")));

        let deep = PathFilter::parse("css.**").unwrap();
        assert!(deep.matches(&path("css.properties.align-content")));
        assert!(!deep.matches(&path("api.Foo")));

        let single = PathFilter::parse("api.Fo?").unwrap();
        assert!(single.matches(&path("api.Foo")));
        assert!(!single.matches(&path("api.Fooo")));
    }

    #[test]
    fn path_glob_escapes_metacharacters() {
        let filter = PathFilter::parse("javascript.builtins.Symbol.@@iter*").unwrap();
        assert!(filter.matches(&path("javascript.builtins.Symbol.@@iterator")));
    }

    #[test]
    fn release_forms() {
        assert_eq!(ReleaseFilter::parse("83").unwrap(), ReleaseFilter::Exact(v("83")));
        assert_eq!(
            ReleaseFilter::parse("80-83").unwrap(),
            ReleaseFilter::Window(v("80"), v("83"))
        );
        assert!(ReleaseFilter::parse("83-80").is_err());
        assert!(ReleaseFilter::parse("latest").is_err());
    }

    #[test]
    fn release_window_matches() {
        let window = ReleaseFilter::parse("14-15.1").unwrap();
        assert!(window.matches(&v("14")));
        assert!(window.matches(&v("14.1")));
        assert!(window.matches(&v("15.1")));
        assert!(!window.matches(&v("15.2")));
    }

    #[test]
    fn options_deserialize() {
        let options: UpdateOptions = serde_json::from_value(json!({
            "path": "api.*",
            "browsers": ["chrome"],
            "release": false,
            "exact_only": true
        }))
        .unwrap();
        assert_eq!(options.release, None);
        assert!(options.exact_only);

        let filters = options.compile().unwrap();
        assert!(filters.allows_browser("chrome"));
        assert!(!filters.allows_browser("safari"));
        assert!(filters.allows_path(&path("api.Foo")));
    }

    #[test]
    fn options_default_allows_everything() {
        let filters = UpdateOptions::default().compile().unwrap();
        assert!(filters.allows_path(&path("anything.at.all")));
        assert!(filters.allows_browser("ie"));
        assert!(filters.release.is_none());
    }
}
