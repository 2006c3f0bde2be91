//! Collector configuration file
//!
//! ```toml
//! tree = "data/compat.json"
//! catalog = "data/browsers.json"
//! overrides = "overrides.json"
//! ua_map = "user-agents.json"
//! reports = ["reports/"]
//!
//! [update]
//! path = "api.*"
//! browsers = ["chrome", "firefox"]
//! release = "83-85"
//! exact_only = false
//! strict_overrides = false
//! ```
//!
//! Relative paths resolve against the directory of the config file.

use anyhow::{Context, Result};
use compat_update::UpdateOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for one collector run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    /// Compatibility tree to update
    pub tree: Option<PathBuf>,
    /// Release catalog
    pub catalog: Option<PathBuf>,
    /// Manual overrides
    pub overrides: Option<PathBuf>,
    /// User-agent table
    pub ua_map: Option<PathBuf>,
    /// Report files or directories
    pub reports: Vec<PathBuf>,
    /// Update options
    pub update: UpdateOptions,
}

impl CollectorConfig {
    /// Load a TOML config file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.relative_to(base))
    }

    /// Resolve relative paths against `base`
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for path in [&mut self.tree, &mut self.catalog, &mut self.overrides, &mut self.ua_map]
            .into_iter()
            .flatten()
        {
            resolve(path);
        }
        self.reports.iter_mut().for_each(resolve);
        self
    }

    /// Tree path, or an error naming the missing setting
    ///
    /// # Errors
    /// Returns error when neither flag nor config set it.
    pub fn require_tree(&self) -> Result<&Path> {
        self.tree.as_deref().context("no compatibility tree given (--tree)")
    }

    /// Catalog path, or an error naming the missing setting
    ///
    /// # Errors
    /// Returns error when neither flag nor config set it.
    pub fn require_catalog(&self) -> Result<&Path> {
        self.catalog.as_deref().context("no release catalog given (--catalog)")
    }

    /// User-agent table path, or an error naming the missing setting
    ///
    /// # Errors
    /// Returns error when neither flag nor config set it.
    pub fn require_ua_map(&self) -> Result<&Path> {
        self.ua_map.as_deref().context("no user-agent table given (--ua-map)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full_config() {
        let config: CollectorConfig = toml::from_str(
            r#"
            tree = "compat.json"
            catalog = "/abs/browsers.json"
            reports = ["reports/", "extra.json"]

            [update]
            path = "api.*"
            browsers = ["chrome"]
            release = "83-85"
            exact_only = true
            "#,
        )
        .unwrap();

        let config = config.relative_to(Path::new("/work"));
        assert_eq!(config.tree, Some(PathBuf::from("/work/compat.json")));
        assert_eq!(config.catalog, Some(PathBuf::from("/abs/browsers.json")));
        assert_eq!(
            config.reports,
            vec![PathBuf::from("/work/reports/"), PathBuf::from("/work/extra.json")]
        );
        assert_eq!(config.update.browsers, vec!["chrome".to_string()]);
        assert_eq!(config.update.release.as_deref(), Some("83-85"));
        assert!(config.update.exact_only);
    }

    #[test]
    fn release_false_disables_filter() {
        let config: CollectorConfig = toml::from_str("[update]\nrelease = false\n").unwrap();
        assert_eq!(config.update.release, None);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<CollectorConfig>("trees = \"x\"").is_err());
    }

    #[test]
    fn missing_settings_are_named() {
        let config = CollectorConfig::default();
        let err = config.require_tree().unwrap_err();
        assert!(err.to_string().contains("--tree"));
    }
}
