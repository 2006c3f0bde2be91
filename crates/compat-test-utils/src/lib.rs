//! Testing utilities for the compat collector workspace
//!
//! Shared fixtures: a small release catalog, a matching user-agent table,
//! report and tree builders.

#![allow(missing_docs)]

use compat_evidence::{MatrixBuilder, Report, StaticResolver, SupportMatrix, TestResult};
use compat_model::{BrowserCatalog, BrowserInfo, CompatTree};
use indexmap::IndexMap;
use serde_json::{json, Value};

pub const CHROME_RELEASES: &[&str] = &["80", "81", "82", "83", "84", "85"];
pub const FIREFOX_RELEASES: &[&str] = &["90", "91", "92", "93"];
pub const SAFARI_RELEASES: &[&str] = &["14", "14.1", "15", "preview"];

pub fn test_catalog() -> BrowserCatalog {
    BrowserCatalog::new()
        .with_browser("chrome", BrowserInfo::new("Chrome", CHROME_RELEASES))
        .with_browser("chrome_android", BrowserInfo::new("Chrome Android", CHROME_RELEASES))
        .with_browser("webview_android", BrowserInfo::new("WebView Android", CHROME_RELEASES))
        .with_browser("firefox", BrowserInfo::new("Firefox", FIREFOX_RELEASES))
        .with_browser("safari", BrowserInfo::new("Safari", SAFARI_RELEASES))
}

/// User agent `"<browser>/<version>"`
pub fn user_agent(browser: &str, version: &str) -> String {
    format!("{browser}/{version}")
}

/// Resolver for [`user_agent`] strings of every catalog release
pub fn test_resolver() -> StaticResolver {
    let mut resolver = StaticResolver::new();
    for (browser, releases) in [
        ("chrome", CHROME_RELEASES),
        ("chrome_android", CHROME_RELEASES),
        ("webview_android", CHROME_RELEASES),
        ("firefox", FIREFOX_RELEASES),
        ("safari", SAFARI_RELEASES),
    ] {
        for version in releases {
            resolver = resolver.with(user_agent(browser, version), browser, *version);
        }
    }
    resolver
}

/// Builder for one report
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    user_agent: String,
    results: Vec<TestResult>,
}

impl ReportBuilder {
    pub fn new(browser: &str, version: &str) -> Self {
        Self::with_user_agent(user_agent(browser, version))
    }

    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            results: Vec::new(),
        }
    }

    pub fn result(self, name: &str, result: Option<bool>) -> Self {
        self.exposed(name, "Window", result)
    }

    pub fn exposed(mut self, name: &str, exposure: &str, result: Option<bool>) -> Self {
        self.results.push(TestResult {
            name: name.to_string(),
            exposure: exposure.to_string(),
            result: result.map_or(Value::Null, Value::Bool),
            message: None,
        });
        self
    }

    pub fn build(self) -> Report {
        let mut results = IndexMap::new();
        results.insert("https://collector.test/tests".to_string(), self.results);
        Report {
            version: "10.0.0".to_string(),
            results,
            user_agent: self.user_agent,
        }
    }
}

/// Fold reports into a matrix with the test catalog and resolver
pub fn matrix_of(reports: &[Report]) -> SupportMatrix {
    let catalog = test_catalog();
    let resolver = test_resolver();
    MatrixBuilder::new(&catalog, &resolver)
        .build(reports)
        .expect("no overrides in test matrix")
        .matrix
}

/// One report per `(version, verdict)` of a single feature and browser
pub fn series_reports(
    feature: &str,
    browser: &str,
    series: &[(&str, Option<bool>)],
) -> Vec<Report> {
    series
        .iter()
        .map(|(version, verdict)| ReportBuilder::new(browser, version).result(feature, *verdict).build())
        .collect()
}

/// Tree with one `__compat` entry per `(path, support)` pair
pub fn tree_with(entries: &[(&str, Value)]) -> CompatTree {
    let mut root = json!({});
    for (path, support) in entries {
        let mut node = &mut root;
        for segment in path.split('.') {
            node = node
                .as_object_mut()
                .expect("tree nodes are objects")
                .entry(segment)
                .or_insert_with(|| json!({}));
        }
        node["__compat"] = json!({ "support": support.clone() });
    }
    CompatTree::new(root)
}

/// Support value of `browser` at `path`
pub fn support_at<'t>(tree: &'t CompatTree, path: &str, browser: &str) -> &'t Value {
    let mut node = tree.as_value();
    for segment in path.split('.') {
        node = &node[segment];
    }
    &node["__compat"]["support"][browser]
}
