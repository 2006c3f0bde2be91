//! Feature-detection reports
//!
//! Provides the [`Report`] wire format and [`normalize`], which folds every
//! per-exposure result into one [`Verdict`] per feature path.

use crate::error::EvidenceError;
use compat_model::{combine, FeaturePath, Verdict};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One browser run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Collector version that produced the report
    #[serde(rename = "__version")]
    pub version: String,

    /// Results keyed by test page URL
    pub results: IndexMap<String, Vec<TestResult>>,

    /// Raw user agent of the browser
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

/// Result of one test in one exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Feature path under test
    pub name: String,

    /// Global scope the test ran in (`Window`, `Worker`, ...)
    #[serde(default)]
    pub exposure: String,

    /// `true`, `false` or `null`; validated during normalization
    pub result: Value,

    /// Diagnostic message from the harness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Report {
    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error on invalid JSON or a document not shaped like a report.
    pub fn from_json(text: &str) -> Result<Self, EvidenceError> {
        serde_json::from_str(text).map_err(|e| EvidenceError::Model(e.into()))
    }

    /// Total number of results across all URLs
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

/// Per-feature verdicts of one report, parents ordered before children
pub type FeatureVerdicts = BTreeMap<FeaturePath, Verdict>;

/// Fold a report into one verdict per feature path
///
/// Results of the same feature across URLs and exposures are combined. A
/// feature whose verdict stays Unknown inherits Unsupported from its direct
/// parent; parents are visited first, so the rule applies transitively.
///
/// # Errors
/// - [`EvidenceError::InvalidVerdict`] if a result is not `true | false | null`
/// - [`EvidenceError::EmptyReport`] if no result has a usable feature name
pub fn normalize(report: &Report) -> Result<FeatureVerdicts, EvidenceError> {
    let mut grouped: BTreeMap<FeaturePath, Vec<Verdict>> = BTreeMap::new();

    for (url, results) in &report.results {
        for test in results {
            let verdict =
                Verdict::try_from(&test.result).map_err(|_| EvidenceError::InvalidVerdict {
                    name: test.name.clone(),
                    value: test.result.to_string(),
                })?;

            match test.name.parse::<FeaturePath>() {
                Ok(path) if !path.is_empty() => grouped.entry(path).or_default().push(verdict),
                _ => tracing::debug!("Discarding result '{}' from {}", test.name, url),
            }
        }
    }

    if grouped.is_empty() {
        return Err(EvidenceError::EmptyReport {
            user_agent: report.user_agent.clone(),
        });
    }

    let mut support = FeatureVerdicts::new();
    for (path, verdicts) in grouped {
        let mut verdict = combine(verdicts);
        if verdict == Verdict::Unknown {
            let parent_unsupported = path
                .parent()
                .and_then(|parent| support.get(&parent).copied())
                == Some(Verdict::Unsupported);
            if parent_unsupported {
                verdict = Verdict::Unsupported;
            }
        }
        support.insert(path, verdict);
    }

    Ok(support)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn report(results: Value) -> Report {
        serde_json::from_value(json!({
            "__version": "10.2.0",
            "results": results,
            "userAgent": "Mozilla/5.0 Test"
        }))
        .unwrap()
    }

    fn verdict(map: &FeatureVerdicts, path: &str) -> Verdict {
        map[&path.parse::<FeaturePath>().unwrap()]
    }

    #[test]
    fn normalize_combines_exposures() {
        let r = report(json!({
            "https://host/tests/api/Foo": [
                {"name": "api.Foo", "exposure": "Window", "result": false},
                {"name": "api.Foo", "exposure": "Worker", "result": true},
                {"name": "api.Bar", "exposure": "Window", "result": null},
                {"name": "api.Bar", "exposure": "Worker", "result": false}
            ]
        }));
        let map = normalize(&r).unwrap();
        assert_eq!(verdict(&map, "api.Foo"), Verdict::Supported);
        assert_eq!(verdict(&map, "api.Bar"), Verdict::Unsupported);
    }

    #[test]
    fn normalize_combines_across_urls() {
        let r = report(json!({
            "https://host/a": [{"name": "api.Foo", "exposure": "Window", "result": null}],
            "https://host/b": [{"name": "api.Foo", "exposure": "Worker", "result": true}]
        }));
        assert_eq!(verdict(&normalize(&r).unwrap(), "api.Foo"), Verdict::Supported);
    }

    #[test]
    fn normalize_unknown_child_of_unsupported_parent() {
        // Child listed before parent: ordering comes from the path, not the report.
        let r = report(json!({
            "https://host/a": [
                {"name": "api.Foo.bar.baz", "exposure": "Window", "result": null},
                {"name": "api.Foo.bar", "exposure": "Window", "result": null},
                {"name": "api.Foo", "exposure": "Window", "result": false},
                {"name": "api.Qux.quux", "exposure": "Window", "result": null}
            ]
        }));
        let map = normalize(&r).unwrap();
        assert_eq!(verdict(&map, "api.Foo.bar"), Verdict::Unsupported);
        assert_eq!(verdict(&map, "api.Foo.bar.baz"), Verdict::Unsupported);
        assert_eq!(verdict(&map, "api.Qux.quux"), Verdict::Unknown);
    }

    #[test]
    fn normalize_supported_child_keeps_verdict() {
        let r = report(json!({
            "https://host/a": [
                {"name": "api.Foo", "exposure": "Window", "result": false},
                {"name": "api.Foo.bar", "exposure": "Window", "result": true}
            ]
        }));
        assert_eq!(verdict(&normalize(&r).unwrap(), "api.Foo.bar"), Verdict::Supported);
    }

    #[test]
    fn normalize_empty_report() {
        let r = report(json!({}));
        assert!(matches!(normalize(&r), Err(EvidenceError::EmptyReport { .. })));

        let only_unusable = report(json!({
            "https://host/a": [{"name": "", "exposure": "Window", "result": true}]
        }));
        assert!(matches!(
            normalize(&only_unusable),
            Err(EvidenceError::EmptyReport { .. })
        ));
    }

    #[test]
    fn normalize_invalid_verdict() {
        let r = report(json!({
            "https://host/a": [{"name": "api.Foo", "exposure": "Window", "result": "maybe"}]
        }));
        assert!(matches!(
            normalize(&r),
            Err(EvidenceError::InvalidVerdict { ref name, .. }) if name == "api.Foo"
        ));
    }

    #[test]
    fn report_wire_format() {
        let text = r#"{"__version":"10.2.0","results":{"u":[{"name":"api.Foo","exposure":"Window","result":true,"message":"ok"}]},"userAgent":"UA"}"#;
        let r = Report::from_json(text).unwrap();
        assert_eq!(r.user_agent, "UA");
        assert_eq!(r.result_count(), 1);
        assert_eq!(serde_json::to_string(&r).unwrap(), text);
    }
}
