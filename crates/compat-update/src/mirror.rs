//! Mirror resolution
//!
//! A browser whose support is the `"mirror"` marker derives its statements
//! from an upstream browser. Resolution is pluggable via [`MirrorResolver`].

use compat_model::{Statement, SupportMap, SupportValue};
use indexmap::IndexMap;

/// Resolves the mirror marker of one browser into concrete statements
pub trait MirrorResolver: Send + Sync {
    /// Statements `browser` would have given the other browsers in `support`
    ///
    /// Returns `None` when the marker cannot be resolved.
    fn resolve(&self, browser: &str, support: &SupportMap) -> Option<Vec<Statement>>;
}

/// Copies statements verbatim from a fixed upstream browser
///
/// Only sound for browser pairs that share release numbering.
#[derive(Debug, Clone, Default)]
pub struct UpstreamMirror {
    upstream: IndexMap<String, String>,
}

impl UpstreamMirror {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs that share version numbers with their upstream
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with("chrome_android", "chrome")
            .with("firefox_android", "firefox")
            .with("webview_android", "chrome_android")
    }

    /// Add one `browser → upstream` edge
    #[must_use]
    pub fn with(mut self, browser: impl Into<String>, upstream: impl Into<String>) -> Self {
        self.upstream.insert(browser.into(), upstream.into());
        self
    }

    /// Upstream of `browser`
    #[must_use]
    pub fn upstream_of(&self, browser: &str) -> Option<&str> {
        self.upstream.get(browser).map(String::as_str)
    }
}

impl MirrorResolver for UpstreamMirror {
    fn resolve(&self, browser: &str, support: &SupportMap) -> Option<Vec<Statement>> {
        let mut current = browser;
        // A chain longer than the table has a cycle.
        for _ in 0..=self.upstream.len() {
            let upstream = self.upstream_of(current)?;
            match support.get(upstream) {
                Some(SupportValue::Mirror) => current = upstream,
                Some(value) => return value.to_statements(),
                None => {
                    tracing::debug!("Mirror upstream {} of {} has no data", upstream, browser);
                    return None;
                }
            }
        }
        tracing::warn!("Mirror chain of {} does not terminate", browser);
        None
    }
}
