//! User-agent resolution seam
//!
//! Parsing user-agent strings is outside this workspace. The matrix builder
//! consumes a [`UaResolver`]; [`StaticResolver`] answers from a lookup table.

use compat_model::BrowserCatalog;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identity of the browser that produced a report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Browser id, `None` if the user agent could not be parsed
    pub browser: Option<String>,

    /// Release identifier as reported
    pub version: Option<String>,

    /// `Some(true)` tracked release, `Some(false)` untracked release of a
    /// tracked browser, `None` untracked browser
    pub in_bcd: Option<bool>,
}

impl ResolvedIdentity {
    /// Tracked browser and release
    #[must_use]
    pub fn tracked(browser: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            browser: Some(browser.into()),
            version: Some(version.into()),
            in_bcd: Some(true),
        }
    }

    /// User agent could not be parsed
    #[must_use]
    pub fn unparsed() -> Self {
        Self::default()
    }
}

/// Resolves a raw user agent against the release catalog
pub trait UaResolver: Send + Sync {
    /// Resolve one user agent
    fn resolve(&self, user_agent: &str, catalog: &BrowserCatalog) -> ResolvedIdentity;
}

/// Browser and release a user agent maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UaEntry {
    /// Browser id
    pub browser: String,
    /// Release identifier
    pub version: String,
}

/// Table-driven resolver
///
/// Deserializes from `{ "<user agent>": {"browser": "...", "version": "..."} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticResolver {
    entries: IndexMap<String, UaEntry>,
}

impl StaticResolver {
    /// Create empty resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping
    #[must_use]
    pub fn with(
        mut self,
        user_agent: impl Into<String>,
        browser: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            user_agent.into(),
            UaEntry {
                browser: browser.into(),
                version: version.into(),
            },
        );
        self
    }

    /// Number of mappings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UaResolver for StaticResolver {
    fn resolve(&self, user_agent: &str, catalog: &BrowserCatalog) -> ResolvedIdentity {
        let Some(entry) = self.entries.get(user_agent) else {
            return ResolvedIdentity::unparsed();
        };

        let in_bcd = catalog
            .get(&entry.browser)
            .map(|info| info.has_release(&entry.version));

        ResolvedIdentity {
            browser: Some(entry.browser.clone()),
            version: Some(entry.version.clone()),
            in_bcd,
        }
    }
}
