//! Support matrix construction
//!
//! Aggregates normalized reports into `feature → browser → version → verdict`.
//! Every browser's version axis is seeded from the release catalog so that
//! releases without any report still appear, as Unknown.

use crate::error::EvidenceError;
use crate::overrides::{Override, VersionSpec};
use crate::report::{normalize, Report};
use crate::resolver::UaResolver;
use compat_model::{BrowserCatalog, FeaturePath, Verdict, Version};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Verdict per release, ascending
pub type VersionMap = BTreeMap<Version, Verdict>;

/// Version maps per browser id
pub type BrowserMap = BTreeMap<String, VersionMap>;

/// Aggregated evidence of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportMatrix {
    features: BTreeMap<FeaturePath, BrowserMap>,
}

impl SupportMatrix {
    /// Create empty matrix
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation into its cell
    ///
    /// The browser's version map is seeded with Unknown for every catalog
    /// release on first use.
    pub fn record(
        &mut self,
        catalog: &BrowserCatalog,
        path: FeaturePath,
        browser: &str,
        version: Version,
        verdict: Verdict,
    ) {
        let versions = self
            .features
            .entry(path)
            .or_default()
            .entry(browser.to_string())
            .or_insert_with(|| seed(catalog, browser));
        let cell = versions.entry(version).or_default();
        *cell = cell.fold(verdict);
    }

    /// Browsers observed for a feature
    #[inline]
    #[must_use]
    pub fn browsers(&self, path: &FeaturePath) -> Option<&BrowserMap> {
        self.features.get(path)
    }

    /// Version map of one (feature, browser) pair
    #[inline]
    #[must_use]
    pub fn versions(&self, path: &FeaturePath, browser: &str) -> Option<&VersionMap> {
        self.features.get(path)?.get(browser)
    }

    /// Feature paths, parents first
    pub fn paths(&self) -> impl Iterator<Item = &FeaturePath> {
        self.features.keys()
    }

    /// Iterate features with their browser maps
    pub fn iter(&self) -> impl Iterator<Item = (&FeaturePath, &BrowserMap)> {
        self.features.iter()
    }

    /// Number of features
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Apply overrides in order, later ones winning
    ///
    /// Returns the number of cells written.
    ///
    /// # Errors
    /// In strict mode, [`EvidenceError::UnknownOverrideTarget`] for an override
    /// whose feature or browser has no evidence.
    pub fn apply_overrides(
        &mut self,
        overrides: &[Override],
        strict: bool,
    ) -> Result<usize, EvidenceError> {
        let mut written = 0;

        for o in overrides {
            let Some(versions) = self
                .features
                .get_mut(&o.path)
                .and_then(|browsers| browsers.get_mut(&o.browser))
            else {
                if strict {
                    return Err(EvidenceError::UnknownOverrideTarget {
                        path: o.path.to_string(),
                        browser: o.browser.clone(),
                    });
                }
                tracing::debug!("Ignoring override for {} / {}: no evidence", o.path, o.browser);
                continue;
            };

            if let VersionSpec::Exact(version) = &o.versions {
                versions.insert(version.clone(), o.verdict);
                written += 1;
                continue;
            }

            for (version, cell) in versions.iter_mut() {
                if o.versions.matches(version) {
                    *cell = o.verdict;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

fn seed(catalog: &BrowserCatalog, browser: &str) -> VersionMap {
    catalog
        .get(browser)
        .map(|info| {
            info.versions()
                .into_iter()
                .map(|v| (v, Verdict::Unknown))
                .collect()
        })
        .unwrap_or_default()
}

/// Why a report contributed no evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Browser is not in the release catalog
    UnknownBrowser,

    /// Release is not listed for a known browser
    UnknownVersion,

    /// User agent could not be parsed
    UnparseableUserAgent,

    /// Report had no usable results
    EmptyReport,

    /// Report carried a verdict outside `true | false | null`
    InvalidVerdict,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownBrowser => "unknown browser",
            Self::UnknownVersion => "unknown version",
            Self::UnparseableUserAgent => "unparseable user agent",
            Self::EmptyReport => "empty report",
            Self::InvalidVerdict => "invalid verdict",
        };
        f.write_str(text)
    }
}

/// One discarded report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDiagnostic {
    /// Category
    pub kind: DiagnosticKind,
    /// User agent of the report
    pub user_agent: String,
    /// Human-readable message
    pub message: String,
}

impl Display for ReportDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Output of [`MatrixBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct MatrixBuild {
    /// Aggregated evidence
    pub matrix: SupportMatrix,
    /// Reports that contributed
    pub accepted: usize,
    /// Reports that were discarded, with the reason
    pub diagnostics: Vec<ReportDiagnostic>,
    /// Matrix cells written by overrides
    pub overridden: usize,
}

impl MatrixBuild {
    /// Diagnostics of one category
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &ReportDiagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

/// Builds a [`SupportMatrix`] from reports
///
/// # Example
/// ```rust,ignore
/// let build = MatrixBuilder::new(&catalog, &resolver)
///     .with_overrides(overrides.as_slice())
///     .build(&reports)?;
/// ```
pub struct MatrixBuilder<'a> {
    catalog: &'a BrowserCatalog,
    resolver: &'a dyn UaResolver,
    overrides: &'a [Override],
    strict_overrides: bool,
}

impl<'a> MatrixBuilder<'a> {
    /// Create builder over a catalog and resolver
    #[must_use]
    pub fn new(catalog: &'a BrowserCatalog, resolver: &'a dyn UaResolver) -> Self {
        Self {
            catalog,
            resolver,
            overrides: &[],
            strict_overrides: false,
        }
    }

    /// Overrides applied after all reports
    #[must_use]
    pub fn with_overrides(mut self, overrides: &'a [Override]) -> Self {
        self.overrides = overrides;
        self
    }

    /// Fail on overrides without a matching cell
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_overrides = strict;
        self
    }

    /// Fold all reports, then apply overrides
    ///
    /// A report that cannot be resolved or normalized is recorded as a
    /// diagnostic and skipped.
    ///
    /// # Errors
    /// Only [`EvidenceError::UnknownOverrideTarget`] in strict mode.
    pub fn build<'r, I>(&self, reports: I) -> Result<MatrixBuild, EvidenceError>
    where
        I: IntoIterator<Item = &'r Report>,
    {
        let mut build = MatrixBuild::default();

        for report in reports {
            match self.fold_report(&mut build.matrix, report) {
                Ok(()) => build.accepted += 1,
                Err(diagnostic) => {
                    tracing::warn!("{}", diagnostic);
                    build.diagnostics.push(diagnostic);
                }
            }
        }

        build.overridden = build.matrix.apply_overrides(self.overrides, self.strict_overrides)?;

        tracing::info!(
            "Support matrix: {} features from {} reports ({} discarded, {} cells overridden)",
            build.matrix.len(),
            build.accepted,
            build.diagnostics.len(),
            build.overridden
        );

        Ok(build)
    }

    fn fold_report(
        &self,
        matrix: &mut SupportMatrix,
        report: &Report,
    ) -> Result<(), ReportDiagnostic> {
        let (browser, version) = self.identify(report)?;

        let support = normalize(report).map_err(|e| {
            let kind = match &e {
                EvidenceError::InvalidVerdict { .. } => DiagnosticKind::InvalidVerdict,
                _ => DiagnosticKind::EmptyReport,
            };
            diagnostic(kind, report, format!("Ignoring report: {e}"))
        })?;

        for (path, verdict) in support {
            matrix.record(self.catalog, path, &browser, version.clone(), verdict);
        }
        Ok(())
    }

    fn identify(&self, report: &Report) -> Result<(String, Version), ReportDiagnostic> {
        let identity = self.resolver.resolve(&report.user_agent, self.catalog);
        let ua = &report.user_agent;

        let Some(browser) = identity.browser else {
            return Err(diagnostic(
                DiagnosticKind::UnparseableUserAgent,
                report,
                format!("Unable to parse browser from UA {ua}"),
            ));
        };
        let version = identity.version.unwrap_or_default();

        let known_version = match identity.in_bcd {
            None => {
                return Err(diagnostic(
                    DiagnosticKind::UnknownBrowser,
                    report,
                    format!("Ignoring unknown browser {browser} {version} ({ua})"),
                ))
            }
            Some(false) => None,
            Some(true) => version.parse::<Version>().ok(),
        };

        known_version.map(|v| (browser.clone(), v)).ok_or_else(|| {
            diagnostic(
                DiagnosticKind::UnknownVersion,
                report,
                format!("Ignoring unknown {browser} version {version} ({ua})"),
            )
        })
    }
}

fn diagnostic(kind: DiagnosticKind, report: &Report, message: String) -> ReportDiagnostic {
    ReportDiagnostic {
        kind,
        user_agent: report.user_agent.clone(),
        message,
    }
}
