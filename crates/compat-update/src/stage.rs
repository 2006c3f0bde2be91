//! Pipeline state and stage plumbing
//!
//! Every stage takes the [`PairState`] of one (feature, browser) candidate and
//! either continues with it, expands it into several states, or skips it with
//! a [`SkipReason`].

use crate::mirror::MirrorResolver;
use crate::options::UpdateFilters;
use compat_evidence::{SupportMatrix, VersionMap};
use compat_model::{CompatTree, FeaturePath, Statement, SupportMap, SupportValue};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Read-only inputs shared by every stage
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    /// Tree being updated, as it was before any write
    pub tree: &'a CompatTree,
    /// Evidence
    pub matrix: &'a SupportMatrix,
    /// Mirror marker resolution
    pub mirror: &'a dyn MirrorResolver,
    /// Compiled options
    pub filters: &'a UpdateFilters,
}

/// Why a candidate was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// Outside the path filter
    PathFilter,
    /// No `__compat` entry at the path
    MissingEntry,
    /// Support data does not match the statement schema
    InvalidSupport,
    /// Browser has no evidence at this path
    NoMatrixData,
    /// Outside the browser allow-list
    BrowserFilter,
    /// Evidence holds no known verdict
    NoEvidence,
    /// Evidence implies more than one statement
    FragmentedInference,
    /// Inferred versions fall outside the release filter
    ReleaseFilter,
    /// Mirror marker could not be resolved
    UnresolvedMirror,
    /// No default statement and nothing negative to record
    NoDefaultStatement,
    /// More than one default statement
    MultipleDefaults,
    /// Default statement already has `version_removed`
    AlreadyRemoved,
    /// Preview support without evidence from a preview release
    PreviewSupport,
    /// Negative evidence against a partial implementation
    PartialImplementation,
    /// Range left in the default statement under exact-only
    NotExact,
    /// Merge produced no statements
    NothingToWrite,
    /// Merge produced what is already stored
    Unchanged,
    /// Tree rejected the decided value
    WriteFailed,
    /// A stage ran before the one that fills its input
    StageOrder,
}

impl SkipKind {
    /// Quiet skips are routine and logged at debug level
    #[must_use]
    pub fn is_quiet(self) -> bool {
        matches!(
            self,
            Self::PathFilter
                | Self::MissingEntry
                | Self::NoMatrixData
                | Self::NoEvidence
                | Self::ReleaseFilter
                | Self::NoDefaultStatement
                | Self::PreviewSupport
                | Self::Unchanged
        )
    }
}

/// A dropped candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    /// Category
    pub kind: SkipKind,
    /// Feature path
    pub path: FeaturePath,
    /// Browser, if the candidate had one yet
    pub browser: Option<String>,
    /// Human-readable detail
    pub message: String,
    /// Logged at debug instead of warn
    pub quiet: bool,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.browser {
            Some(browser) => write!(f, "{} ({}): {}", self.path, browser, self.message),
            None => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Working state of one candidate
#[derive(Debug, Clone, Default)]
pub struct PairState<'a> {
    /// Feature path
    pub path: FeaturePath,
    /// Browser, set by browser expansion
    pub browser: Option<String>,
    /// Decoded `support` object of the path, shared between browsers
    pub support: Option<Arc<SupportMap>>,
    /// Evidence series of the browser
    pub versions: Option<&'a VersionMap>,
    /// Single inferred statement
    pub inferred: Option<Statement>,
    /// Stored value of the browser, `None` if absent
    pub original: Option<SupportValue>,
    /// Statements after mirror resolution, before merging
    pub resolved: Vec<Statement>,
    /// Working copy merged in place
    pub statements: Vec<Statement>,
    /// Indices of default statements in `statements`
    pub defaults: Vec<usize>,
    /// Final value to write
    pub write: Option<SupportValue>,
}

impl<'a> PairState<'a> {
    /// Create state for the whole tree
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive state for one path
    #[must_use]
    pub fn for_path(&self, path: FeaturePath) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Derive state for one browser of this path
    #[must_use]
    pub fn for_browser(&self, browser: &str, original: Option<SupportValue>) -> Self {
        Self {
            path: self.path.clone(),
            browser: Some(browser.to_string()),
            support: self.support.clone(),
            original,
            ..Self::default()
        }
    }

    /// Build a skip record for this candidate
    #[must_use]
    pub fn skip(&self, kind: SkipKind, message: impl Into<String>) -> SkipReason {
        SkipReason {
            kind,
            path: self.path.clone(),
            browser: self.browser.clone(),
            message: message.into(),
            quiet: kind.is_quiet(),
        }
    }

    /// Browser, or a stage-order skip
    ///
    /// # Errors
    /// Returns [`SkipKind::StageOrder`] before browser expansion.
    pub fn browser(&self) -> Result<&str, SkipReason> {
        self.browser
            .as_deref()
            .ok_or_else(|| self.skip(SkipKind::StageOrder, "browser not expanded"))
    }

    /// Support map, or a stage-order skip
    ///
    /// # Errors
    /// Returns [`SkipKind::StageOrder`] before the entry is located.
    pub fn support(&self) -> Result<&SupportMap, SkipReason> {
        self.support
            .as_deref()
            .ok_or_else(|| self.skip(SkipKind::StageOrder, "entry not located"))
    }

    /// Inferred statement, or a stage-order skip
    ///
    /// # Errors
    /// Returns [`SkipKind::StageOrder`] before inference.
    pub fn inferred(&self) -> Result<&Statement, SkipReason> {
        self.inferred
            .as_ref()
            .ok_or_else(|| self.skip(SkipKind::StageOrder, "statement not inferred"))
    }

    /// Evidence series, or a stage-order skip
    ///
    /// # Errors
    /// Returns [`SkipKind::StageOrder`] before evidence is attached.
    pub fn versions(&self) -> Result<&'a VersionMap, SkipReason> {
        self.versions
            .ok_or_else(|| self.skip(SkipKind::StageOrder, "evidence not attached"))
    }

    /// Index of the single default statement, or a stage-order skip
    ///
    /// # Errors
    /// Returns [`SkipKind::StageOrder`] unless exactly one default was located.
    pub fn default_index(&self) -> Result<usize, SkipReason> {
        match self.defaults.as_slice() {
            [index] => Ok(*index),
            _ => Err(self.skip(SkipKind::StageOrder, "default statement not located")),
        }
    }
}

/// What a stage did with its input
#[derive(Debug)]
pub enum Flow<'a> {
    /// Pass the state on
    Continue(PairState<'a>),
    /// Replace the state with several; each runs the remaining stages
    Expand(Vec<PairState<'a>>),
}

/// Stage outcome
pub type StageResult<'a> = Result<Flow<'a>, SkipReason>;

/// Stage function
pub type StageFn = for<'a> fn(PairState<'a>, &UpdateContext<'a>) -> StageResult<'a>;

/// Named stage
#[derive(Clone, Copy)]
pub struct Stage {
    /// Name used in trace logs
    pub name: &'static str,
    /// Stage function
    pub run: StageFn,
}

impl Stage {
    /// Create named stage
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, run: StageFn) -> Self {
        Self { name, run }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}
