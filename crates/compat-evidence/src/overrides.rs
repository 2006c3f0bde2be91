//! Manual overrides
//!
//! An override replaces matrix cells to correct known-bad report data. The
//! file form is a JSON array of `[path, browser, versions, verdict]` tuples;
//! any non-array element (a comment string) is ignored.

use crate::error::EvidenceError;
use compat_model::{FeaturePath, Verdict, Version};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Releases an override applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Every release (`*`)
    Any,

    /// One release (`83`)
    Exact(Version),

    /// This release and later (`83+`)
    AtLeast(Version),

    /// Inclusive window (`80-83`)
    Between(Version, Version),
}

impl VersionSpec {
    /// Check if a release is covered
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => v == version,
            Self::AtLeast(start) => version >= start,
            Self::Between(start, end) => version >= start && version <= end,
        }
    }
}

impl FromStr for VersionSpec {
    type Err = compat_model::ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            Ok(Self::Any)
        } else if let Some(start) = s.strip_suffix('+') {
            Ok(Self::AtLeast(start.parse()?))
        } else if let Some((start, end)) = s.split_once('-') {
            Ok(Self::Between(start.parse()?, end.parse()?))
        } else {
            Ok(Self::Exact(s.parse()?))
        }
    }
}

impl Display for VersionSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(v) => write!(f, "{v}"),
            Self::AtLeast(v) => write!(f, "{v}+"),
            Self::Between(a, b) => write!(f, "{a}-{b}"),
        }
    }
}

/// One manual correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Feature path
    pub path: FeaturePath,
    /// Browser id
    pub browser: String,
    /// Releases covered
    pub versions: VersionSpec,
    /// Verdict written into every covered cell
    pub verdict: Verdict,
}

impl Override {
    /// Decode one `[path, browser, versions, verdict]` tuple
    ///
    /// # Errors
    /// Returns [`EvidenceError::InvalidOverride`] when the tuple is malformed.
    pub fn from_tuple(index: usize, items: &[Value]) -> Result<Self, EvidenceError> {
        let [path, browser, versions, verdict] = items else {
            return Err(EvidenceError::invalid_override(
                index,
                format!("expected 4 elements, got {}", items.len()),
            ));
        };

        let text = |value: &Value, what: &str| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| EvidenceError::invalid_override(index, format!("{what} must be a string")))
        };

        let path = text(path, "path")?
            .parse()
            .map_err(|e| EvidenceError::invalid_override(index, format!("path: {e}")))?;
        let browser = text(browser, "browser")?;
        let versions = text(versions, "versions")?
            .parse()
            .map_err(|e| EvidenceError::invalid_override(index, format!("versions: {e}")))?;
        let verdict = Verdict::try_from(verdict)
            .map_err(|e| EvidenceError::invalid_override(index, e.to_string()))?;

        Ok(Self {
            path,
            browser,
            versions,
            verdict,
        })
    }
}

/// Ordered override list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides(Vec<Override>);

impl Overrides {
    /// Create from decoded overrides
    #[inline]
    #[must_use]
    pub fn new(overrides: Vec<Override>) -> Self {
        Self(overrides)
    }

    /// Decode the file form
    ///
    /// # Errors
    /// Returns error if the value is not an array or a tuple is malformed.
    pub fn from_value(value: &Value) -> Result<Self, EvidenceError> {
        let items = value
            .as_array()
            .ok_or_else(|| EvidenceError::invalid_override(0, "overrides must be an array"))?;

        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_array().map(|tuple| (index, tuple)))
            .map(|(index, tuple)| Override::from_tuple(index, tuple))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Overrides in application order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Override] {
        &self.0
    }

    /// Number of overrides
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Overrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
