//! Support statements
//!
//! The per-browser claims stored under `__compat.support`:
//! - [`VersionValue`]: `version_added` / `version_removed` values
//! - [`Statement`]: one qualified claim
//! - [`SupportValue`]: one statement, an ordered list, or the mirror marker

use crate::error::ModelError;
use crate::range::{is_range_encoded, VersionRange};
use crate::version::{Version, PREVIEW};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// Literal stored in place of a support value that mirrors an upstream browser
pub const MIRROR: &str = "mirror";

/// Support data of one entry, keyed by browser id
pub type SupportMap = IndexMap<String, SupportValue>;

/// Value of a `version_added` or `version_removed` field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionValue {
    /// No data (`null`)
    Null,

    /// `true` (supported, version unknown) or `false` (never supported)
    Flag(bool),

    /// Supported in the pre-release channel only
    Preview,

    /// Exact release
    Exact(Version),

    /// Uncertain boundary
    Range(VersionRange),
}

impl VersionValue {
    /// Parse the textual forms: a release, `preview` or a range
    ///
    /// # Errors
    /// Returns error if the text is neither a release nor a well-formed range.
    pub fn parse_text(text: &str) -> Result<Self, ModelError> {
        if text == PREVIEW {
            Ok(Self::Preview)
        } else if is_range_encoded(text) {
            Ok(Self::Range(text.parse()?))
        } else {
            Ok(Self::Exact(text.parse()?))
        }
    }

    /// Check for `false`
    #[inline]
    #[must_use]
    pub fn is_false(&self) -> bool {
        matches!(self, Self::Flag(false))
    }

    /// Check for a range-encoded boundary
    #[inline]
    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(_))
    }

    /// Latest release the value can denote
    ///
    /// The release itself for exact values, the upper bound for ranges.
    #[must_use]
    pub fn upper(&self) -> Option<&Version> {
        match self {
            Self::Exact(v) => Some(v),
            Self::Range(r) => Some(r.upper()),
            Self::Null | Self::Flag(_) | Self::Preview => None,
        }
    }
}

impl From<Version> for VersionValue {
    fn from(version: Version) -> Self {
        Self::Exact(version)
    }
}

impl From<VersionRange> for VersionValue {
    fn from(range: VersionRange) -> Self {
        Self::Range(range)
    }
}

impl From<bool> for VersionValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl Display for VersionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Preview => f.write_str(PREVIEW),
            Self::Exact(v) => write!(f, "{v}"),
            Self::Range(r) => write!(f, "{r}"),
        }
    }
}

impl Serialize for VersionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Flag(b) => serializer.serialize_bool(*b),
            Self::Preview => serializer.serialize_str(PREVIEW),
            Self::Exact(v) => serializer.serialize_str(v.as_str()),
            Self::Range(r) => serializer.serialize_str(&r.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for VersionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Self::Null),
            Some(Raw::Flag(b)) => Ok(Self::Flag(b)),
            Some(Raw::Text(text)) => Self::parse_text(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// One support claim for a (feature, browser) pair
///
/// Fields not modelled here are kept in `extra` and written back in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Release that added support
    pub version_added: VersionValue,

    /// Release that removed support
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_removed: Option<VersionValue>,

    /// Vendor prefix the feature is exposed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Alternative name the feature is exposed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_name: Option<String>,

    /// Preferences or runtime flags required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<Value>>,

    /// Support is incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_implementation: Option<bool>,

    /// Free-form notes (string or list of strings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,

    /// Unmodelled fields
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Statement {
    /// Create statement with only `version_added`
    #[must_use]
    pub fn new(version_added: impl Into<VersionValue>) -> Self {
        Self {
            version_added: version_added.into(),
            version_removed: None,
            prefix: None,
            alternative_name: None,
            flags: None,
            partial_implementation: None,
            notes: None,
            extra: IndexMap::new(),
        }
    }

    /// Set `version_removed`
    #[must_use]
    pub fn with_removed(mut self, version_removed: impl Into<VersionValue>) -> Self {
        self.version_removed = Some(version_removed.into());
        self
    }

    /// Check for the unqualified statement (no prefix, alternative name or flags)
    #[inline]
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.prefix.is_none() && self.alternative_name.is_none() && self.flags.is_none()
    }

    /// Check for `partial_implementation: true`
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.partial_implementation == Some(true)
    }

    /// Check if either version field is range-encoded
    #[must_use]
    pub fn has_range(&self) -> bool {
        self.version_added.is_range()
            || self.version_removed.as_ref().is_some_and(VersionValue::is_range)
    }
}

/// Support value of one browser
#[derive(Debug, Clone, PartialEq)]
pub enum SupportValue {
    /// Derived from an upstream browser
    Mirror,

    /// Single statement
    Single(Statement),

    /// Ordered alternatives
    List(Vec<Statement>),
}

impl SupportValue {
    /// Wrap statements, collapsing a one-element list
    #[must_use]
    pub fn from_statements(mut statements: Vec<Statement>) -> Self {
        if statements.len() == 1 {
            Self::Single(statements.remove(0))
        } else {
            Self::List(statements)
        }
    }

    /// Concrete statements, `None` for the mirror marker
    #[must_use]
    pub fn to_statements(&self) -> Option<Vec<Statement>> {
        match self {
            Self::Mirror => None,
            Self::Single(s) => Some(vec![s.clone()]),
            Self::List(list) => Some(list.clone()),
        }
    }

    /// Check for the mirror marker
    #[inline]
    #[must_use]
    pub fn is_mirror(&self) -> bool {
        matches!(self, Self::Mirror)
    }
}

impl Serialize for SupportValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Mirror => serializer.serialize_str(MIRROR),
            Self::Single(s) => s.serialize(serializer),
            Self::List(list) => list.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SupportValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::String(s) if s == MIRROR => Ok(Self::Mirror),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(Self::Single)
                .map_err(D::Error::custom),
            value @ Value::Array(_) => serde_json::from_value(value)
                .map(Self::List)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected statement, list of statements or \"{MIRROR}\", got {other}"
            ))),
        }
    }
}

/// Decode a `support` object into typed values
///
/// # Errors
/// Returns error if any browser's value does not match the statement schema.
pub fn decode_support(path: impl Display, support: &Map<String, Value>) -> Result<SupportMap, ModelError> {
    support
        .iter()
        .map(|(browser, value)| {
            SupportValue::deserialize(value)
                .map(|decoded| (browser.clone(), decoded))
                .map_err(|e| ModelError::invalid_support(&path, format!("{browser}: {e}")))
        })
        .collect()
}
