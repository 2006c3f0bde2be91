//! Tri-state test verdicts
//!
//! Provides [`Verdict`] and the [`combine`] reduction used wherever several
//! observations of one feature have to be folded into one.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Outcome of one feature test
///
/// Encoded on the wire as `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Verdict {
    /// Feature behaved as expected
    Supported,

    /// Feature is missing or broken
    Unsupported,

    /// Test could not decide
    #[default]
    Unknown,
}

impl Verdict {
    /// Fold two observations of the same feature
    ///
    /// Supported wins over Unsupported, which wins over Unknown.
    #[inline]
    #[must_use]
    pub fn fold(self, other: Self) -> Self {
        match (self, other) {
            (Self::Supported, _) | (_, Self::Supported) => Self::Supported,
            (Self::Unsupported, _) | (_, Self::Unsupported) => Self::Unsupported,
            (Self::Unknown, Self::Unknown) => Self::Unknown,
        }
    }

    /// Check if the verdict carries information
    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Convert from the nullable boolean wire form
    #[inline]
    #[must_use]
    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Supported,
            Some(false) => Self::Unsupported,
            None => Self::Unknown,
        }
    }

    /// Convert to the nullable boolean wire form
    #[inline]
    #[must_use]
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Supported => Some(true),
            Self::Unsupported => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Reduce a list of verdicts for one feature into one
///
/// Empty input yields [`Verdict::Unknown`].
pub fn combine<I>(verdicts: I) -> Verdict
where
    I: IntoIterator<Item = Verdict>,
{
    verdicts.into_iter().fold(Verdict::Unknown, Verdict::fold)
}

impl TryFrom<&Value> for Verdict {
    type Error = ModelError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(Self::from_option(Some(*b))),
            Value::Null => Ok(Self::Unknown),
            other => Err(ModelError::InvalidVerdict(other.to_string())),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(&value).map_err(serde::de::Error::custom)
    }
}
