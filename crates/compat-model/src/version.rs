//! Browser release identifiers
//!
//! Provides [`Version`], an ordered release identifier that keeps its raw
//! text so values survive a load/save cycle unchanged.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Text of the pre-release channel
pub const PREVIEW: &str = "preview";

/// Release identifier
///
/// Either dotted numeric (`83`, `15.4`, `1.5`) or `preview`, which sorts
/// after every numbered release. Numeric segments compare left to right with
/// missing segments read as zero; equal numbers fall back to the raw text.
///
/// # Examples
/// - `9 < 10`
/// - `15.4 < 16`
/// - `110 < preview`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    parts: Vec<u64>,
    preview: bool,
}

impl Version {
    /// Lowest possible bound, used when no earlier release is known
    #[must_use]
    pub fn zero() -> Self {
        Self {
            raw: "0".to_string(),
            parts: vec![0],
            preview: false,
        }
    }

    /// Pre-release channel
    #[must_use]
    pub fn preview() -> Self {
        Self {
            raw: PREVIEW.to_string(),
            parts: Vec::new(),
            preview: true,
        }
    }

    /// Raw text of the release
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check for the `0` lower bound
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        !self.preview && self.parts.iter().all(|p| *p == 0)
    }

    /// Check for the pre-release channel
    #[inline]
    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    fn compare_parts(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.preview
            .cmp(&other.preview)
            .then_with(|| self.compare_parts(other))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PREVIEW {
            return Ok(Self::preview());
        }

        let parts = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                    Err(ModelError::InvalidVersion(s.to_string()))
                } else {
                    seg.parse::<u64>()
                        .map_err(|_| ModelError::InvalidVersion(s.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: s.to_string(),
            parts,
            preview: false,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn version_numeric_order() {
        assert!(v("9") < v("10"));
        assert!(v("15.4") < v("16"));
        assert!(v("1.5") < v("2"));
        assert!(v("3.6") > v("3.5"));
    }

    #[test]
    fn version_preview_is_newest() {
        assert!(v("120") < v("preview"));
        assert!(v("preview").is_preview());
    }

    #[test]
    fn version_equal_numbers_tie_break_on_text() {
        let a = v("1");
        let b = v("1.0");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn version_zero() {
        assert!(Version::zero().is_zero());
        assert!(v("0.0").is_zero());
        assert!(!v("1").is_zero());
        assert!(Version::zero() < v("1"));
    }

    #[test]
    fn version_rejects_garbage() {
        assert!(matches!("".parse::<Version>(), Err(ModelError::InvalidVersion(_))));
        assert!("1..2".parse::<Version>().is_err());
        assert!("≤83".parse::<Version>().is_err());
        assert!("beta".parse::<Version>().is_err());
    }

    #[test]
    fn version_serde_keeps_text() {
        let parsed: Version = serde_json::from_str("\"15.40\"").unwrap();
        assert_eq!(parsed.as_str(), "15.40");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"15.40\"");
    }

    proptest! {
        #[test]
        fn prop_numeric_order_matches_integers(a in 0u64..500, b in 0u64..500) {
            let va = v(&a.to_string());
            let vb = v(&b.to_string());
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
