//! Range-encoded versions
//!
//! When a support transition happened somewhere between two observed
//! releases, the boundary is written as `"lower> ≤upper"`, or `"≤upper"` when
//! nothing earlier is known.

use crate::error::ModelError;
use crate::version::Version;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const AT_MOST: char = '≤';
const SEPARATOR: &str = "> ≤";

/// Encode an uncertain boundary
///
/// A `0` lower bound is elided.
#[must_use]
pub fn encode(lower: &Version, upper: &Version) -> String {
    if lower.is_zero() {
        format!("{AT_MOST}{upper}")
    } else {
        format!("{lower}{SEPARATOR}{upper}")
    }
}

/// Decode a range string into `(lower, upper)`
///
/// `"≤X"` decodes with a `0` lower bound.
///
/// # Errors
/// Returns [`ModelError::MalformedRange`] if the text matches neither form.
pub fn decode(text: &str) -> Result<(Version, Version), ModelError> {
    let malformed = || ModelError::MalformedRange(text.to_string());

    if let Some(upper) = text.strip_prefix(AT_MOST) {
        let upper = upper.parse::<Version>().map_err(|_| malformed())?;
        return Ok((Version::zero(), upper));
    }

    let (lower, upper) = text.split_once(SEPARATOR).ok_or_else(malformed)?;
    let lower = lower.parse::<Version>().map_err(|_| malformed())?;
    let upper = upper.parse::<Version>().map_err(|_| malformed())?;
    Ok((lower, upper))
}

/// Check if text looks range-encoded
#[inline]
#[must_use]
pub fn is_range_encoded(text: &str) -> bool {
    text.contains(AT_MOST)
}

/// Half-open release window `(lower, upper]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: Version,
    upper: Version,
}

impl VersionRange {
    /// Create range from bounds
    #[inline]
    #[must_use]
    pub fn new(lower: Version, upper: Version) -> Self {
        Self { lower, upper }
    }

    /// Range with no known lower bound
    #[inline]
    #[must_use]
    pub fn up_to(upper: Version) -> Self {
        Self::new(Version::zero(), upper)
    }

    /// Exclusive lower bound
    #[inline]
    #[must_use]
    pub fn lower(&self) -> &Version {
        &self.lower
    }

    /// Inclusive upper bound
    #[inline]
    #[must_use]
    pub fn upper(&self) -> &Version {
        &self.upper
    }

    /// Check `lower < version <= upper`
    #[inline]
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        *version > self.lower && *version <= self.upper
    }

    /// Overlap of two ranges, if non-empty
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let lower = self.lower.clone().max(other.lower.clone());
        let upper = self.upper.clone().min(other.upper.clone());
        (lower < upper).then(|| Self::new(lower, upper))
    }
}

impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.lower, &self.upper))
    }
}

impl FromStr for VersionRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lower, upper) = decode(s)?;
        Ok(Self::new(lower, upper))
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
    fn encode_zero_lower_bound() {
        assert_eq!(encode(&Version::zero(), &v("83")), "≤83");
    }

    #[test]
    fn encode_known_lower_bound() {
        assert_eq!(encode(&v("82"), &v("84")), "82> ≤84");
    }

    #[test]
    fn decode_both_forms() {
        assert_eq!(decode("≤83").unwrap(), (Version::zero(), v("83")));
        assert_eq!(decode("82> ≤84").unwrap(), (v("82"), v("84")));
        assert_eq!(decode("14.1> ≤15.4").unwrap(), (v("14.1"), v("15.4")));
    }

    #[test]
    fn decode_rejects_malformed() {
        for text in ["83", "82 - 84", "82>≤84", "≤", "> ≤84", "a> ≤b", "≤preview2"] {
            assert!(
                matches!(decode(text), Err(ModelError::MalformedRange(_))),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn range_contains_is_half_open() {
        let range: VersionRange = "82> ≤84".parse().unwrap();
        assert!(!range.contains(&v("82")));
        assert!(range.contains(&v("83")));
        assert!(range.contains(&v("84")));
        assert!(!range.contains(&v("85")));
    }

    #[test]
    fn range_intersect() {
        let a: VersionRange = "≤90".parse().unwrap();
        let b: VersionRange = "85> ≤95".parse().unwrap();
        assert_eq!(a.intersect(&b).unwrap().to_string(), "85> ≤90");

        let c: VersionRange = "90> ≤95".parse().unwrap();
        assert!(a.intersect(&c).is_none());
    }

    #[test]
    fn range_detection() {
        assert!(is_range_encoded("≤12"));
        assert!(is_range_encoded("11> ≤12"));
        assert!(!is_range_encoded("12"));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(lower in 0u64..200, delta in 1u64..50, minor in 0u64..10) {
            let lower = v(&lower.to_string());
            let upper = v(&format!("{}.{}", delta + 200, minor));
            let (l, u) = decode(&encode(&lower, &upper)).unwrap();
            prop_assert_eq!(l, lower);
            prop_assert_eq!(u, upper);
        }
    }
}
