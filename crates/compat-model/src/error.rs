//! Error types for the compatibility model
//!
//! Covers the structural failures of the value types:
//! - Malformed range-encoded versions
//! - Verdict values outside `true | false | null`
//! - Unparseable versions and feature paths
//! - Support data that does not match the statement schema

/// Errors raised while decoding model values
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Range string matches neither `≤X` nor `X> ≤Y`
    #[error("malformed version range: '{0}'")]
    MalformedRange(String),

    /// Verdict outside `true | false | null`
    #[error("invalid verdict: expected true, false or null, got {0}")]
    InvalidVerdict(String),

    /// Release identifier is not dotted numeric or `preview`
    #[error("invalid version: '{0}'")]
    InvalidVersion(String),

    /// Empty segment in a feature path
    #[error("feature path contains empty segment")]
    EmptySegment,

    /// Segment with whitespace or control characters
    #[error("invalid feature path segment: '{0}'")]
    InvalidSegment(String),

    /// Support data under `__compat.support` does not decode
    #[error("invalid support data at {path}: {message}")]
    InvalidSupport {
        /// Feature path of the entry
        path: String,
        /// Decoder message
        message: String,
    },

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Create invalid support error for a path
    pub fn invalid_support(path: impl ToString, message: impl ToString) -> Self {
        Self::InvalidSupport {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}
