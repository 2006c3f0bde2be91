//! Error types for evidence collection
//!
//! Failures are scoped to one report or one override; the matrix builder
//! records them and carries on with the rest of the batch.

use compat_model::ModelError;

/// Errors during report normalization and matrix construction
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    /// Report carries no usable results
    #[error("report has no usable results ({user_agent})")]
    EmptyReport {
        /// User agent of the submitting browser
        user_agent: String,
    },

    /// Result value outside `true | false | null`
    #[error("invalid verdict for {name}: {value}")]
    InvalidVerdict {
        /// Test name
        name: String,
        /// Offending JSON value
        value: String,
    },

    /// Strict mode: override addresses a cell absent from the matrix
    #[error("override target not in matrix: {path} / {browser}")]
    UnknownOverrideTarget {
        /// Feature path of the override
        path: String,
        /// Browser id of the override
        browser: String,
    },

    /// Override entry is not a `[path, browser, versions, verdict]` tuple
    #[error("invalid override #{index}: {message}")]
    InvalidOverride {
        /// Position in the overrides list
        index: usize,
        /// What was wrong
        message: String,
    },

    /// Model value failed to decode
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl EvidenceError {
    /// Create invalid override error
    pub fn invalid_override(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            index,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_names_user_agent() {
        let err = EvidenceError::EmptyReport {
            user_agent: "Mozilla/5.0".into(),
        };
        assert!(err.to_string().contains("Mozilla/5.0"));
    }

    #[test]
    fn model_error_converts() {
        let err: EvidenceError = ModelError::MalformedRange("x".into()).into();
        assert!(matches!(err, EvidenceError::Model(ModelError::MalformedRange(_))));
    }
}
