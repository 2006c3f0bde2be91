//! Update error types

use thiserror::Error;

/// Errors raised while compiling update options
///
/// Per-pair problems are never errors; they become skip records.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Path filter could not be compiled
    #[error("invalid path filter '{filter}': {source}")]
    InvalidPathFilter {
        /// Filter as given
        filter: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Release filter is not `X` or `X-Y`
    #[error("invalid release filter '{0}'")]
    InvalidReleaseFilter(String),
}
