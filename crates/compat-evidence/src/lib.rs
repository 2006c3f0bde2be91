//! Compat Evidence
//!
//! Turns raw feature-detection reports into a [`SupportMatrix`].
//!
//! # Pipeline
//!
//! 1. [`UaResolver`] identifies the browser and release of each [`Report`]
//! 2. [`normalize`] folds every result into one verdict per feature path
//! 3. [`MatrixBuilder`] folds reports into release-seeded version maps
//! 4. [`Overrides`] replace cells known to be wrong
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_evidence::{MatrixBuilder, StaticResolver};
//!
//! let build = MatrixBuilder::new(&catalog, &resolver)
//!     .with_overrides(overrides.as_slice())
//!     .build(&reports)?;
//! for diagnostic in &build.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod matrix;
mod overrides;
mod report;
mod resolver;

// Re-exports
pub use error::EvidenceError;
pub use matrix::{
    BrowserMap, DiagnosticKind, MatrixBuild, MatrixBuilder, ReportDiagnostic, SupportMatrix,
    VersionMap,
};
pub use overrides::{Override, Overrides, VersionSpec};
pub use report::{normalize, Report, FeatureVerdicts, TestResult};
pub use resolver::{ResolvedIdentity, StaticResolver, UaEntry, UaResolver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
