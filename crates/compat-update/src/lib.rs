//! Compat Update
//!
//! Infers support ranges from a [`SupportMatrix`](compat_evidence::SupportMatrix)
//! and merges them into a [`CompatTree`](compat_model::CompatTree).
//!
//! # Core Concepts
//!
//! - **Inference**: [`infer`] turns a version series into statements
//! - **Stages**: each (feature, browser) candidate passes [`STAGES`] in order,
//!   ending as a write or a [`SkipReason`]
//! - **Mirror**: [`MirrorResolver`] resolves browsers that derive from an upstream
//! - **Snapshot**: all decisions read the input tree; writes apply afterwards
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_update::{update, UpdateOptions, UpstreamMirror};
//!
//! let filters = UpdateOptions::default().compile()?;
//! let outcome = update(&mut tree, &matrix, &UpstreamMirror::with_defaults(), &filters);
//! if outcome.changed {
//!     std::fs::write(path, tree.to_json_pretty()?)?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod infer;
mod mirror;
mod options;
mod pipeline;
mod stage;
mod stages;

// Re-exports
pub use error::UpdateError;
pub use infer::infer;
pub use mirror::{MirrorResolver, UpstreamMirror};
pub use options::{PathFilter, ReleaseFilter, UpdateFilters, UpdateOptions};
pub use pipeline::{apply, plan, update, Decision, SupportWrite, UpdateOutcome};
pub use stage::{
    Flow, PairState, SkipKind, SkipReason, Stage, StageFn, StageResult, UpdateContext,
};
pub use stages::{reconcile, STAGES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
