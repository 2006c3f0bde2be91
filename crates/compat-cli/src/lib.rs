//! Compat Collector CLI
//!
//! Library half of the `compat-collector` binary: configuration, input
//! loading and the subcommands, kept here so they can be tested without
//! spawning a process.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod inputs;

pub use commands::{run_infer, run_update, UpdateSummary};
pub use config::CollectorConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
