//! Subcommand implementations

use crate::config::CollectorConfig;
use crate::inputs::{load_catalog, load_overrides, load_reports, load_resolver, load_tree, save_tree};
use anyhow::{Context, Result};
use compat_evidence::{MatrixBuild, MatrixBuilder};
use compat_model::{FeaturePath, Statement};
use compat_update::{infer, update, UpstreamMirror};
use std::fmt::{self, Display, Formatter};

/// Result of `update`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Reports folded into the matrix
    pub reports: usize,
    /// Reports discarded
    pub discarded: usize,
    /// Distinct paths written
    pub paths: usize,
    /// Browser values written
    pub values: usize,
    /// Loud skips
    pub warnings: usize,
    /// Tree file was rewritten
    pub written: bool,
}

impl Display for UpdateSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reports ({} discarded); updated {} paths ({} values); {} warnings",
            self.reports, self.discarded, self.paths, self.values, self.warnings
        )?;
        if self.values > 0 && !self.written {
            f.write_str(" [dry run]")?;
        }
        Ok(())
    }
}

fn build_matrix(config: &CollectorConfig) -> Result<MatrixBuild> {
    let catalog = load_catalog(config.require_catalog()?)?;
    let resolver = load_resolver(config.require_ua_map()?)?;
    let overrides = load_overrides(config.overrides.as_deref())?;
    let reports = load_reports(&config.reports)?;

    MatrixBuilder::new(&catalog, &resolver)
        .with_overrides(overrides.as_slice())
        .strict(config.update.strict_overrides)
        .build(&reports)
        .context("applying overrides")
}

/// Build the matrix, update the tree and write it back
///
/// # Errors
/// Returns error on unreadable inputs, malformed options, or a failed save.
pub fn run_update(config: &CollectorConfig, dry_run: bool) -> Result<UpdateSummary> {
    let tree_path = config.require_tree()?;
    let filters = config.update.compile()?;
    let mut tree = load_tree(tree_path)?;
    let build = build_matrix(config)?;

    let outcome = update(&mut tree, &build.matrix, &UpstreamMirror::with_defaults(), &filters);

    let written = outcome.changed && !dry_run;
    if written {
        save_tree(tree_path, &tree)?;
        tracing::info!("Wrote {}", tree_path.display());
    }

    Ok(UpdateSummary {
        reports: build.accepted,
        discarded: build.diagnostics.len(),
        paths: outcome.modified_paths(),
        values: outcome.modified.len(),
        warnings: outcome.loud_skips().count(),
        written,
    })
}

/// Inferred statements of one feature and browser
///
/// # Errors
/// Returns error on unreadable inputs or when there is no evidence.
pub fn run_infer(config: &CollectorConfig, feature: &str, browser: &str) -> Result<Vec<Statement>> {
    let path: FeaturePath = feature.parse()?;
    let build = build_matrix(config)?;
    let versions = build
        .matrix
        .versions(&path, browser)
        .with_context(|| format!("no evidence for {path} in {browser}"))?;
    Ok(infer(versions))
}
