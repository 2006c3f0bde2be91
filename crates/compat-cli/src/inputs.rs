//! Input file loading

use anyhow::{bail, Context, Result};
use compat_evidence::{Overrides, Report, StaticResolver};
use compat_model::{BrowserCatalog, CompatTree};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {what} {}", path.display()))
}

/// Load the compatibility tree
///
/// # Errors
/// Returns error if the file cannot be read or is not JSON.
pub fn load_tree(path: &Path) -> Result<CompatTree> {
    read_json(path, "compatibility tree")
}

/// Write the tree as two-space indented JSON with a trailing newline
///
/// # Errors
/// Returns error if serialization or the write fails.
pub fn save_tree(path: &Path, tree: &CompatTree) -> Result<()> {
    let text = tree.to_json_pretty()?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Load the release catalog
///
/// Accepts either the bare browser map or a document with a `browsers` key.
///
/// # Errors
/// Returns error if the file cannot be read or does not describe browsers.
pub fn load_catalog(path: &Path) -> Result<BrowserCatalog> {
    let mut value: Value = read_json(path, "release catalog")?;
    if let Some(browsers) = value.get_mut("browsers") {
        value = browsers.take();
    }
    serde_json::from_value(value).with_context(|| format!("decoding catalog {}", path.display()))
}

/// Load the override list; no path means no overrides
///
/// # Errors
/// Returns error if the file cannot be read or a tuple is malformed.
pub fn load_overrides(path: Option<&Path>) -> Result<Overrides> {
    match path {
        Some(path) => read_json(path, "overrides"),
        None => Ok(Overrides::default()),
    }
}

/// Load the user-agent table
///
/// # Errors
/// Returns error if the file cannot be read or decoded.
pub fn load_resolver(path: &Path) -> Result<StaticResolver> {
    read_json(path, "user-agent table")
}

/// Expand report arguments: files as given, directories to their `.json`
/// files in name order
///
/// # Errors
/// Returns error if a directory cannot be listed.
pub fn report_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("listing {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Load every report
///
/// A file that cannot be parsed is logged and skipped.
///
/// # Errors
/// Returns error if no report could be loaded.
pub fn load_reports(paths: &[PathBuf]) -> Result<Vec<Report>> {
    let files = report_files(paths)?;
    let mut reports = Vec::with_capacity(files.len());

    for file in &files {
        match read_json::<Report>(file, "report") {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!("Skipping report: {:#}", e),
        }
    }

    if reports.is_empty() {
        bail!("no usable reports among {} file(s)", files.len());
    }
    tracing::info!("Loaded {} reports", reports.len());
    Ok(reports)
}
