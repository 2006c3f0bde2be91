//! Update driver
//!
//! Runs every candidate through [`STAGES`](crate::stages::STAGES), collects
//! the decisions against an unmodified tree, then applies the writes.

use crate::mirror::MirrorResolver;
use crate::options::UpdateFilters;
use crate::stage::{Flow, PairState, SkipKind, SkipReason, Stage, UpdateContext};
use crate::stages::STAGES;
use compat_evidence::SupportMatrix;
use compat_model::{CompatTree, FeaturePath, SupportValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// One value to store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportWrite {
    /// Feature path
    pub path: FeaturePath,
    /// Browser
    pub browser: String,
    /// New support value
    pub value: SupportValue,
}

/// Result of one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Store a new value
    Write(SupportWrite),
    /// Leave the stored value alone
    Skip(SkipReason),
}

/// Summary of an update run
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    /// At least one value was written
    pub changed: bool,
    /// Written `(path, browser)` pairs in decision order
    pub modified: Vec<(FeaturePath, String)>,
    /// Every skipped candidate
    pub skips: Vec<SkipReason>,
}

impl UpdateOutcome {
    /// Number of distinct paths written
    #[must_use]
    pub fn modified_paths(&self) -> usize {
        let mut paths: Vec<&FeaturePath> = self.modified.iter().map(|(path, _)| path).collect();
        paths.sort_unstable();
        paths.dedup();
        paths.len()
    }

    /// Skips of one kind
    pub fn skips_of(&self, kind: SkipKind) -> impl Iterator<Item = &SkipReason> {
        self.skips.iter().filter(move |skip| skip.kind == kind)
    }

    /// Skips logged at warn level
    pub fn loud_skips(&self) -> impl Iterator<Item = &SkipReason> {
        self.skips.iter().filter(|skip| !skip.quiet)
    }
}

/// Decide every candidate without touching the tree
#[must_use]
pub fn plan(
    tree: &CompatTree,
    matrix: &SupportMatrix,
    mirror: &dyn MirrorResolver,
    filters: &UpdateFilters,
) -> Vec<Decision> {
    let ctx = UpdateContext {
        tree,
        matrix,
        mirror,
        filters,
    };

    let Some((first, rest)) = STAGES.split_first() else {
        return Vec::new();
    };

    let mut decisions = match (first.run)(PairState::root(), &ctx) {
        Ok(Flow::Expand(children)) => drive_all(children, rest, &ctx),
        Ok(Flow::Continue(state)) => {
            let mut decisions = Vec::new();
            drive(state, rest, &ctx, &mut decisions);
            decisions
        }
        Err(reason) => vec![Decision::Skip(reason)],
    };
    settle_mirrors(&mut decisions, tree, mirror);
    decisions
}

/// Keep mirror markers that agree with the upstream values written this run
///
/// Stages resolve a mirror against the stored upstream. When the upstream
/// is rewritten too, a mirrored write equal to what the marker resolves to
/// afterwards turns back into an `Unchanged` skip.
fn settle_mirrors(decisions: &mut [Decision], tree: &CompatTree, mirror: &dyn MirrorResolver) {
    let mut writes: BTreeMap<&FeaturePath, Vec<usize>> = BTreeMap::new();
    for (index, decision) in decisions.iter().enumerate() {
        if let Decision::Write(write) = decision {
            writes.entry(&write.path).or_default().push(index);
        }
    }

    let mut settled = Vec::new();
    for (path, indices) in writes {
        let Ok(Some(stored)) = tree.support(path) else {
            continue;
        };
        let mut candidates: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&index| match &decisions[index] {
                Decision::Write(write) => stored.get(&write.browser).is_some_and(SupportValue::is_mirror),
                Decision::Skip(_) => false,
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let mut after = stored;
        for &index in &indices {
            if let Decision::Write(write) = &decisions[index] {
                after.insert(write.browser.clone(), write.value.clone());
            }
        }

        // Restoring one marker can let a mirror of that browser agree too.
        loop {
            let before = candidates.len();
            candidates.retain(|&index| {
                let Decision::Write(write) = &decisions[index] else {
                    return false;
                };
                let agrees = matches!(
                    (mirror.resolve(&write.browser, &after), write.value.to_statements()),
                    (Some(resolved), Some(written)) if resolved == written
                );
                if agrees {
                    after.insert(write.browser.clone(), SupportValue::Mirror);
                    settled.push(index);
                }
                !agrees
            });
            if candidates.len() == before {
                break;
            }
        }
    }

    for index in settled {
        if let Decision::Write(write) = &decisions[index] {
            let skip = SkipReason {
                kind: SkipKind::Unchanged,
                path: write.path.clone(),
                browser: Some(write.browser.clone()),
                message: "mirror agrees with updated upstream".to_string(),
                quiet: SkipKind::Unchanged.is_quiet(),
            };
            decisions[index] = Decision::Skip(skip);
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn drive_all<'a>(
    states: Vec<PairState<'a>>,
    stages: &[Stage],
    ctx: &UpdateContext<'a>,
) -> Vec<Decision> {
    let mut decisions = Vec::new();
    for state in states {
        drive(state, stages, ctx, &mut decisions);
    }
    decisions
}

#[cfg(feature = "parallel")]
fn drive_all<'a>(
    states: Vec<PairState<'a>>,
    stages: &[Stage],
    ctx: &UpdateContext<'a>,
) -> Vec<Decision> {
    use rayon::prelude::*;

    states
        .into_par_iter()
        .map(|state| {
            let mut decisions = Vec::new();
            drive(state, stages, ctx, &mut decisions);
            decisions
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

fn drive<'a>(
    mut state: PairState<'a>,
    stages: &[Stage],
    ctx: &UpdateContext<'a>,
    decisions: &mut Vec<Decision>,
) {
    for (i, stage) in stages.iter().enumerate() {
        match (stage.run)(state, ctx) {
            Ok(Flow::Continue(next)) => state = next,
            Ok(Flow::Expand(children)) => {
                for child in children {
                    drive(child, &stages[i + 1..], ctx, decisions);
                }
                return;
            }
            Err(reason) => {
                tracing::trace!(stage = stage.name, "{}", reason);
                decisions.push(Decision::Skip(reason));
                return;
            }
        }
    }

    match (state.browser, state.write) {
        (Some(browser), Some(value)) => decisions.push(Decision::Write(SupportWrite {
            path: state.path,
            browser,
            value,
        })),
        (browser, _) => decisions.push(Decision::Skip(SkipReason {
            kind: SkipKind::NothingToWrite,
            path: state.path,
            browser,
            message: "pipeline produced no value".to_string(),
            quiet: false,
        })),
    }
}

/// Update `tree` from the evidence in `matrix`
///
/// Decisions are made against the tree as passed in; writes are applied
/// afterwards in decision order.
pub fn update(
    tree: &mut CompatTree,
    matrix: &SupportMatrix,
    mirror: &dyn MirrorResolver,
    filters: &UpdateFilters,
) -> UpdateOutcome {
    let decisions = plan(tree, matrix, mirror, filters);
    apply(tree, decisions)
}

/// Store the writes of `decisions` in order and log every skip
///
/// A write the tree rejects becomes a [`SkipKind::WriteFailed`] skip; the
/// remaining decisions still apply.
pub fn apply(tree: &mut CompatTree, decisions: Vec<Decision>) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();

    for decision in decisions {
        let skip = match decision {
            Decision::Write(write) => match tree.set_support(&write.path, &write.browser, &write.value) {
                Ok(()) => {
                    tracing::debug!("{} ({}): updated", write.path, write.browser);
                    outcome.modified.push((write.path, write.browser));
                    continue;
                }
                Err(e) => SkipReason {
                    kind: SkipKind::WriteFailed,
                    path: write.path,
                    browser: Some(write.browser),
                    message: e.to_string(),
                    quiet: SkipKind::WriteFailed.is_quiet(),
                },
            },
            Decision::Skip(skip) => skip,
        };

        if skip.quiet {
            tracing::debug!("{}", skip);
        } else {
            tracing::warn!("{}", skip);
        }
        outcome.skips.push(skip);
    }

    outcome.changed = !outcome.modified.is_empty();
    tracing::info!(
        "Updated {} paths ({} values, {} skipped)",
        outcome.modified_paths(),
        outcome.modified.len(),
        outcome.skips.len()
    );
    outcome
}
