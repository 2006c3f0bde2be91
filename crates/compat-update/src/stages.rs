//! Update stages in pipeline order

use crate::infer::infer;
use crate::stage::{Flow, PairState, SkipKind, Stage, StageResult, UpdateContext};
use compat_model::{Statement, SupportValue, VersionValue};
use std::sync::Arc;

/// Every stage, in execution order
pub const STAGES: &[Stage] = &[
    Stage::new("expand_paths", expand_paths),
    Stage::new("filter_path", filter_path),
    Stage::new("locate_entry", locate_entry),
    Stage::new("expand_browsers", expand_browsers),
    Stage::new("attach_evidence", attach_evidence),
    Stage::new("filter_browser", filter_browser),
    Stage::new("infer_statement", infer_statement),
    Stage::new("filter_release", filter_release),
    Stage::new("resolve_support", resolve_support),
    Stage::new("locate_default", locate_default),
    Stage::new("guard_ambiguous", guard_ambiguous),
    Stage::new("guard_preview", guard_preview),
    Stage::new("merge_versions", merge_versions),
    Stage::new("guard_exact", guard_exact),
    Stage::new("finalize", finalize),
];

fn expand_paths<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    Ok(Flow::Expand(
        ctx.matrix
            .paths()
            .map(|path| state.for_path(path.clone()))
            .collect(),
    ))
}

fn filter_path<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    if ctx.filters.allows_path(&state.path) {
        Ok(Flow::Continue(state))
    } else {
        Err(state.skip(SkipKind::PathFilter, "outside path filter"))
    }
}

fn locate_entry<'a>(mut state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    match ctx.tree.support(&state.path) {
        Ok(Some(support)) => {
            state.support = Some(Arc::new(support));
            Ok(Flow::Continue(state))
        }
        Ok(None) => Err(state.skip(SkipKind::MissingEntry, "no compat entry")),
        Err(e) => Err(state.skip(SkipKind::InvalidSupport, e.to_string())),
    }
}

/// Browsers of the entry in stored order, then evidence-only browsers
fn expand_browsers<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let support = state.support()?;
    let mut children: Vec<PairState<'a>> = support
        .iter()
        .map(|(browser, value)| state.for_browser(browser, Some(value.clone())))
        .collect();

    if let Some(browsers) = ctx.matrix.browsers(&state.path) {
        children.extend(
            browsers
                .keys()
                .filter(|browser| !support.contains_key(browser.as_str()))
                .map(|browser| state.for_browser(browser, None)),
        );
    }

    Ok(Flow::Expand(children))
}

fn attach_evidence<'a>(mut state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    match ctx.matrix.versions(&state.path, state.browser()?) {
        Some(versions) => {
            state.versions = Some(versions);
            Ok(Flow::Continue(state))
        }
        None => Err(state.skip(SkipKind::NoMatrixData, "no evidence")),
    }
}

fn filter_browser<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    if ctx.filters.allows_browser(state.browser()?) {
        Ok(Flow::Continue(state))
    } else {
        Err(state.skip(SkipKind::BrowserFilter, "browser not selected"))
    }
}

fn infer_statement<'a>(mut state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let mut inferred = infer(state.versions()?);
    match inferred.len() {
        0 => Err(state.skip(SkipKind::NoEvidence, "no known verdict")),
        1 => {
            state.inferred = inferred.pop();
            Ok(Flow::Continue(state))
        }
        n => Err(state.skip(
            SkipKind::FragmentedInference,
            format!(
                "{n} statements inferred: {}",
                serde_json::to_string(&inferred).unwrap_or_default()
            ),
        )),
    }
}

fn filter_release<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let Some(release) = &ctx.filters.release else {
        return Ok(Flow::Continue(state));
    };

    let inferred = state.inferred()?;
    let touches_release = std::iter::once(&inferred.version_added)
        .chain(inferred.version_removed.as_ref())
        .filter_map(VersionValue::upper)
        .any(|upper| release.matches(upper));

    if touches_release {
        Ok(Flow::Continue(state))
    } else {
        Err(state.skip(SkipKind::ReleaseFilter, "outside release filter"))
    }
}

fn resolve_support<'a>(mut state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let statements = match &state.original {
        None => Vec::new(),
        Some(SupportValue::Mirror) => {
            match ctx.mirror.resolve(state.browser()?, state.support()?) {
                Some(statements) => statements,
                None => return Err(state.skip(SkipKind::UnresolvedMirror, "cannot resolve mirror")),
            }
        }
        Some(value) => value.to_statements().unwrap_or_default(),
    };

    state.resolved.clone_from(&statements);
    state.statements = statements;
    Ok(Flow::Continue(state))
}

fn locate_default<'a>(mut state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    state.defaults = state
        .statements
        .iter()
        .enumerate()
        .filter(|(_, statement)| statement.is_default())
        .map(|(index, _)| index)
        .collect();

    if state.defaults.is_empty() {
        if !state.inferred()?.version_added.is_false() {
            return Err(state.skip(SkipKind::NoDefaultStatement, "no default statement"));
        }
        state.statements.insert(0, Statement::new(false));
        state.defaults = vec![0];
    }

    Ok(Flow::Continue(state))
}

fn guard_ambiguous<'a>(state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    if state.defaults.len() > 1 {
        return Err(state.skip(
            SkipKind::MultipleDefaults,
            format!("{} default statements", state.defaults.len()),
        ));
    }

    let index = state.default_index()?;
    let current = &state.statements[index];
    if let Some(removed) = &current.version_removed {
        let inferred = state.inferred()?;
        let keeps = |stored: &VersionValue, evidence: &VersionValue| reconcile(stored, evidence) == *stored;
        let recorded = keeps(&current.version_added, &inferred.version_added)
            && inferred
                .version_removed
                .as_ref()
                .is_some_and(|evidence| keeps(removed, evidence));
        if recorded {
            return Err(state.skip(SkipKind::Unchanged, "already recorded"));
        }
        return Err(state.skip(SkipKind::AlreadyRemoved, "default statement has version_removed"));
    }

    Ok(Flow::Continue(state))
}

fn guard_preview<'a>(state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let current = &state.statements[state.default_index()?];
    if current.version_added == VersionValue::Preview && state.inferred()?.version_added.is_false() {
        let exercised = state
            .versions()?
            .iter()
            .any(|(version, verdict)| version.is_preview() && verdict.is_known());
        if !exercised {
            return Err(state.skip(SkipKind::PreviewSupport, "preview support not tested"));
        }
    }
    Ok(Flow::Continue(state))
}

fn merge_versions<'a>(mut state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    let index = state.default_index()?;
    let inferred = state.inferred()?.clone();
    let current = &mut state.statements[index];

    if inferred.version_added.is_false() {
        if current.is_partial() {
            return Err(state.skip(
                SkipKind::PartialImplementation,
                "negative evidence against a partial implementation",
            ));
        }
        if !current.version_added.is_false() || current.version_removed.is_some() {
            *current = Statement::new(false);
        }
        return Ok(Flow::Continue(state));
    }

    current.version_added = reconcile(&current.version_added, &inferred.version_added);
    if let Some(removed) = inferred.version_removed {
        current.version_removed = Some(removed);
    }
    Ok(Flow::Continue(state))
}

/// Only the merged default is checked; qualified statements pass through as stored
fn guard_exact<'a>(state: PairState<'a>, ctx: &UpdateContext<'a>) -> StageResult<'a> {
    if ctx.filters.exact_only && state.statements[state.default_index()?].has_range() {
        return Err(state.skip(SkipKind::NotExact, "inferred version is a range"));
    }
    Ok(Flow::Continue(state))
}

fn finalize<'a>(mut state: PairState<'a>, _ctx: &UpdateContext<'a>) -> StageResult<'a> {
    if state.statements.is_empty() {
        return Err(state.skip(SkipKind::NothingToWrite, "no statements"));
    }
    if state.statements == state.resolved {
        return Err(state.skip(SkipKind::Unchanged, "already up to date"));
    }
    state.write = Some(SupportValue::from_statements(std::mem::take(
        &mut state.statements,
    )));
    Ok(Flow::Continue(state))
}

/// Reconcile a stored version with an inferred one
///
/// Stored data wins while it agrees with the evidence; overlapping ranges
/// narrow to their intersection; otherwise the evidence wins.
#[must_use]
pub fn reconcile(current: &VersionValue, inferred: &VersionValue) -> VersionValue {
    match (current, inferred) {
        (c, i) if c == i => c.clone(),
        (VersionValue::Exact(c), VersionValue::Range(i)) if i.contains(c) => current.clone(),
        (VersionValue::Range(c), VersionValue::Range(i)) => match c.intersect(i) {
            Some(narrowed) => narrowed.into(),
            None => inferred.clone(),
        },
        _ => inferred.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compat_model::{Version, VersionRange};
    use pretty_assertions::assert_eq;

    fn value(s: &str) -> VersionValue {
        VersionValue::parse_text(s).unwrap()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn reconcile_keeps_exact_inside_range() {
        assert_eq!(reconcile(&value("92"), &value("≤92")), value("92"));
        assert_eq!(reconcile(&value("80"), &value("79> ≤83")), value("80"));
    }

    #[test]
    fn reconcile_narrows_ranges() {
        assert_eq!(reconcile(&value("≤80"), &value("78> ≤85")), value("78> ≤80"));
        assert_eq!(
            reconcile(&value("≤83"), &value("≤90")),
            VersionRange::up_to(v("83")).into()
        );
    }

    #[test]
    fn reconcile_evidence_wins_on_conflict() {
        assert_eq!(reconcile(&value("85"), &value("82> ≤83")), value("82> ≤83"));
        assert_eq!(reconcile(&value("≤70"), &value("80")), value("80"));
        assert_eq!(reconcile(&value("75> ≤85"), &value("80")), value("80"));
        assert_eq!(reconcile(&VersionValue::Preview, &value("90")), value("90"));
        assert_eq!(reconcile(&VersionValue::Flag(false), &value("≤90")), value("≤90"));
        assert_eq!(reconcile(&value("≤60"), &value("70> ≤80")), value("70> ≤80"));
    }

    #[test]
    fn stages_are_unique() {
        let mut names: Vec<_> = STAGES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STAGES.len());
    }
}
