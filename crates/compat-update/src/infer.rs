//! Range inference
//!
//! Turns one browser's ascending `version → verdict` series into the minimal
//! list of `{version_added, version_removed}` statements consistent with every
//! known observation. A boundary is exact only when the evidence pins it down;
//! otherwise it is range-encoded between the last known release and this one.

use compat_evidence::VersionMap;
use compat_model::{Statement, Verdict, Version, VersionRange, VersionValue};

/// Infer support statements from a version series
///
/// # Examples
/// - `{82: ?, 83: S, 84: S}` → `[{version_added: "≤83"}]`
/// - `{82: S, 83: ?, 84: U}` → `[{version_added: "82", version_removed: "82> ≤84"}]`
/// - `{82: U, 83: ?, 84: S}` → `[{version_added: "82> ≤84"}]`
#[must_use]
pub fn infer(versions: &VersionMap) -> Vec<Statement> {
    let mut statements: Vec<Statement> = Vec::new();
    let mut last_known: Option<(&Version, Verdict)> = None;
    let mut skipped = false;

    for (version, verdict) in versions {
        match verdict {
            Verdict::Supported => {
                let added = added_boundary(last_known, skipped, version);
                match statements.last_mut() {
                    None => statements.push(Statement::new(added)),
                    Some(last) if last.version_added.is_false() => last.version_added = added,
                    Some(last) if last.version_removed.is_some() => {
                        statements.push(Statement::new(added));
                    }
                    Some(_) => {}
                }
            }
            Verdict::Unsupported => match statements.last_mut() {
                None => statements.push(Statement::new(false)),
                Some(last) if !last.version_added.is_false() && last.version_removed.is_none() => {
                    last.version_removed = Some(removed_boundary(last_known, skipped, version));
                }
                Some(_) => {}
            },
            Verdict::Unknown => {
                skipped = true;
                continue;
            }
        }

        last_known = Some((version, *verdict));
        skipped = false;
    }

    statements
}

fn added_boundary(
    last_known: Option<(&Version, Verdict)>,
    skipped: bool,
    version: &Version,
) -> VersionValue {
    match last_known {
        None if !skipped => VersionValue::Exact(version.clone()),
        None => VersionRange::up_to(version.clone()).into(),
        Some((_, Verdict::Supported)) if !skipped => VersionValue::Exact(version.clone()),
        Some((known, _)) => VersionRange::new(known.clone(), version.clone()).into(),
    }
}

fn removed_boundary(
    last_known: Option<(&Version, Verdict)>,
    skipped: bool,
    version: &Version,
) -> VersionValue {
    match last_known {
        Some((known, _)) if skipped => VersionRange::new(known.clone(), version.clone()).into(),
        _ => VersionValue::Exact(version.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn series(cells: &[(&str, Option<bool>)]) -> VersionMap {
        cells
            .iter()
            .map(|(v, verdict)| (v.parse().unwrap(), Verdict::from_option(*verdict)))
            .collect()
    }

    fn inferred(cells: &[(&str, Option<bool>)]) -> Value {
        serde_json::to_value(infer(&series(cells))).unwrap()
    }

    #[test]
    fn infer_unknown_then_supported() {
        assert_eq!(
            inferred(&[("82", None), ("83", Some(true)), ("84", Some(true)), ("85", Some(true))]),
            json!([{"version_added": "≤83"}])
        );
    }

    #[test]
    fn infer_removed_after_gap() {
        assert_eq!(
            inferred(&[("82", Some(true)), ("83", None), ("84", Some(false))]),
            json!([{"version_added": "82", "version_removed": "82> ≤84"}])
        );
    }

    #[test]
    fn infer_added_after_gap() {
        assert_eq!(
            inferred(&[("82", Some(false)), ("83", None), ("84", Some(true))]),
            json!([{"version_added": "82> ≤84"}])
        );
    }

    #[test]
    fn infer_added_after_adjacent_unsupported() {
        assert_eq!(
            inferred(&[("81", None), ("82", Some(false)), ("83", Some(true)), ("84", None)]),
            json!([{"version_added": "82> ≤83"}])
        );
    }

    #[test]
    fn infer_first_release_supported_is_exact() {
        assert_eq!(
            inferred(&[("1", Some(true)), ("2", None), ("3", Some(true))]),
            json!([{"version_added": "1"}])
        );
    }

    #[test]
    fn infer_removed_adjacent_is_exact() {
        assert_eq!(
            inferred(&[("10", Some(true)), ("11", Some(false)), ("12", Some(false))]),
            json!([{"version_added": "10", "version_removed": "11"}])
        );
    }

    #[test]
    fn infer_never_supported() {
        assert_eq!(
            inferred(&[("1", None), ("2", Some(false)), ("3", None), ("4", Some(false))]),
            json!([{"version_added": false}])
        );
    }

    #[test]
    fn infer_support_returns_after_removal() {
        assert_eq!(
            inferred(&[
                ("10", Some(true)),
                ("11", Some(false)),
                ("12", None),
                ("13", Some(true)),
            ]),
            json!([
                {"version_added": "10", "version_removed": "11"},
                {"version_added": "11> ≤13"}
            ])
        );
    }

    #[test]
    fn infer_all_unknown_is_empty() {
        assert!(infer(&series(&[("1", None), ("2", None)])).is_empty());
        assert!(infer(&VersionMap::new()).is_empty());
    }

    #[test]
    fn infer_orders_numerically() {
        // 9 sorts before 10 regardless of insertion order.
        assert_eq!(
            inferred(&[("10", Some(true)), ("9", Some(false))]),
            json!([{"version_added": "9> ≤10"}])
        );
    }

    fn any_cell() -> impl Strategy<Value = Option<bool>> {
        prop_oneof![Just(Some(true)), Just(Some(false)), Just(None)]
    }

    proptest! {
        #[test]
        fn prop_never_emits_null(cells in proptest::collection::vec(any_cell(), 0..30)) {
            let versions: VersionMap = cells
                .iter()
                .enumerate()
                .map(|(i, c)| ((i + 1).to_string().parse().unwrap(), Verdict::from_option(*c)))
                .collect();
            for statement in infer(&versions) {
                prop_assert_ne!(statement.version_added, VersionValue::Null);
                prop_assert_ne!(statement.version_removed, Some(VersionValue::Null));
            }
        }

        #[test]
        fn prop_unknown_cells_do_not_add_statements(
            cells in proptest::collection::vec(any_cell(), 1..30)
        ) {
            let known: Vec<_> = cells.iter().filter(|c| c.is_some()).collect();
            let versions: VersionMap = cells
                .iter()
                .enumerate()
                .map(|(i, c)| ((i + 1).to_string().parse().unwrap(), Verdict::from_option(*c)))
                .collect();
            let statements = infer(&versions);
            prop_assert_eq!(statements.is_empty(), known.is_empty());
            prop_assert!(statements.len() <= known.len());
        }
    }
}
