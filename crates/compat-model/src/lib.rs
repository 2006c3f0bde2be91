//! Compatibility Model
//!
//! Value types shared by the evidence and update stages.
//!
//! # Core Concepts
//!
//! - [`Verdict`]: tri-state test outcome, reduced with [`combine`]
//! - [`Version`]: ordered browser release identifier
//! - [`VersionRange`]: uncertain boundary, encoded with [`range::encode`]
//! - [`FeaturePath`]: dotted address of a feature
//! - [`Statement`] / [`SupportValue`]: per-browser support claims
//! - [`CompatTree`]: the compatibility database, mutated in place
//! - [`BrowserCatalog`]: known browsers and releases
//!
//! # Example
//!
//! ```rust,ignore
//! use compat_model::{range, Version};
//!
//! let lower: Version = "82".parse()?;
//! let upper: Version = "84".parse()?;
//! assert_eq!(range::encode(&lower, &upper), "82> ≤84");
//! ```

#![warn(unreachable_pub)]

mod catalog;
mod error;
mod path;
pub mod range;
mod statement;
mod tree;
mod verdict;
mod version;

// Re-exports
pub use catalog::{BrowserCatalog, BrowserInfo};
pub use error::ModelError;
pub use path::FeaturePath;
pub use range::VersionRange;
pub use statement::{decode_support, Statement, SupportMap, SupportValue, VersionValue, MIRROR};
pub use tree::{CompatTree, COMPAT_KEY, SUPPORT_KEY};
pub use verdict::{combine, Verdict};
pub use version::{Version, PREVIEW};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statement_in_tree_round_trip() {
        let mut tree = CompatTree::new(json!({
            "api": {"Foo": {"__compat": {"support": {"chrome": {"version_added": null}}}}}
        }));
        let path: FeaturePath = "api.Foo".parse().unwrap();

        let lower: Version = "82".parse().unwrap();
        let upper: Version = "83".parse().unwrap();
        let statement = Statement::new(VersionRange::new(lower, upper));
        tree.set_support(&path, "chrome", &SupportValue::Single(statement.clone()))
            .unwrap();

        assert_eq!(
            tree.as_value()["api"]["Foo"]["__compat"]["support"]["chrome"],
            json!({"version_added": "82> ≤83"})
        );
        let support = tree.support(&path).unwrap().unwrap();
        assert_eq!(support["chrome"], SupportValue::Single(statement));
    }

    #[test]
    fn verdict_and_catalog_integration() {
        let catalog = BrowserCatalog::new().with_browser("chrome", BrowserInfo::new("Chrome", &["82", "83"]));
        let seeded: Vec<(Version, Verdict)> = catalog
            .get("chrome")
            .unwrap()
            .versions()
            .into_iter()
            .map(|v| (v, Verdict::default()))
            .collect();
        assert!(seeded.iter().all(|(_, verdict)| !verdict.is_known()));
        assert_eq!(combine(seeded.iter().map(|(_, v)| *v)), Verdict::Unknown);
    }
}
