//! Property-based tests for normalization and resolution invariants.

use buildsense_path::{
    ClassPathResolver, Resolution, class_fragment, normalize_rel_path, normalize_slashes,
};
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────

fn arb_path() -> impl Strategy<Value = String> {
    "\\PC{0,120}"
}

fn arb_segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..5)
}

// ── Normalization ────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn no_backslashes_in_output(path in arb_path()) {
        prop_assert!(!normalize_slashes(&path).contains('\\'));
        prop_assert!(!normalize_rel_path(&path).contains('\\'));
    }

    #[test]
    fn normalize_slashes_idempotent(path in arb_path()) {
        let once = normalize_slashes(&path);
        prop_assert_eq!(normalize_slashes(&once), once);
    }
}

// ── Resolution ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn registered_class_always_resolves(pkg in arb_segments(), class in "[A-Z][a-zA-Z]{0,8}") {
        let name = format!("{}.{class}", pkg.join("."));
        let path = format!("/root/src/{}/{class}.java", pkg.join("/"));
        let r = ClassPathResolver::new([path.clone()]);
        prop_assert_eq!(r.resolve(&name), Resolution::Unique(path.as_str()));
    }

    #[test]
    fn resolve_first_agrees_with_resolve(
        files in prop::collection::vec(arb_segments(), 0..8),
        query in arb_segments(),
    ) {
        let paths: Vec<String> = files.iter().map(|s| format!("/{}.java", s.join("/"))).collect();
        let r = ClassPathResolver::new(paths);
        let name = query.join(".");
        prop_assert_eq!(r.resolve(&name).first(), r.resolve_first(&name));
    }

    #[test]
    fn nested_suffix_is_ignored(name in "[a-z]{1,6}(\\.[a-z]{1,6}){0,3}", inner in "[A-Za-z0-9]{1,5}") {
        prop_assert_eq!(class_fragment(&format!("{name}${inner}")), class_fragment(&name));
    }
}
