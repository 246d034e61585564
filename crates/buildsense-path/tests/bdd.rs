//! BDD-style scenario tests for class path resolution.

use buildsense_path::{ClassPathResolver, Resolution, normalize_rel_path, normalize_slashes};

// ── Suffix resolution ────────────────────────────────────────────

mod resolve_scenarios {
    use super::*;

    fn candidates() -> ClassPathResolver {
        ClassPathResolver::new(["/src/foo/Bar.java", "/src/foo/baz/Bar.java"])
    }

    #[test]
    fn given_fully_qualified_name_then_matching_file() {
        assert_eq!(
            candidates().resolve("foo.baz.Bar"),
            Resolution::Unique("/src/foo/baz/Bar.java")
        );
    }

    #[test]
    fn given_unknown_class_then_not_found() {
        assert_eq!(candidates().resolve("foo.Qux"), Resolution::NotFound);
        assert_eq!(candidates().resolve_first("foo.Qux"), None);
    }

    #[test]
    fn given_partial_segment_then_no_match() {
        let r = ClassPathResolver::new(["/src/xfoo/Bar.java"]);
        assert_eq!(r.resolve("foo.Bar"), Resolution::NotFound);
    }

    #[test]
    fn given_duplicate_suffix_then_every_match_reported() {
        let r = ClassPathResolver::new([
            "/a/src/org/Util.java",
            "/b/src/org/Util.java",
            "/c/src/org/Other.java",
        ]);
        match r.resolve("org.Util") {
            Resolution::Ambiguous(all) => {
                assert_eq!(all, vec!["/a/src/org/Util.java", "/b/src/org/Util.java"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn given_no_candidates_then_not_found() {
        let r = ClassPathResolver::new(Vec::<String>::new());
        assert!(r.is_empty());
        assert!(!r.resolve("a.B").is_found());
    }
}

// ── Source roots on disk ─────────────────────────────────────────

mod root_scenarios {
    use super::*;
    use std::fs;

    #[test]
    fn given_source_directory_then_java_files_registered() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("org").join("example");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("AppTest.java"), "class AppTest {}").unwrap();
        fs::write(pkg.join("notes.txt"), "ignored").unwrap();

        let r = ClassPathResolver::from_roots(&[dir.path()]).unwrap();
        assert_eq!(r.len(), 1);
        let hit = r.resolve_first("org.example.AppTest").unwrap();
        assert!(normalize_slashes(hit).ends_with("org/example/AppTest.java"));
    }

    #[test]
    fn given_explicit_missing_java_path_then_registered_anyway() {
        let r = ClassPathResolver::from_roots(&["gen/org/Missing.java"]).unwrap();
        assert_eq!(r.resolve_first("org.Missing"), Some("gen/org/Missing.java"));
    }

    #[test]
    fn given_missing_directory_then_empty_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let r = ClassPathResolver::from_roots(&[gone]).unwrap();
        assert!(r.is_empty());
    }
}

// ── Normalization ────────────────────────────────────────────────

mod normalize_scenarios {
    use super::*;

    #[test]
    fn given_windows_backslash_path_then_forward_slashes() {
        assert_eq!(normalize_slashes(r"src\org\A.java"), "src/org/A.java");
    }

    #[test]
    fn given_dot_slash_prefix_then_stripped_once() {
        assert_eq!(normalize_rel_path("././A.java"), "./A.java");
    }
}
