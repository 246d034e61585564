//! # buildsense-path
//!
//! **Tier 1 (Utilities)**
//!
//! Path normalization and the class-name to source-file resolver used by the
//! report parsers to fill the `Resource` key.
//!
//! ## What belongs here
//! * Separator normalization
//! * Suffix matching of dotted names against known source files
//! * Source root traversal
//!
//! ## What does NOT belong here
//! * Report parsing
//! * VCS paths (see `buildsense-vcs`)

mod resolver;

pub use resolver::{
    ClassPathResolver, Resolution, class_fragment, files_with_extension, source_path_for,
};

/// Normalize path separators to `/`.
///
/// # Examples
///
/// ```
/// use buildsense_path::normalize_slashes;
///
/// assert_eq!(normalize_slashes(r"foo\bar\Baz.java"), "foo/bar/Baz.java");
/// assert_eq!(normalize_slashes("already/fine"), "already/fine");
/// ```
#[must_use]
pub fn normalize_slashes(path: &str) -> String {
    if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Normalize a relative path for matching:
/// - converts `\` to `/`
/// - strips one leading `./`
///
/// # Examples
///
/// ```
/// use buildsense_path::normalize_rel_path;
///
/// assert_eq!(normalize_rel_path("./src/Main.java"), "src/Main.java");
/// assert_eq!(normalize_rel_path(r".\src\Main.java"), "src/Main.java");
/// ```
#[must_use]
pub fn normalize_rel_path(path: &str) -> String {
    let normalized = normalize_slashes(path);
    if let Some(stripped) = normalized.strip_prefix("./") {
        stripped.to_string()
    } else {
        normalized
    }
}

/// True when `path` ends with `suffix` and the match starts on a segment
/// boundary. Both sides must already use `/`.
#[must_use]
pub fn ends_with_segments(path: &str, suffix: &str) -> bool {
    if suffix.is_empty() || !path.ends_with(suffix) {
        return false;
    }
    let head = &path[..path.len() - suffix.len()];
    head.is_empty() || head.ends_with('/') || suffix.starts_with('/')
}
