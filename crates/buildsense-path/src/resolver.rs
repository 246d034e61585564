//! Class name to source file resolution by path-suffix matching.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use tracing::debug;

use crate::{ends_with_segments, normalize_slashes};

const SOURCE_EXT: &str = ".java";

/// Outcome of resolving one dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Unique(&'a str),
    /// Every matching path, in registration order.
    Ambiguous(Vec<&'a str>),
    NotFound,
}

impl<'a> Resolution<'a> {
    /// First match in registration order, if any.
    pub fn first(&self) -> Option<&'a str> {
        match self {
            Resolution::Unique(p) => Some(*p),
            Resolution::Ambiguous(ps) => ps.first().copied(),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Resolution::NotFound)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    original: String,
    canonical: String,
}

/// Known source files, searched by dotted class name.
#[derive(Debug, Clone, Default)]
pub struct ClassPathResolver {
    files: Vec<Entry>,
    dirs: Vec<Entry>,
}

impl ClassPathResolver {
    /// Register `paths` as given. Paths without the source extension are
    /// ignored; nothing is read from disk.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut resolver = Self::default();
        for path in paths {
            resolver.add_file(path.into());
        }
        resolver
    }

    /// Register source files found under `roots`.
    ///
    /// A root that is a file (or any path ending in the source extension) is
    /// registered directly; a directory is walked. Walk results are sorted so
    /// scan order does not depend on the filesystem.
    pub fn from_roots<P: AsRef<Path>>(roots: &[P]) -> Result<Self> {
        let mut resolver = Self::default();
        for root in roots {
            let root = root.as_ref();
            let spelled = root.to_string_lossy().into_owned();
            if root.is_file() || spelled.ends_with(SOURCE_EXT) {
                resolver.add_file(spelled);
            } else if root.is_dir() {
                for file in files_with_extension(root, SOURCE_EXT)? {
                    resolver.add_file(file.to_string_lossy().into_owned());
                }
            } else {
                debug!(root = %root.display(), "source root does not exist, skipping");
            }
        }
        debug!(files = resolver.len(), "class path resolver ready");
        Ok(resolver)
    }

    fn add_file(&mut self, original: String) {
        if !original.ends_with(SOURCE_EXT) {
            return;
        }
        let canonical = normalize_slashes(&original);
        if let Some(cut) = canonical.rfind('/') {
            let dir_canonical = canonical[..cut].to_string();
            if !self.dirs.iter().any(|d| d.canonical == dir_canonical) {
                let dir_original = original[..cut].to_string();
                self.dirs.push(Entry {
                    original: dir_original,
                    canonical: dir_canonical,
                });
            }
        }
        self.files.push(Entry {
            original,
            canonical,
        });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Registered paths in original spelling.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|e| e.original.as_str())
    }

    /// Every registered file matching `name`.
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        let Some(fragment) = class_fragment(name) else {
            return Resolution::NotFound;
        };
        let needle = format!("{fragment}{SOURCE_EXT}");
        let mut hits: Vec<&str> = self
            .files
            .iter()
            .filter(|e| ends_with_segments(&e.canonical, &needle))
            .map(|e| e.original.as_str())
            .collect();
        match hits.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Unique(hits.remove(0)),
            n => {
                debug!(name, matches = n, "ambiguous class path");
                Resolution::Ambiguous(hits)
            }
        }
    }

    /// First registered file matching `name`, in registration order.
    pub fn resolve_first(&self, name: &str) -> Option<&str> {
        let fragment = class_fragment(name)?;
        let needle = format!("{fragment}{SOURCE_EXT}");
        self.files
            .iter()
            .find(|e| ends_with_segments(&e.canonical, &needle))
            .map(|e| e.original.as_str())
    }

    /// Directory holding `package`, matched against parents of the
    /// registered files.
    pub fn package_path(&self, package: &str) -> Option<&str> {
        let fragment = class_fragment(package)?;
        self.dirs
            .iter()
            .find(|d| ends_with_segments(&d.canonical, &fragment))
            .map(|d| d.original.as_str())
    }
}

/// Dotted name to `/`-separated fragment, without extension.
///
/// Text from the first `$` is dropped so nested classes map to their
/// enclosing file. Returns `None` when nothing is left.
///
/// ```
/// use buildsense_path::class_fragment;
///
/// assert_eq!(class_fragment("org.foo.Bar$Inner").as_deref(), Some("org/foo/Bar"));
/// assert_eq!(class_fragment("$Anon"), None);
/// ```
pub fn class_fragment(name: &str) -> Option<String> {
    let outer = name.split('$').next().unwrap_or_default().trim();
    if outer.is_empty() {
        return None;
    }
    Some(outer.replace('.', "/"))
}

/// Direct mapping of a class name under a single source root.
///
/// No filesystem access: the returned path need not exist.
pub fn source_path_for(root: &Path, name: &str) -> String {
    let mut path = PathBuf::from(root);
    let outer = name.split('$').next().unwrap_or_default();
    let mut parts = outer.split('.').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_some() {
            path.push(part);
        } else {
            path.push(format!("{part}{SOURCE_EXT}"));
        }
    }
    path.to_string_lossy().into_owned()
}

/// Files under `root` whose name ends with `ext`, sorted.
///
/// Honors `.gitignore`; hidden files are included.
pub fn files_with_extension(root: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false);
    builder.git_ignore(true);
    builder.git_exclude(true);
    builder.follow_links(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if entry.path().to_string_lossy().ends_with(ext) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassPathResolver {
        ClassPathResolver::new([
            "/src/foo/Bar.java",
            "/src/foo/baz/Bar.java",
            "/src/README.md",
        ])
    }

    #[test]
    fn non_source_paths_are_dropped() {
        assert_eq!(sample().len(), 2);
    }

    #[test]
    fn nested_class_resolves_to_outer_file() {
        assert_eq!(
            sample().resolve("foo.baz.Bar$1"),
            Resolution::Unique("/src/foo/baz/Bar.java")
        );
    }

    #[test]
    fn short_name_matching_several_files_is_ambiguous() {
        let resolver = sample();
        let r = resolver.resolve("Bar");
        assert_eq!(
            r,
            Resolution::Ambiguous(vec!["/src/foo/Bar.java", "/src/foo/baz/Bar.java"])
        );
        assert_eq!(r.first(), Some("/src/foo/Bar.java"));
        assert_eq!(sample().resolve_first("Bar"), Some("/src/foo/Bar.java"));
    }

    #[test]
    fn windows_paths_keep_original_spelling() {
        let r = ClassPathResolver::new([r"C:\work\src\org\Foo.java"]);
        assert_eq!(r.resolve_first("org.Foo"), Some(r"C:\work\src\org\Foo.java"));
        assert_eq!(r.package_path("org"), Some(r"C:\work\src\org"));
    }

    #[test]
    fn package_path_matches_parent_directory() {
        assert_eq!(sample().package_path("foo.baz"), Some("/src/foo/baz"));
        assert_eq!(sample().package_path("qux"), None);
    }

    #[test]
    fn empty_name_is_not_found() {
        assert_eq!(sample().resolve(""), Resolution::NotFound);
        assert_eq!(sample().resolve_first("$x"), None);
    }

    #[test]
    fn source_path_for_joins_segments() {
        let p = source_path_for(Path::new("src"), "org.foo.BarTest");
        let expected: PathBuf = ["src", "org", "foo", "BarTest.java"].iter().collect();
        assert_eq!(p, expected.to_string_lossy());
    }
}
