//! git adapter.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::{ChangeStatus, Commit, CommitFileChange, FileChangeStats, file_stats};

pub const TOOL: &str = "git";

/// Marks the header line of each commit in `git log` output.
const HEADER_MARK: char = '\u{1e}';

/// Create a `Command` for git with process-environment isolation.
///
/// Strips `GIT_DIR` and `GIT_WORK_TREE` so that inherited environment
/// variables cannot override the explicit `-C` path used by all
/// functions in this module.
fn git_cmd() -> Command {
    let mut cmd = Command::new("git");
    cmd.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
    cmd
}

pub fn git_available() -> bool {
    git_cmd()
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn repo_root(path: &Path) -> Option<PathBuf> {
    let output = git_cmd()
        .arg("-C")
        .arg(path)
        .arg("rev-parse")
        .arg("--show-toplevel")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// A commit plus the parent its files are compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    pub commit: Commit,
    /// First parent; `None` for a root commit.
    pub parent: Option<String>,
}

/// Parse one `--name-status` line.
pub fn parse_name_status(line: &str) -> Option<CommitFileChange> {
    let mut parts = line.split('\t');
    let code = parts.next()?.trim();
    let first = parts.next()?.to_string();
    let second = parts.next().map(str::to_string);
    match code.chars().next()? {
        'A' | 'C' => Some(CommitFileChange::added(second.unwrap_or(first))),
        'D' => Some(CommitFileChange::deleted(first)),
        'M' | 'T' => Some(CommitFileChange::modified(first)),
        'R' => Some(CommitFileChange::renamed(first, second?)),
        other => {
            debug!(status = %other, path = %first, "ignoring change status");
            None
        }
    }
}

/// Parse `git log --name-status` output written with [`LOG_FORMAT`].
pub fn parse_log(output: &str) -> Vec<GitCommit> {
    let mut commits = Vec::new();
    let mut current: Option<GitCommit> = None;
    for line in output.lines() {
        if let Some(header) = line.strip_prefix(HEADER_MARK) {
            if let Some(done) = current.take() {
                commits.push(done);
            }
            current = Some(parse_header(header));
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if let Some(c) = current.as_mut()
            && let Some(change) = parse_name_status(line)
        {
            c.commit.files.push(change);
        }
    }
    if let Some(done) = current.take() {
        commits.push(done);
    }
    commits
}

/// `%x1e%H|%P|%ct|%ae|%s`
pub const LOG_FORMAT: &str = "--pretty=format:%x1e%H|%P|%ct|%ae|%s";

fn parse_header(header: &str) -> GitCommit {
    let mut parts = header.splitn(5, '|');
    let id = parts.next().unwrap_or("").to_string();
    let parent = parts
        .next()
        .and_then(|p| p.split_whitespace().next())
        .map(str::to_string);
    let secs = parts.next().unwrap_or("0").parse::<i64>().unwrap_or(0);
    let author = parts.next().unwrap_or("").to_string();
    let message = parts.next().unwrap_or("").to_string();
    GitCommit {
        commit: Commit {
            id,
            author,
            time_ms: secs.saturating_mul(1000),
            message,
            files: Vec::new(),
        },
        parent,
    }
}

/// Commits reachable in `range` (all of history when `None`), newest first.
pub fn collect_commits(
    repo_root: &Path,
    range: Option<&str>,
    max_commits: Option<usize>,
) -> Result<Vec<GitCommit>> {
    let mut cmd = git_cmd();
    cmd.arg("-C")
        .arg(repo_root)
        .args(["-c", "core.quotepath=off"])
        .args(["log", "--name-status", "-M", "--no-merges", LOG_FORMAT]);
    if let Some(n) = max_commits {
        cmd.arg(format!("--max-count={n}"));
    }
    if let Some(r) = range {
        cmd.arg(r);
    }
    // Paths are printed unquoted, so the output may hold non-UTF-8 names.
    let output = cmd
        .stderr(Stdio::piped())
        .output()
        .context("Failed to run git log")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git log failed: {}", stderr.trim());
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let commits = parse_log(&text);
    debug!(commits = commits.len(), "collected git history");
    Ok(commits)
}

/// Content of `path` at `rev`.
pub fn show_file(repo_root: &Path, rev: &str, path: &str) -> Result<Vec<u8>> {
    let output = git_cmd()
        .arg("-C")
        .arg(repo_root)
        .arg("show")
        .arg(format!("{rev}:{path}"))
        .stderr(Stdio::piped())
        .output()
        .context("Failed to run git show")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git show {rev}:{path} failed: {}", stderr.trim());
    }
    Ok(output.stdout)
}

/// Per-file statistics for every file of `commit`.
///
/// Files whose names did not decode as UTF-8 cannot be passed back to
/// `git show`; they are flagged binary and left out of the records.
pub fn commit_file_stats(
    repo_root: &Path,
    commit: &GitCommit,
) -> Result<Vec<(CommitFileChange, FileChangeStats)>> {
    let mut out = Vec::with_capacity(commit.commit.files.len());
    for change in &commit.commit.files {
        let undecodable = [&change.from_path, &change.to_path]
            .into_iter()
            .flatten()
            .any(|p| p.contains(char::REPLACEMENT_CHARACTER));
        if undecodable {
            warn!(commit = %commit.commit.id, "skipping file with non-UTF-8 name");
            let stats = FileChangeStats {
                binary: true,
                ..FileChangeStats::default()
            };
            out.push((change.clone(), stats));
            continue;
        }
        let old = match (&commit.parent, &change.from_path, change.status) {
            (_, _, ChangeStatus::Added) | (None, _, _) | (_, None, _) => None,
            (Some(parent), Some(from), _) => Some(show_file(repo_root, parent, from)?),
        };
        let new = match (&change.to_path, change.status) {
            (_, ChangeStatus::Deleted) | (None, _) => None,
            (Some(to), _) => Some(show_file(repo_root, &commit.commit.id, to)?),
        };
        out.push((change.clone(), file_stats(old.as_deref(), new.as_deref())));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\u{1e}c2|c1|1700000100|dev@example.com|Rename and edit
R087\tsrc/old.rs\tsrc/new.rs
M\tREADME.md
D\tdocs/gone.md

\u{1e}c1||1700000000|dev@example.com|Initial | with pipe
A\tREADME.md
A\tsrc/old.rs
";

    #[test]
    fn log_parses_headers_and_files() {
        let commits = parse_log(LOG);
        assert_eq!(commits.len(), 2);

        let head = &commits[0];
        assert_eq!(head.commit.id, "c2");
        assert_eq!(head.parent.as_deref(), Some("c1"));
        assert_eq!(head.commit.time_ms, 1_700_000_100_000);
        assert_eq!(
            head.commit.files,
            vec![
                CommitFileChange::renamed("src/old.rs", "src/new.rs"),
                CommitFileChange::modified("README.md"),
                CommitFileChange::deleted("docs/gone.md"),
            ]
        );

        let root = &commits[1];
        assert_eq!(root.parent, None);
        assert_eq!(root.commit.message, "Initial | with pipe");
        assert_eq!(root.commit.files.len(), 2);
    }

    #[test]
    fn copy_counts_as_addition_of_target() {
        assert_eq!(
            parse_name_status("C100\ta.rs\tb.rs"),
            Some(CommitFileChange::added("b.rs"))
        );
        assert_eq!(parse_name_status("X\tweird"), None);
        assert_eq!(parse_name_status(""), None);
    }

    #[test]
    fn repo_root_of_plain_directory_is_none() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("not-a-repo");
        std::fs::create_dir_all(&sub).unwrap();
        // A tempdir may itself live inside a repository; only assert when it
        // does not.
        if repo_root(dir.path()).is_none() {
            assert!(repo_root(&sub).is_none());
        }
    }
}
