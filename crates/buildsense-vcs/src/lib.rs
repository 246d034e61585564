//! # buildsense-vcs
//!
//! **Tier 2 (Adapters)**
//!
//! Commit collection from git and Perforce, and the per-file statistics the
//! commit sensor reports: total lines after the change and lines added,
//! deleted and modified by it.
//!
//! ## What belongs here
//! * Running `git` / `p4` and parsing their output
//! * Per-file change statistics
//! * Mapping commits to `Commit` records
//!
//! ## What does NOT belong here
//! * The diff algorithm itself (see `buildsense-diff`)
//! * Retry and fail-on-error policy (see `buildsense-sensor`)

pub mod git;
pub mod p4;

use buildsense_diff::{DiffCounts, diff_counts, split_lines};
use buildsense_tstamp::{TimestampAllocator, format_ms};
use buildsense_types::{SensorDataType, SensorRecord, keys};

/// How a file was touched by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
}

/// One file touched by a commit. Renames carry both paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFileChange {
    pub from_path: Option<String>,
    pub to_path: Option<String>,
    pub status: ChangeStatus,
}

impl CommitFileChange {
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            from_path: None,
            to_path: Some(path.into()),
            status: ChangeStatus::Added,
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            from_path: Some(path.into()),
            to_path: None,
            status: ChangeStatus::Deleted,
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            from_path: Some(path.clone()),
            to_path: Some(path),
            status: ChangeStatus::Modified,
        }
    }

    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_path: Some(from.into()),
            to_path: Some(to.into()),
            status: ChangeStatus::Renamed,
        }
    }

    /// Path reported for the change: the new path, or the old one for
    /// deletions.
    pub fn path(&self) -> &str {
        self.to_path
            .as_deref()
            .or(self.from_path.as_deref())
            .unwrap_or_default()
    }
}

/// A commit (git) or submitted changelist (Perforce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub author: String,
    /// Commit time in Unix milliseconds.
    pub time_ms: i64,
    pub message: String,
    pub files: Vec<CommitFileChange>,
}

/// Line statistics of one file in one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileChangeStats {
    /// Lines in the file after the commit; zero for deletions.
    pub total_lines: usize,
    pub counts: DiffCounts,
    /// Binary files are reported with zero counts and produce no record.
    pub binary: bool,
}

fn is_binary(content: &[u8]) -> bool {
    content.contains(&0)
}

/// Statistics for one file given its content before and after a commit.
///
/// `None` means the file does not exist on that side.
pub fn file_stats(old: Option<&[u8]>, new: Option<&[u8]>) -> FileChangeStats {
    if old.is_some_and(is_binary) || new.is_some_and(is_binary) {
        return FileChangeStats {
            binary: true,
            ..FileChangeStats::default()
        };
    }
    let old_text = old.map(String::from_utf8_lossy);
    let new_text = new.map(String::from_utf8_lossy);
    let old_lines = old_text.as_deref().map(split_lines);
    let new_lines = new_text.as_deref().map(split_lines);

    match (old_lines, new_lines) {
        (None, None) => FileChangeStats::default(),
        (None, Some(new)) => FileChangeStats {
            total_lines: new.len(),
            counts: DiffCounts {
                added: new.len(),
                ..DiffCounts::ZERO
            },
            binary: false,
        },
        (Some(old), None) => FileChangeStats {
            total_lines: 0,
            counts: DiffCounts {
                deleted: old.len(),
                ..DiffCounts::ZERO
            },
            binary: false,
        },
        (Some(old), Some(new)) => FileChangeStats {
            total_lines: new.len(),
            counts: diff_counts(&old, &new),
            binary: false,
        },
    }
}

/// One `Commit` record per text file of `commit`.
///
/// `Resource` is `prefix` followed by the file path. `Runtime` is the commit
/// time, and `Timestamp` a unique time derived from it.
pub fn commit_records(
    tool: &str,
    commit: &Commit,
    stats: &[(CommitFileChange, FileChangeStats)],
    prefix: &str,
    tstamps: &mut TimestampAllocator,
) -> Vec<SensorRecord> {
    stats
        .iter()
        .filter(|(_, s)| !s.binary)
        .map(|(change, s)| {
            let ts = tstamps.unique(commit.time_ms);
            SensorRecord::new(
                tool,
                SensorDataType::Commit,
                format_ms(ts),
                format!("{prefix}{}", change.path()),
            )
            .with(keys::RUNTIME, format_ms(commit.time_ms))
            .with(keys::commit::TOTAL_LINES, s.total_lines.to_string())
            .with(keys::commit::LINES_ADDED, s.counts.added.to_string())
            .with(keys::commit::LINES_DELETED, s.counts.deleted.to_string())
            .with(keys::commit::LINES_MODIFIED, s.counts.changed.to_string())
            .with(keys::commit::AUTHOR, commit.author.as_str())
            .with(keys::commit::COMMIT_ID, commit.id.as_str())
            .with(keys::commit::MESSAGE, commit.message.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_file_counts_every_line() {
        let s = file_stats(None, Some(b"a\nb\n\nc\n"));
        assert_eq!(s.total_lines, 4);
        assert_eq!(s.counts.added, 4);
    }

    #[test]
    fn deleted_file_has_zero_total() {
        let s = file_stats(Some(b"a\nb\n"), None);
        assert_eq!(s.total_lines, 0);
        assert_eq!(s.counts.deleted, 2);
        assert_eq!(s.counts.added, 0);
    }

    #[test]
    fn modified_file_uses_diff() {
        let s = file_stats(Some(b"a\nb\nc\n"), Some(b"a\nx\nc\nd\n"));
        assert_eq!(s.total_lines, 4);
        assert_eq!(
            s.counts,
            DiffCounts {
                added: 1,
                deleted: 0,
                changed: 1
            }
        );
    }

    #[test]
    fn nul_byte_marks_binary() {
        let s = file_stats(Some(b"\x89PNG\0\0"), Some(b"text"));
        assert!(s.binary);
        assert!(s.counts.is_zero());
    }

    #[test]
    fn records_skip_binary_files_and_prefix_paths() {
        let commit = Commit {
            id: "abc123".into(),
            author: "dev@example.com".into(),
            time_ms: 10_000,
            message: "Tweak".into(),
            files: vec![],
        };
        let stats = vec![
            (
                CommitFileChange::modified("src/a.rs"),
                file_stats(Some(b"x\n"), Some(b"y\n")),
            ),
            (
                CommitFileChange::added("logo.png"),
                file_stats(None, Some(b"\0")),
            ),
            (
                CommitFileChange::renamed("old.rs", "new.rs"),
                file_stats(Some(b"x\n"), Some(b"x\n")),
            ),
        ];
        let mut tstamps = TimestampAllocator::new();
        let records = commit_records("git", &commit, &stats, "repo/", &mut tstamps);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].resource(), Some("repo/src/a.rs"));
        assert_eq!(records[0].get(keys::commit::LINES_MODIFIED), Some("1"));
        assert_eq!(records[1].resource(), Some("repo/new.rs"));
        assert_eq!(records[1].timestamp(), Some("1970-01-01T00:00:10.001Z"));
        assert_eq!(records[1].get(keys::RUNTIME), Some("1970-01-01T00:00:10.000Z"));
        assert!(records.iter().all(SensorRecord::is_valid));
    }

    #[test]
    fn deleted_change_reports_old_path() {
        assert_eq!(CommitFileChange::deleted("gone.txt").path(), "gone.txt");
    }
}
