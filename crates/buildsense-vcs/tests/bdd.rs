//! BDD-style scenario tests for buildsense-vcs.
//!
//! Scenarios that need a real repository skip themselves when `git` is not
//! on PATH.

use std::path::Path;
use std::process::Command;

use buildsense_tstamp::TimestampAllocator;
use buildsense_types::keys;
use buildsense_vcs::git::{self, GitCommit};
use buildsense_vcs::{ChangeStatus, CommitFileChange, commit_records};

// ── Helpers ──────────────────────────────────────────────────────────

fn git_in(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .current_dir(dir);
    cmd
}

fn run(dir: &Path, args: &[&str]) -> bool {
    git_in(dir)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn commit_all(dir: &Path, message: &str, epoch: i64) -> bool {
    let date = format!("@{epoch} +0000");
    run(dir, &["add", "-A"])
        && git_in(dir)
            .args(["commit", "-q", "-m", message])
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
}

/// Repository with three commits:
/// 1. add `src/Main.java` (3 lines) and `logo.bin`
/// 2. edit one line and append one line of `src/Main.java`
/// 3. delete `logo.bin`
fn make_repo() -> Option<tempfile::TempDir> {
    if !git::git_available() {
        return None;
    }
    let dir = tempfile::tempdir().ok()?;
    let root = dir.path();
    if !run(root, &["init", "-q"]) {
        return None;
    }
    run(root, &["config", "user.email", "dev@example.com"]);
    run(root, &["config", "user.name", "Dev"]);
    run(root, &["config", "commit.gpgsign", "false"]);

    std::fs::create_dir_all(root.join("src")).ok()?;
    std::fs::write(root.join("src/Main.java"), "class Main {\n  int x;\n}\n").ok()?;
    std::fs::write(root.join("logo.bin"), b"\x89PNG\0\0\x01").ok()?;
    if !commit_all(root, "Initial import", 1_700_000_000) {
        return None;
    }

    std::fs::write(
        root.join("src/Main.java"),
        "class Main {\n  long x;\n}\n// end\n",
    )
    .ok()?;
    if !commit_all(root, "Widen field", 1_700_000_100) {
        return None;
    }

    std::fs::remove_file(root.join("logo.bin")).ok()?;
    if !commit_all(root, "Drop logo", 1_700_000_200) {
        return None;
    }
    Some(dir)
}

fn by_message<'a>(commits: &'a [GitCommit], message: &str) -> &'a GitCommit {
    commits
        .iter()
        .find(|c| c.commit.message == message)
        .unwrap_or_else(|| panic!("no commit {message:?}"))
}

// ── Scenario: history collection ─────────────────────────────────────

#[test]
fn given_repo_when_collecting_then_commits_are_newest_first() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].commit.message, "Drop logo");
    assert_eq!(commits[2].commit.message, "Initial import");
    assert_eq!(commits[2].parent, None);
    assert_eq!(commits[0].commit.author, "dev@example.com");
    assert_eq!(commits[1].commit.time_ms, 1_700_000_100_000);
}

#[test]
fn given_max_commits_when_collecting_then_history_is_truncated() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, Some(1)).unwrap();
    assert_eq!(commits.len(), 1);
}

#[test]
fn given_bad_range_when_collecting_then_error_names_git() {
    let Some(repo) = make_repo() else { return };
    let err = git::collect_commits(repo.path(), Some("no-such-branch"), None).unwrap_err();
    assert!(err.to_string().contains("git log failed"));
}

#[cfg(unix)]
#[test]
fn given_non_utf8_file_name_when_collecting_then_history_is_still_read() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let Some(repo) = make_repo() else { return };
    let name = OsStr::from_bytes(b"caf\xe9.txt");
    // Some filesystems refuse non-UTF-8 names.
    if std::fs::write(repo.path().join(name), "x\n").is_err() {
        return;
    }
    assert!(commit_all(repo.path(), "Latin-1 name", 1_700_000_300));

    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    assert_eq!(commits.len(), 4);
    let latest = by_message(&commits, "Latin-1 name");
    assert_eq!(latest.commit.files.len(), 1);
    assert_eq!(latest.commit.files[0].status, ChangeStatus::Added);
    let path = latest.commit.files[0].to_path.as_deref().unwrap();
    assert!(path.starts_with("caf") && path.ends_with(".txt"));

    let stats = git::commit_file_stats(repo.path(), latest).unwrap();
    assert_eq!(stats.len(), 1);
    assert!(stats[0].1.binary);
}

// ── Scenario: per-file statistics ────────────────────────────────────

#[test]
fn given_initial_commit_then_text_file_is_all_added_and_binary_flagged() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    let initial = by_message(&commits, "Initial import");
    let stats = git::commit_file_stats(repo.path(), initial).unwrap();

    let (_, main) = stats
        .iter()
        .find(|(c, _)| c.path() == "src/Main.java")
        .unwrap();
    assert_eq!(main.total_lines, 3);
    assert_eq!(main.counts.added, 3);

    let (_, logo) = stats.iter().find(|(c, _)| c.path() == "logo.bin").unwrap();
    assert!(logo.binary);
}

#[test]
fn given_edit_then_changed_and_added_lines_are_split() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    let edit = by_message(&commits, "Widen field");
    let stats = git::commit_file_stats(repo.path(), edit).unwrap();

    assert_eq!(stats.len(), 1);
    let (change, s) = &stats[0];
    assert_eq!(change, &CommitFileChange::modified("src/Main.java"));
    assert_eq!(s.total_lines, 4);
    assert_eq!(s.counts.changed, 1);
    assert_eq!(s.counts.added, 1);
    assert_eq!(s.counts.deleted, 0);
}

#[test]
fn given_binary_deletion_then_no_record_is_produced() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    let removal = by_message(&commits, "Drop logo");
    assert_eq!(removal.commit.files[0].status, ChangeStatus::Deleted);

    let stats = git::commit_file_stats(repo.path(), removal).unwrap();
    let mut tstamps = TimestampAllocator::new();
    let records = commit_records(git::TOOL, &removal.commit, &stats, "", &mut tstamps);
    assert!(records.is_empty());
}

// ── Scenario: commit records ─────────────────────────────────────────

#[test]
fn given_whole_history_then_records_carry_commit_metadata() {
    let Some(repo) = make_repo() else { return };
    let commits = git::collect_commits(repo.path(), None, None).unwrap();
    let mut tstamps = TimestampAllocator::new();
    let mut records = Vec::new();
    for c in &commits {
        let stats = git::commit_file_stats(repo.path(), c).unwrap();
        records.extend(commit_records(
            git::TOOL,
            &c.commit,
            &stats,
            "demo/",
            &mut tstamps,
        ));
    }
    // Only src/Main.java is text: added once and edited once.
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.resource() == Some("demo/src/Main.java")));
    assert!(records.iter().all(|r| r.is_valid()));
    let edit = records
        .iter()
        .find(|r| r.get(keys::commit::MESSAGE) == Some("Widen field"))
        .unwrap();
    assert_eq!(edit.get(keys::commit::LINES_MODIFIED), Some("1"));
    assert_eq!(edit.get(keys::commit::TOTAL_LINES), Some("4"));
    assert_eq!(edit.get(keys::RUNTIME), Some("2023-11-14T22:15:00.000Z"));
}
