//! Perforce adapter.
//!
//! Works from the text output of `p4 changes -t`, `p4 describe -s` and
//! `p4 diff2 -ds`, so only the `p4` command-line client is required.

use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use buildsense_diff::{DiffCounts, change_block, split_lines};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::{ChangeStatus, Commit, CommitFileChange, FileChangeStats};

pub const TOOL: &str = "Perforce";

/// `2008/07/14 12:34:56`, read as UTC.
const P4_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

/// One line of `p4 changes -t` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P4Change {
    pub number: u64,
    pub time_ms: i64,
    pub user: String,
    pub client: String,
    pub description: String,
}

/// A file entry of `p4 describe -s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedFile {
    pub depot_path: String,
    pub revision: u64,
    pub action: String,
}

impl DescribedFile {
    pub fn status(&self) -> ChangeStatus {
        match self.action.as_str() {
            "add" | "branch" | "import" | "move/add" => ChangeStatus::Added,
            "delete" | "move/delete" | "purge" | "archive" => ChangeStatus::Deleted,
            _ => ChangeStatus::Modified,
        }
    }

    pub fn to_change(&self) -> CommitFileChange {
        match self.status() {
            ChangeStatus::Added => CommitFileChange::added(self.depot_path.as_str()),
            ChangeStatus::Deleted => CommitFileChange::deleted(self.depot_path.as_str()),
            _ => CommitFileChange::modified(self.depot_path.as_str()),
        }
    }
}

fn parse_p4_time(date: &str, time: &str) -> Option<i64> {
    let dt = PrimitiveDateTime::parse(&format!("{date} {time}"), P4_TIME).ok()?;
    i64::try_from(dt.assume_utc().unix_timestamp_nanos() / 1_000_000).ok()
}

/// Parse `p4 changes -t` output, with or without `-l`.
///
/// Each change starts with a header line
/// `Change 1234 on 2008/07/14 12:34:56 by user@client`. With `-l` the full
/// description follows on tab-indented lines; without it a truncated
/// description is quoted at the end of the header (`'Fix the parser '`).
pub fn parse_changes(output: &str) -> Vec<P4Change> {
    let mut changes = Vec::new();
    // Description lines of the current change; `None` before the first
    // header or after an unreadable one.
    let mut body: Option<Vec<&str>> = None;
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix('\t') {
            if let Some(lines) = body.as_mut() {
                lines.push(rest.trim_end());
            }
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let ["Change", number, "on", date, time, "by", who, ..] = words.as_slice() else {
            continue;
        };
        finish_description(&mut changes, body.take());
        let (Ok(number), Some(time_ms)) = (number.parse::<u64>(), parse_p4_time(date, time))
        else {
            warn!(line, "unreadable p4 change line");
            continue;
        };
        let (user, client) = who.split_once('@').unwrap_or((*who, ""));
        let description = line
            .split_once('\'')
            .map(|(_, rest)| rest.trim_end().trim_end_matches('\''))
            .unwrap_or("")
            .to_string();
        changes.push(P4Change {
            number,
            time_ms,
            user: user.to_string(),
            client: client.to_string(),
            description,
        });
        body = Some(Vec::new());
    }
    finish_description(&mut changes, body);
    changes
}

/// Replace the last change's quoted description with its long form, if any.
fn finish_description(changes: &mut [P4Change], body: Option<Vec<&str>>) {
    let (Some(lines), Some(last)) = (body, changes.last_mut()) else {
        return;
    };
    let text = lines.join("\n");
    let text = text.trim_matches('\n');
    if !text.is_empty() {
        last.description = text.to_string();
    }
}

/// Affected files of `p4 describe -s` output:
/// `... //depot/project/Foo.java#2 edit`.
pub fn parse_describe_files(output: &str) -> Vec<DescribedFile> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("... ")?;
            let (spec, action) = rest.rsplit_once(' ')?;
            let (path, rev) = spec.rsplit_once('#')?;
            Some(DescribedFile {
                depot_path: path.to_string(),
                revision: rev.parse().ok()?,
                action: action.trim().to_string(),
            })
        })
        .collect()
}

/// Sum the summary lines of `p4 diff2 -ds`.
///
/// ```text
/// add 2 chunks 6 lines
/// deleted 0 chunks 0 lines
/// changed 3 chunks 8 / 10 lines
/// ```
///
/// A `changed` line gives lines removed then lines added for the changed
/// chunks; they are split with the same change-block policy as the line
/// diff, so a block that removes more lines than it adds reports the
/// surplus as `deleted`, not `added` as older Perforce sensors counted it.
pub fn parse_diff2_summary(output: &str) -> DiffCounts {
    let mut counts = DiffCounts::ZERO;
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["add", _, "chunks", n, ..] => {
                counts.added = counts.added.saturating_add(n.parse().unwrap_or(0));
            }
            ["deleted", _, "chunks", n, ..] => {
                counts.deleted = counts.deleted.saturating_add(n.parse().unwrap_or(0));
            }
            ["changed", _, "chunks", d, "/", a, ..] => {
                let block = change_block(d.parse().unwrap_or(0), a.parse().unwrap_or(0));
                counts.added = counts.added.saturating_add(block.added);
                counts.deleted = counts.deleted.saturating_add(block.deleted);
                counts.changed = counts.changed.saturating_add(block.changed);
            }
            _ => {}
        }
    }
    counts
}

/// Runs the `p4` client.
#[derive(Debug, Clone, Default)]
pub struct P4 {
    pub port: Option<String>,
    pub user: Option<String>,
    pub client: Option<String>,
    /// Pass `-dw` to `diff2`.
    pub ignore_whitespace: bool,
}

impl P4 {
    fn p4_cmd(&self) -> Command {
        let mut cmd = Command::new("p4");
        if let Some(port) = &self.port {
            cmd.args(["-p", port]);
        }
        if let Some(user) = &self.user {
            cmd.args(["-u", user]);
        }
        if let Some(client) = &self.client {
            cmd.args(["-c", client]);
        }
        cmd
    }

    pub fn available(&self) -> bool {
        self.p4_cmd()
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run `p4 <args>` and return stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = self
            .p4_cmd()
            .args(args)
            .output()
            .with_context(|| format!("Failed to run p4 {}", args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("p4 {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn changes(&self, depot_path: &str, max_changes: usize) -> Result<Vec<P4Change>> {
        let max = max_changes.to_string();
        let out = self.run(&["changes", "-s", "submitted", "-t", "-l", "-m", &max, depot_path])?;
        Ok(parse_changes(&out))
    }

    pub fn describe_files(&self, change: u64) -> Result<Vec<DescribedFile>> {
        let out = self.run(&["describe", "-s", &change.to_string()])?;
        Ok(parse_describe_files(&out))
    }

    fn is_text(&self, spec: &str) -> Result<bool> {
        Ok(self.run(&["files", spec])?.contains("(text"))
    }

    fn line_count(&self, spec: &str) -> Result<usize> {
        Ok(split_lines(&self.run(&["print", "-q", spec])?).len())
    }

    /// Statistics for one file of a submitted change.
    pub fn file_stats(&self, change: u64, file: &DescribedFile) -> Result<FileChangeStats> {
        let at_change = format!("{}@{change}", file.depot_path);
        let previous = format!("{}#{}", file.depot_path, file.revision.saturating_sub(1));
        match file.status() {
            ChangeStatus::Deleted => {
                if file.revision < 2 || !self.is_text(&previous)? {
                    return Ok(binary_stats());
                }
                let old = self.line_count(&previous)?;
                Ok(FileChangeStats {
                    total_lines: 0,
                    counts: DiffCounts {
                        deleted: old,
                        ..DiffCounts::ZERO
                    },
                    binary: false,
                })
            }
            status => {
                if !self.is_text(&at_change)? {
                    return Ok(binary_stats());
                }
                let total = self.line_count(&at_change)?;
                let counts = if status == ChangeStatus::Added || file.revision < 2 {
                    DiffCounts {
                        added: total,
                        ..DiffCounts::ZERO
                    }
                } else {
                    let current = format!("{}#{}", file.depot_path, file.revision);
                    let mut args = vec!["diff2", "-ds"];
                    if self.ignore_whitespace {
                        args.push("-dw");
                    }
                    args.push(&previous);
                    args.push(&current);
                    parse_diff2_summary(&self.run(&args)?)
                };
                Ok(FileChangeStats {
                    total_lines: total,
                    counts,
                    binary: false,
                })
            }
        }
    }

    /// Submitted changes under `depot_path` with per-file statistics.
    ///
    /// Files outside `depot_path` that a change also touched are skipped.
    pub fn collect(
        &self,
        depot_path: &str,
        max_changes: usize,
    ) -> Result<Vec<(Commit, Vec<(CommitFileChange, FileChangeStats)>)>> {
        let scope = depot_path.trim_end_matches("...");
        let mut out = Vec::new();
        for change in self.changes(depot_path, max_changes)? {
            let mut stats = Vec::new();
            let mut files = Vec::new();
            for file in self.describe_files(change.number)? {
                if !file.depot_path.starts_with(scope) {
                    debug!(path = %file.depot_path, "outside depot path, skipping");
                    continue;
                }
                let s = self.file_stats(change.number, &file)?;
                files.push(file.to_change());
                stats.push((file.to_change(), s));
            }
            let commit = Commit {
                id: change.number.to_string(),
                author: change.user,
                time_ms: change.time_ms,
                message: change.description,
                files,
            };
            out.push((commit, stats));
        }
        Ok(out)
    }
}

fn binary_stats() -> FileChangeStats {
    FileChangeStats {
        binary: true,
        ..FileChangeStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff2_summary_applies_change_block_policy() {
        let out = "\
==== //depot/project/Foo.java#1 (text) - //depot/project/Foo.java#2 (text) ==== content
add 2 chunks 6 lines
deleted 1 chunks 3 lines
changed 3 chunks 8 / 10 lines
";
        assert_eq!(
            parse_diff2_summary(out),
            DiffCounts {
                added: 8,
                deleted: 3,
                changed: 8
            }
        );
    }

    #[test]
    fn diff2_changed_with_more_removed_than_added() {
        assert_eq!(
            parse_diff2_summary("changed 1 chunks 5 / 2 lines\n"),
            DiffCounts {
                added: 0,
                deleted: 3,
                changed: 2
            }
        );
    }

    #[test]
    fn changes_lines() {
        let out = "\
Change 1234 on 2008/07/14 12:34:56 by jane@ws1 'Fix the parser '
Change 1233 on 2008/07/13 08:00:00 by bob@ws2 'Initial import'
garbage line
";
        let changes = parse_changes(out);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].number, 1234);
        assert_eq!(changes[0].user, "jane");
        assert_eq!(changes[0].client, "ws1");
        assert_eq!(changes[0].description, "Fix the parser ");
        assert_eq!(changes[0].time_ms, 1_216_038_896_000);
    }

    #[test]
    fn long_descriptions_follow_the_header() {
        let out = "\
Change 1234 on 2008/07/14 12:34:56 by jane@ws1

\tFix the parser
\tso that it handles 'quotes'.

Change 1233 on 2008/07/13 08:00:00 by bob@ws2

\tInitial import

";
        let changes = parse_changes(out);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0].description,
            "Fix the parser\nso that it handles 'quotes'."
        );
        assert_eq!(changes[0].user, "jane");
        assert_eq!(changes[1].description, "Initial import");
        assert_eq!(changes[1].number, 1233);
    }

    #[test]
    fn unreadable_header_does_not_take_the_next_description() {
        let out = "\
Change 99 on 2008/13/40 99:00:00 by jane@ws1

\tBad date

Change 100 on 2008/07/14 12:34:56 by jane@ws1

\tGood
";
        let changes = parse_changes(out);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].number, 100);
        assert_eq!(changes[0].description, "Good");
    }

    #[test]
    fn describe_files_and_actions() {
        let out = "\
Change 1234 by jane@ws1 on 2008/07/14 12:34:56

\tFix the parser

Affected files ...

... //depot/project/Foo.java#2 edit
... //depot/project/New File.java#1 add
... //depot/project/Old.java#5 delete
";
        let files = parse_describe_files(out);
        assert_eq!(files.len(), 3);
        assert_eq!(files[1].depot_path, "//depot/project/New File.java");
        assert_eq!(files[1].status(), ChangeStatus::Added);
        assert_eq!(files[2].to_change(), CommitFileChange::deleted("//depot/project/Old.java"));
        assert_eq!(files[0].revision, 2);
    }
}
