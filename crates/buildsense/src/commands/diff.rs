use std::path::Path;

use anyhow::{Context, Result};
use buildsense_diff::{DiffCounts, LineCounts, diff_counts, line_counts_str, split_lines};
use serde::Serialize;

use crate::cli::DiffArgs;

#[derive(Debug, Serialize)]
struct DiffReport {
    old: LineCounts,
    new: LineCounts,
    diff: DiffCounts,
}

fn read(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Path not found: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn handle(args: DiffArgs) -> Result<()> {
    let old_text = read(&args.old)?;
    let new_text = read(&args.new)?;
    let old = split_lines(&old_text);
    let new = split_lines(&new_text);

    let report = DiffReport {
        old: line_counts_str(&old),
        new: line_counts_str(&new),
        diff: diff_counts(&old, &new),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
