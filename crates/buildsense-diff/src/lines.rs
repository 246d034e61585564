//! Line splitting and counting.

use buildsense_types::LineCounts;

/// Split text into lines the way a buffered line reader does.
///
/// Accepts `\n` and `\r\n` terminators. A trailing terminator does not
/// produce a final empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Count lines of one revision. `None` entries are not counted at all.
pub fn line_counts<S: AsRef<str>>(lines: &[Option<S>]) -> LineCounts {
    lines
        .iter()
        .flatten()
        .fold(LineCounts::default(), |acc, line| count_one(acc, line.as_ref()))
}

/// [`line_counts`] for a sequence with no absent lines.
pub fn line_counts_str<S: AsRef<str>>(lines: &[S]) -> LineCounts {
    lines
        .iter()
        .fold(LineCounts::default(), |acc, line| count_one(acc, line.as_ref()))
}

fn count_one(acc: LineCounts, line: &str) -> LineCounts {
    LineCounts {
        total: acc.total + 1,
        non_blank: acc.non_blank + usize::from(!line.trim().is_empty()),
    }
}
