//! # buildsense-diff
//!
//! **Tier 1 (Algorithms)**
//!
//! Line-level diff between two revisions of a file, and the line counts the
//! commit sensors report next to it.
//!
//! ## What belongs here
//! * LCS edit script computation (linear space) and patching
//! * Added / deleted / changed counting policy
//! * Line splitting and total / non-blank counting
//!
//! ## What does NOT belong here
//! * Fetching file contents (see `buildsense-vcs`)
//! * Record construction

#![forbid(unsafe_code)]

mod lines;

pub use buildsense_types::{DiffCounts, LineCounts};
pub use lines::{line_counts, line_counts_str, split_lines};

/// Shape of one delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    /// Revised-only lines.
    Insert,
    /// Original-only lines.
    Delete,
    /// A block of original lines replaced by a block of revised lines.
    Change,
}

/// One contiguous difference between the two sequences.
///
/// Positions are indexes into the full sequences passed to [`edit_script`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delta {
    pub kind: DeltaKind,
    pub original_start: usize,
    pub original_len: usize,
    pub revised_start: usize,
    pub revised_len: usize,
}

impl Delta {
    fn from_block(
        original_start: usize,
        original_len: usize,
        revised_start: usize,
        revised_len: usize,
    ) -> Self {
        let kind = match (original_len, revised_len) {
            (0, _) => DeltaKind::Insert,
            (_, 0) => DeltaKind::Delete,
            _ => DeltaKind::Change,
        };
        Self {
            kind,
            original_start,
            original_len,
            revised_start,
            revised_len,
        }
    }

    /// Counts contributed by this delta.
    #[must_use]
    pub fn counts(&self) -> DiffCounts {
        match self.kind {
            DeltaKind::Insert => DiffCounts {
                added: self.revised_len,
                ..DiffCounts::ZERO
            },
            DeltaKind::Delete => DiffCounts {
                deleted: self.original_len,
                ..DiffCounts::ZERO
            },
            DeltaKind::Change => change_block(self.original_len, self.revised_len),
        }
    }
}

/// Counts for `deleted` original lines replaced by `added` revised lines.
///
/// The shorter side is the changed core, the surplus stays on the longer
/// side. Never reports both added and deleted lines for one block.
#[must_use]
pub fn change_block(deleted: usize, added: usize) -> DiffCounts {
    DiffCounts {
        added: added.saturating_sub(deleted),
        deleted: deleted.saturating_sub(added),
        changed: added.min(deleted),
    }
}

/// Largest middle section, in table cells, diffed with a full LCS table.
/// Bigger sections are split in linear space first.
const TABLE_CELLS: usize = 1 << 20;

/// Compute a minimal edit script turning `original` into `revised`.
///
/// The common prefix and suffix are trimmed first. What remains is split
/// around an LCS midpoint (Hirschberg) until a section fits in a small
/// table, so memory stays linear in the input size.
/// Deltas are returned in ascending position order and never touch each
/// other.
pub fn edit_script<T: PartialEq>(original: &[T], revised: &[T]) -> Vec<Delta> {
    let mut matches = Vec::new();
    collect_matches(original, revised, (0, 0), TABLE_CELLS, &mut matches);

    let mut deltas = Vec::new();
    let (mut i, mut j) = (0, 0);
    let end = (original.len(), revised.len());
    for (mi, mj) in matches.into_iter().chain(std::iter::once(end)) {
        if mi > i || mj > j {
            deltas.push(Delta::from_block(i, mi - i, j, mj - j));
        }
        i = mi + 1;
        j = mj + 1;
    }
    deltas
}

/// Lengths of the common prefix and the common suffix; they never overlap.
fn common_ends<T: PartialEq>(a: &[T], b: &[T]) -> (usize, usize) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    (prefix, suffix)
}

/// Push the matched index pairs of one LCS of `a` and `b`, in order.
///
/// `offset` is the position of `a[0]` and `b[0]` in the full sequences.
fn collect_matches<T: PartialEq>(
    a: &[T],
    b: &[T],
    offset: (usize, usize),
    table_cells: usize,
    out: &mut Vec<(usize, usize)>,
) {
    let (ao, bo) = offset;
    let (prefix, suffix) = common_ends(a, b);
    out.extend((0..prefix).map(|n| (ao + n, bo + n)));

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];
    let mid_offset = (ao + prefix, bo + prefix);
    if !a_mid.is_empty() && !b_mid.is_empty() {
        if a_mid.len().saturating_mul(b_mid.len()) <= table_cells {
            table_matches(a_mid, b_mid, mid_offset, out);
        } else if a_mid.len() == 1 {
            let found = b_mid.iter().position(|y| *y == a_mid[0]);
            out.extend(found.map(|j| (mid_offset.0, mid_offset.1 + j)));
        } else {
            let split = a_mid.len() / 2;
            let k = lcs_split(a_mid, b_mid, split);
            collect_matches(&a_mid[..split], &b_mid[..k], mid_offset, table_cells, out);
            collect_matches(
                &a_mid[split..],
                &b_mid[k..],
                (mid_offset.0 + split, mid_offset.1 + k),
                table_cells,
                out,
            );
        }
    }

    let (a_tail, b_tail) = (ao + a.len() - suffix, bo + b.len() - suffix);
    out.extend((0..suffix).map(|n| (a_tail + n, b_tail + n)));
}

/// Where to cut `b` so that an LCS of `a` and `b` passes through
/// `(split, k)`.
fn lcs_split<T: PartialEq>(a: &[T], b: &[T], split: usize) -> usize {
    let forward = lcs_row(a[..split].iter(), b.iter());
    let backward = lcs_row(a[split..].iter().rev(), b.iter().rev());
    let m = b.len();
    (0..=m)
        .max_by_key(|&k| forward[k] + backward[m - k])
        .unwrap_or(0)
}

/// Last row of the prefix LCS table: `row[k]` is the LCS length of all of
/// `a` and the first `k` items of `b`.
fn lcs_row<'t, T, A, B>(a: A, b: B) -> Vec<usize>
where
    T: PartialEq + 't,
    A: Iterator<Item = &'t T>,
    B: Iterator<Item = &'t T> + Clone,
{
    let cols = b.clone().count() + 1;
    let mut prev = vec![0usize; cols];
    let mut curr = vec![0usize; cols];
    for x in a {
        for (j, y) in b.clone().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev
}

/// Walk a full LCS table, preferring to consume `b` on ties.
fn table_matches<T: PartialEq>(
    a: &[T],
    b: &[T],
    offset: (usize, usize),
    out: &mut Vec<(usize, usize)>,
) {
    let table = LcsTable::build(a, b);
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push((offset.0 + i, offset.1 + j));
            i += 1;
            j += 1;
        } else if table.get(i, j + 1) >= table.get(i + 1, j) {
            j += 1;
        } else {
            i += 1;
        }
    }
}

/// Suffix LCS lengths: `get(i, j)` is the LCS length of `a[i..]` and `b[j..]`.
struct LcsTable {
    cols: usize,
    cells: Vec<usize>,
}

impl LcsTable {
    fn build<T: PartialEq>(a: &[T], b: &[T]) -> Self {
        let cols = b.len() + 1;
        let mut cells = vec![0usize; (a.len() + 1) * cols];
        for i in (0..a.len()).rev() {
            for j in (0..b.len()).rev() {
                cells[i * cols + j] = if a[i] == b[j] {
                    cells[(i + 1) * cols + j + 1] + 1
                } else {
                    cells[(i + 1) * cols + j].max(cells[i * cols + j + 1])
                };
            }
        }
        Self { cols, cells }
    }

    fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }
}

/// Patch `original` with `deltas`, taking replacement lines from `revised`.
///
/// With deltas from `edit_script(original, revised)` this reproduces
/// `revised` exactly.
pub fn apply<T: Clone>(original: &[T], revised: &[T], deltas: &[Delta]) -> Vec<T> {
    let mut out = Vec::with_capacity(revised.len());
    let mut cursor = 0;
    for d in deltas {
        out.extend_from_slice(&original[cursor..d.original_start]);
        out.extend_from_slice(&revised[d.revised_start..d.revised_start + d.revised_len]);
        cursor = d.original_start + d.original_len;
    }
    out.extend_from_slice(&original[cursor..]);
    out
}

/// Added / deleted / changed line counts between two revisions.
#[must_use]
pub fn diff_counts<T: PartialEq>(original: &[T], revised: &[T]) -> DiffCounts {
    edit_script(original, revised)
        .iter()
        .fold(DiffCounts::ZERO, |acc, d| acc + d.counts())
}

/// [`diff_counts`] with absent revisions treated as empty.
#[must_use]
pub fn diff_counts_opt<T: PartialEq>(original: Option<&[T]>, revised: Option<&[T]>) -> DiffCounts {
    diff_counts(original.unwrap_or(&[]), revised.unwrap_or(&[]))
}
