//! Fuzz target for the line diff.
//!
//! Splits the input into two revisions and checks that the edit script
//! rebuilds the revised side and that the counts balance.

#![no_main]
use buildsense_diff::{apply, diff_counts, edit_script, split_lines};
use libfuzzer_sys::fuzz_target;

/// Max input size; the LCS table is quadratic in the differing middle.
const MAX_INPUT_SIZE: usize = 8 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_SIZE {
        return;
    }
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let (old, new) = s.split_once('\0').unwrap_or((s, ""));
    let old = split_lines(old);
    let new = split_lines(new);

    let deltas = edit_script(&old, &new);
    assert_eq!(apply(&old, &new, &deltas), new);

    let counts = diff_counts(&old, &new);
    assert_eq!(
        new.len() as i64 - old.len() as i64,
        counts.added as i64 - counts.deleted as i64
    );
});
