//! Fuzz target for git and Perforce output parsers.

#![no_main]
use buildsense_vcs::{git, p4};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = git::parse_log(s);
        let _ = p4::parse_changes(s);
        let _ = p4::parse_describe_files(s);
        let _ = p4::parse_diff2_summary(s);
    }
});
