//! Fuzz target for JUnit XML parsing: no panics on arbitrary input.

#![no_main]
use buildsense_report::{JunitFormat, ParseContext, RawReport, ReportFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let report = RawReport::new("fuzz.xml", s, 0);
        let mut ctx = ParseContext::new(0);
        if let Ok(records) = JunitFormat.parse(&report, &mut ctx) {
            assert!(records.iter().all(|r| r.is_valid()));
        }
    }
});
