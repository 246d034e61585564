//! Fuzz target for the issue CSV export and the issue update feed.

#![no_main]
use buildsense_report::issue_feed::{parse_title, split_update};
use buildsense_report::{IssueCsvFormat, IssueFeedFormat, ParseContext, RawReport, ReportFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let _ = parse_title(s);
    let _ = split_update(s);

    let report = RawReport::new("fuzz", s, 0);
    let mut ctx = ParseContext::new(0);
    let _ = IssueCsvFormat::default().parse(&report, &mut ctx);
    let _ = IssueFeedFormat::default().parse(&report, &mut ctx);
});
