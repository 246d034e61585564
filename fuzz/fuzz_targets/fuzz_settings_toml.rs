//! Fuzz target for `buildsense.toml` parsing.

#![no_main]
use buildsense_settings::BuildsenseConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = BuildsenseConfig::parse(s);
    }
});
