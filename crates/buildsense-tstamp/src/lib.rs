//! # buildsense-tstamp
//!
//! **Tier 1 (Utilities)**
//!
//! Millisecond timestamps. Records produced from one report often share a
//! base time (the report's modification time); the allocator nudges them
//! apart so every record gets its own `Timestamp`.
//!
//! ## What belongs here
//! * Unique timestamp allocation
//! * Rendering and parsing of record timestamps
//!
//! ## What does NOT belong here
//! * Tool-specific date formats (see `buildsense-report`)

#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const RECORD_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

/// Hands out distinct millisecond timestamps.
#[derive(Debug, Clone, Default)]
pub struct TimestampAllocator {
    issued: HashSet<i64>,
}

impl TimestampAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base_ms` if unused, otherwise the smallest larger unused value.
    ///
    /// Near `i64::MAX`, where no larger value is left, the largest smaller
    /// unused value is taken instead.
    pub fn unique(&mut self, base_ms: i64) -> i64 {
        let candidate = (base_ms..=i64::MAX)
            .find(|t| !self.issued.contains(t))
            .or_else(|| (i64::MIN..base_ms).rev().find(|t| !self.issued.contains(t)))
            .unwrap_or(base_ms);
        self.issued.insert(candidate);
        candidate
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

/// Render Unix milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// ```
/// assert_eq!(buildsense_tstamp::format_ms(0), "1970-01-01T00:00:00.000Z");
/// ```
#[must_use]
pub fn format_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|dt| dt.format(RECORD_FORMAT).ok())
        .unwrap_or_else(|| "1970-01-01T00:00:00.000Z".to_string())
}

/// Parse any RFC 3339 timestamp back to Unix milliseconds.
#[must_use]
pub fn parse_ms(text: &str) -> Option<i64> {
    let dt = OffsetDateTime::parse(text.trim(), &Rfc3339).ok()?;
    i64::try_from(dt.unix_timestamp_nanos() / 1_000_000).ok()
}

/// Current wall-clock time in Unix milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// `SystemTime` as Unix milliseconds; negative before the epoch.
#[must_use]
pub fn system_time_ms(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}
