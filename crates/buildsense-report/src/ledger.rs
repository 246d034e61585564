//! Last known state of each tracked issue, persisted between runs.
//!
//! Tracked fields are stored as a history of `value--timestamp` properties.
//! A run only emits records for issues that are new or whose tracked fields
//! changed since the last run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use buildsense_tstamp::{format_ms, parse_ms};
use buildsense_types::{SensorDataType, SensorRecord, keys};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::issue_csv::IssueRow;
use crate::{ParseContext, ReportError};

/// History of one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub opened_ms: i64,
    /// `(key, "value--timestamp")` in the order observed.
    #[serde(default)]
    pub properties: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_mod: Option<String>,
}

fn split_stamped(value: &str) -> Option<(&str, i64)> {
    let (v, ts) = value.rsplit_once(keys::issue::TIMESTAMP_SEPARATOR)?;
    Some((v, parse_ms(ts)?))
}

impl LedgerEntry {
    /// Value of `key` with the newest timestamp. The earliest entry wins
    /// a tie.
    pub fn latest_value(&self, key: &str) -> Option<&str> {
        let mut best: Option<(&str, i64)> = None;
        for (k, stamped) in &self.properties {
            if k != key {
                continue;
            }
            let Some((value, ts)) = split_stamped(stamped) else {
                debug!(issue = self.id, key, stamped = %stamped, "unreadable ledger property");
                continue;
            };
            if best.is_none_or(|(_, best_ts)| ts > best_ts) {
                best = Some((value, ts));
            }
        }
        best.map(|(v, _)| v)
    }

    /// Newest stamped property of `key`, as stored.
    fn latest_stamped(&self, key: &str) -> Option<&str> {
        let value = self.latest_value(key)?;
        self.properties
            .iter()
            .filter(|(k, s)| k == key && split_stamped(s).is_some_and(|(v, _)| v == value))
            .map(|(_, s)| s.as_str())
            .max_by_key(|s| split_stamped(s).map(|(_, ts)| ts))
    }

    /// The issue as an `Issue` record with the newest value of each tracked
    /// field.
    pub fn to_record(&self, tool: &str, ctx: &mut ParseContext) -> SensorRecord {
        let mut record = ctx
            .record(tool, SensorDataType::Issue, self.opened_ms, "")
            .with(keys::issue::ID, self.id.to_string());
        for key in keys::issue::TRACKED {
            if let Some(stamped) = self.latest_stamped(key) {
                record.set(*key, stamped);
            }
        }
        record
    }
}

/// Known issues keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLedger {
    #[serde(default)]
    issues: BTreeMap<u64, LedgerEntry>,
}

impl IssueLedger {
    /// Load a ledger file. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            debug!(path = %path.display(), "no issue ledger yet");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ReportError::Ledger {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ReportError::Ledger {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn entry(&self, id: u64) -> Option<&LedgerEntry> {
        self.issues.get(&id)
    }

    /// Fold one export row into the ledger.
    ///
    /// Each tracked field whose value differs from the newest known value is
    /// appended as `value--<run time>`. Returns true when the issue is new or
    /// at least one field changed.
    pub fn apply_row(&mut self, row: &IssueRow, run_ms: i64) -> bool {
        let stamp = format_ms(run_ms);
        let mut is_new = false;
        let entry = self.issues.entry(row.id).or_insert_with(|| {
            is_new = true;
            LedgerEntry {
                id: row.id,
                opened_ms: row.opened_ms,
                ..LedgerEntry::default()
            }
        });

        let mut changed = false;
        for (key, value) in row.tracked() {
            let old = entry.latest_value(key).unwrap_or("");
            if old == value {
                continue;
            }
            if !is_new {
                info!(issue = row.id, field = key, from = old, to = value, "issue field changed");
            }
            entry.properties.push((
                key.to_string(),
                format!("{value}{}{stamp}", keys::issue::TIMESTAMP_SEPARATOR),
            ));
            changed = true;
        }
        if changed || is_new {
            entry.last_mod = Some(stamp);
        }
        is_new || changed
    }

    /// Apply `rows` and return a record for every new or changed issue.
    pub fn sync(&mut self, tool: &str, rows: &[IssueRow], ctx: &mut ParseContext) -> Vec<SensorRecord> {
        let mut records = Vec::new();
        for row in rows {
            if self.apply_row(row, ctx.runtime_ms)
                && let Some(entry) = self.issues.get(&row.id)
            {
                records.push(entry.to_record(tool, ctx));
            }
        }
        info!(
            issues = self.issues.len(),
            updated = records.len(),
            "issue ledger synced"
        );
        records
    }
}
