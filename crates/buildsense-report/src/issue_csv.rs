//! Issue tracker CSV export.
//!
//! Expected columns: `ID, Type, Status, Priority, Milestone, Owner, Opened,
//! Closed, Modified`. The first row is a header.

use std::collections::BTreeMap;

use buildsense_types::{SensorDataType, SensorRecord, keys};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::ledger::IssueLedger;
use crate::{ParseContext, RawReport, ReportError, ReportFormat};

pub const DEFAULT_TOOL: &str = "GoogleProjectHosting";

/// `Oct 07, 2008 14:03:22`, read as UTC.
const EXPORT_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none], [year] [hour padding:none]:[minute]:[second]"
);

/// One data row of the export, owner already mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub id: u64,
    pub issue_type: String,
    pub status: String,
    pub priority: String,
    pub milestone: String,
    pub owner: String,
    pub opened_ms: i64,
    pub closed_ms: Option<i64>,
    pub modified_ms: Option<i64>,
}

impl IssueRow {
    /// Tracked fields in column order.
    pub fn tracked(&self) -> [(&'static str, &str); 5] {
        [
            (keys::issue::TYPE, self.issue_type.as_str()),
            (keys::issue::STATUS, self.status.as_str()),
            (keys::issue::PRIORITY, self.priority.as_str()),
            (keys::issue::MILESTONE, self.milestone.as_str()),
            (keys::issue::OWNER, self.owner.as_str()),
        ]
    }
}

/// Parse an export date into Unix milliseconds.
pub fn parse_export_date(text: &str) -> Option<i64> {
    let dt = PrimitiveDateTime::parse(text.trim(), EXPORT_DATE).ok()?;
    i64::try_from(dt.assume_utc().unix_timestamp_nanos() / 1_000_000).ok()
}

/// Parser for the issue tracker CSV export.
#[derive(Debug, Clone)]
pub struct IssueCsvFormat {
    pub tool: String,
    /// Tracker account to telemetry account.
    pub accounts: BTreeMap<String, String>,
}

impl Default for IssueCsvFormat {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            accounts: BTreeMap::new(),
        }
    }
}

impl IssueCsvFormat {
    pub fn new(tool: impl Into<String>, accounts: BTreeMap<String, String>) -> Self {
        Self {
            tool: tool.into(),
            accounts,
        }
    }

    fn map_owner(&self, owner: &str) -> String {
        self.accounts
            .get(owner)
            .cloned()
            .unwrap_or_else(|| owner.to_string())
    }

    /// Data rows of the export.
    ///
    /// A row with fewer than two fields ends the table. Rows with a bad id
    /// or opened date are logged and skipped.
    pub fn rows(&self, report: &RawReport) -> Result<Vec<IssueRow>, ReportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(report.content.as_bytes());

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|source| ReportError::Csv {
                path: report.path.clone(),
                source,
            })?;
            if record.len() < 2 {
                debug!(line = line + 2, "short row, end of issue table");
                break;
            }
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let Ok(id) = field(0).parse::<u64>() else {
                warn!(line = line + 2, id = field(0), "skipping issue row with bad id");
                continue;
            };
            let Some(opened_ms) = parse_export_date(field(6)) else {
                warn!(issue = id, opened = field(6), "skipping issue row with bad opened date");
                continue;
            };
            rows.push(IssueRow {
                id,
                issue_type: field(1).to_string(),
                status: field(2).to_string(),
                priority: field(3).to_string(),
                milestone: field(4).to_string(),
                owner: self.map_owner(field(5)),
                opened_ms,
                closed_ms: parse_export_date(field(7)),
                modified_ms: parse_export_date(field(8)),
            });
        }
        Ok(rows)
    }
}

impl ReportFormat for IssueCsvFormat {
    fn tool(&self) -> &str {
        &self.tool
    }

    fn data_type(&self) -> SensorDataType {
        SensorDataType::Issue
    }

    /// Every row as a new issue. Use [`IssueLedger::sync`] with a loaded
    /// ledger to emit only changes.
    fn parse(
        &self,
        report: &RawReport,
        ctx: &mut ParseContext,
    ) -> Result<Vec<SensorRecord>, ReportError> {
        let rows = self.rows(report)?;
        Ok(IssueLedger::default().sync(&self.tool, &rows, ctx))
    }
}
