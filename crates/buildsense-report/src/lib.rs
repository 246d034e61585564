//! # buildsense-report
//!
//! **Tier 2 (Parsers)**
//!
//! One pure parser per input format. Each turns a [`RawReport`] into
//! [`SensorRecord`]s; the only state it touches is the [`ParseContext`] it
//! is handed.
//!
//! ## What belongs here
//! * The `ReportFormat` seam
//! * JUnit XML, issue tracker CSV and Atom feed parsers
//! * The issue ledger used to detect issue changes between runs
//!
//! ## What does NOT belong here
//! * Retry and fail-on-error policy (see `buildsense-sensor`)
//! * Transmission (see `buildsense-client`)
//! * VCS output (see `buildsense-vcs`)

mod error;
pub mod issue_csv;
pub mod issue_feed;
pub mod junit;
pub mod ledger;

use std::fs;
use std::path::{Path, PathBuf};

use buildsense_path::{ClassPathResolver, Resolution, source_path_for};
use buildsense_tstamp::{TimestampAllocator, format_ms, system_time_ms};
use buildsense_types::{SensorDataType, SensorRecord, keys};
use tracing::{debug, warn};

pub use error::ReportError;
pub use issue_csv::{IssueCsvFormat, IssueRow};
pub use issue_feed::{IssueEvent, IssueFeedFormat};
pub use junit::JunitFormat;
pub use ledger::{IssueLedger, LedgerEntry};

/// A report file loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub path: PathBuf,
    pub content: String,
    /// Modification time in Unix milliseconds.
    pub modified_ms: i64,
}

impl RawReport {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, modified_ms: i64) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            modified_ms,
        }
    }

    /// Read a report and its modification time from disk.
    pub fn read(path: &Path) -> Result<Self, ReportError> {
        let io_err = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = fs::read_to_string(path).map_err(io_err)?;
        let modified_ms = fs::metadata(path)
            .and_then(|m| m.modified())
            .map(system_time_ms)
            .map_err(io_err)?;
        Ok(Self::new(path, content, modified_ms))
    }
}

/// Maps a class name to the `Resource` value of a record.
#[derive(Debug, Clone, Default)]
pub enum ResourceResolver {
    /// Leave `Resource` empty.
    #[default]
    None,
    /// Map directly below a single source root.
    SourceRoot(PathBuf),
    /// Look up known source files by suffix.
    Classes(ClassPathResolver),
}

impl ResourceResolver {
    /// Resource for `class`, or an empty string when it cannot be resolved.
    pub fn resource_for(&self, class: &str) -> String {
        match self {
            ResourceResolver::None => String::new(),
            ResourceResolver::SourceRoot(root) => source_path_for(root, class),
            ResourceResolver::Classes(classes) => match classes.resolve(class) {
                Resolution::Unique(path) => path.to_string(),
                Resolution::Ambiguous(paths) => {
                    warn!(class, candidates = ?paths, "ambiguous source file, using first match");
                    paths.first().map(|p| p.to_string()).unwrap_or_default()
                }
                Resolution::NotFound => {
                    debug!(class, "no source file found");
                    String::new()
                }
            },
        }
    }
}

/// State shared by every parser in one sensor run.
#[derive(Debug, Default)]
pub struct ParseContext {
    /// Start of the run in Unix milliseconds, written as `Runtime`.
    pub runtime_ms: i64,
    pub tstamps: TimestampAllocator,
    pub resolver: ResourceResolver,
}

impl ParseContext {
    pub fn new(runtime_ms: i64) -> Self {
        Self {
            runtime_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResourceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Start a record with the common keys and `Runtime` filled in.
    pub fn record(
        &mut self,
        tool: &str,
        data_type: SensorDataType,
        base_ms: i64,
        resource: impl Into<String>,
    ) -> SensorRecord {
        let ts = self.tstamps.unique(base_ms);
        SensorRecord::new(tool, data_type, format_ms(ts), resource)
            .with(keys::RUNTIME, format_ms(self.runtime_ms))
    }
}

/// A tool-specific report format.
pub trait ReportFormat {
    /// Value of the `Tool` key.
    fn tool(&self) -> &str;

    fn data_type(&self) -> SensorDataType;

    fn parse(
        &self,
        report: &RawReport,
        ctx: &mut ParseContext,
    ) -> Result<Vec<SensorRecord>, ReportError>;
}
