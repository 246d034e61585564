//! # buildsense-sensor
//!
//! **Tier 3 (Sensor Runtime)**
//!
//! Defines the `Sensor` trait and the policy every sensor run shares:
//! per-file tolerant report processing, retrying transmission, and the
//! fail-on-error switch.
//!
//! ## What belongs here
//! * `Sensor` trait and `SensorSettings`
//! * `run_with_retry`, `signal_error`, `transmit`
//! * `ReportSensor`, the sensor for file-based report formats
//!
//! ## What does NOT belong here
//! * Format parsing (see `buildsense-report`)
//! * VCS access (see `buildsense-vcs`)
//! * CLI parsing

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use buildsense_client::TelemetryClient;
use buildsense_path::files_with_extension;
use buildsense_report::{ParseContext, RawReport, ReportFormat};
use buildsense_types::SensorRecord;
use tracing::{debug, error, info, warn};

/// Run-time switches shared by all sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSettings {
    /// Log every record before it is sent.
    pub verbose: bool,
    /// Abort the run on the first error instead of logging it.
    pub fail_on_error: bool,
    /// Extra attempts after a failed one.
    pub retry_attempts: u32,
    pub retry_wait_secs: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            fail_on_error: true,
            retry_attempts: 0,
            retry_wait_secs: 1,
        }
    }
}

/// A source of sensor records.
pub trait Sensor {
    /// Sensor name for logs and summaries (e.g. "junit", "commits").
    fn name(&self) -> &str;

    /// Produce the records of one run.
    fn run(&self, ctx: &mut ParseContext) -> Result<Vec<SensorRecord>>;
}

/// Call `f` until it succeeds, at most `retry_attempts + 1` times.
///
/// Each failure is logged; the error of the last attempt is returned.
pub fn run_with_retry<T>(
    settings: &SensorSettings,
    what: &str,
    mut f: impl FnMut() -> Result<T>,
) -> Result<T> {
    let attempts = settings.retry_attempts.saturating_add(1);
    let mut attempt = 1;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                warn!(what, attempt, attempts, error = %format!("{err:#}"), "attempt failed, retrying");
                if settings.retry_wait_secs > 0 {
                    thread::sleep(Duration::from_secs(settings.retry_wait_secs));
                }
                attempt += 1;
            }
            Err(err) => {
                return Err(err.context(format!("{what} failed after {attempts} attempt(s)")));
            }
        }
    }
}

/// Apply the fail-on-error switch: the error is returned when set, otherwise
/// logged and swallowed.
pub fn signal_error(settings: &SensorSettings, err: anyhow::Error) -> Result<()> {
    if settings.fail_on_error {
        Err(err)
    } else {
        error!(error = %format!("{err:#}"), "continuing after error");
        Ok(())
    }
}

/// A report file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Records from a set of report files.
#[derive(Debug, Default)]
pub struct ReportBatch {
    pub records: Vec<SensorRecord>,
    pub files_read: usize,
    pub failures: Vec<FileFailure>,
}

/// Expand `paths` into report files: files are taken as given, directories
/// are searched for names ending with `ext`. Missing paths are errors.
pub fn report_files(paths: &[PathBuf], ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(files_with_extension(path, ext)?);
        } else {
            anyhow::bail!("Report path not found: {}", path.display());
        }
    }
    Ok(files)
}

/// Parse every file with `format`. A file that fails to read or parse is
/// logged and counted; the others continue.
pub fn process_reports(
    format: &dyn ReportFormat,
    files: &[PathBuf],
    ctx: &mut ParseContext,
) -> ReportBatch {
    let mut batch = ReportBatch::default();
    for path in files {
        match parse_one(format, path, ctx) {
            Ok(records) => {
                debug!(path = %path.display(), records = records.len(), "parsed report");
                batch.files_read += 1;
                batch.records.extend(records);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable report");
                batch.failures.push(FileFailure {
                    path: path.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        tool = format.tool(),
        files = batch.files_read,
        failed = batch.failures.len(),
        records = batch.records.len(),
        "reports processed"
    );
    batch
}

fn parse_one(
    format: &dyn ReportFormat,
    path: &Path,
    ctx: &mut ParseContext,
) -> Result<Vec<SensorRecord>, buildsense_report::ReportError> {
    let report = RawReport::read(path)?;
    format.parse(&report, ctx)
}

/// Sensor over a report format and a fixed list of files.
pub struct ReportSensor<F> {
    pub name: String,
    pub format: F,
    pub files: Vec<PathBuf>,
}

impl<F: ReportFormat> Sensor for ReportSensor<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &mut ParseContext) -> Result<Vec<SensorRecord>> {
        let batch = process_reports(&self.format, &self.files, ctx);
        if batch.files_read == 0 && !batch.failures.is_empty() {
            anyhow::bail!(
                "None of the {} report file(s) could be parsed",
                batch.failures.len()
            );
        }
        Ok(batch.records)
    }
}

/// Outcome of one sensor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sensor: String,
    pub records: usize,
    pub rejected: usize,
    pub sent: usize,
    pub stored_offline: usize,
    /// The client still holds data for a later upload.
    pub offline_data: bool,
}

/// Hand `records` to `client` and send them, retrying the send as
/// configured.
pub fn transmit(
    client: &mut dyn TelemetryClient,
    sensor: &str,
    records: Vec<SensorRecord>,
    settings: &SensorSettings,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        sensor: sensor.to_string(),
        records: records.len(),
        ..RunSummary::default()
    };
    for record in records {
        if settings.verbose {
            info!(sensor, record = ?record, "record");
        }
        if let Err(err) = client.add(record) {
            summary.rejected += 1;
            signal_error(settings, anyhow::Error::new(err).context("Record rejected"))?;
        }
    }

    match run_with_retry(settings, "send", || client.send().map_err(anyhow::Error::new)) {
        Ok(outcome) => {
            summary.sent = outcome.sent;
            summary.stored_offline = outcome.stored_offline;
        }
        Err(err) => signal_error(settings, err)?,
    }
    summary.offline_data = client.has_offline_data();
    if summary.offline_data {
        info!(sensor, "data stored offline for a later upload");
    }
    Ok(summary)
}

/// Run `sensor` and transmit its records.
pub fn execute(
    sensor: &dyn Sensor,
    client: &mut dyn TelemetryClient,
    ctx: &mut ParseContext,
    settings: &SensorSettings,
) -> Result<RunSummary> {
    let records = match sensor.run(ctx) {
        Ok(records) => records,
        Err(err) => {
            signal_error(
                settings,
                err.context(format!("Sensor {} failed", sensor.name())),
            )?;
            Vec::new()
        }
    };
    transmit(client, sensor.name(), records, settings)
        .with_context(|| format!("Sensor {} could not transmit", sensor.name()))
}
