//! # buildsense-client
//!
//! **Tier 1 (Transport Seam)**
//!
//! The `TelemetryClient` trait sensors hand their records to, plus the local
//! sinks used without a server: an in-memory collector, a JSON-lines writer
//! for dry runs, and an append-only offline spool.
//!
//! ## What belongs here
//! * `TelemetryClient` trait and `SendOutcome`
//! * Local record sinks
//!
//! ## What does NOT belong here
//! * Network transport
//! * Retry policy (see `buildsense-sensor`)

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use buildsense_types::SensorRecord;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("record is missing required keys: {0:?}")]
    InvalidRecord(Vec<String>),

    #[error("failed to write records to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("send rejected: {0}")]
    Rejected(String),
}

/// What happened to the records of one `send`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOutcome {
    /// Records delivered to their final destination.
    pub sent: usize,
    /// Records kept locally for a later upload.
    pub stored_offline: usize,
}

impl SendOutcome {
    pub fn total(&self) -> usize {
        self.sent + self.stored_offline
    }
}

/// Destination for sensor records.
///
/// Records are buffered by `add` and flushed by `send`.
pub trait TelemetryClient {
    /// Queue one record. Records missing a required key are rejected.
    fn add(&mut self, record: SensorRecord) -> Result<(), ClientError>;

    /// Flush every queued record.
    fn send(&mut self) -> Result<SendOutcome, ClientError>;

    /// True when records are waiting locally for a later upload.
    fn has_offline_data(&self) -> bool;
}

fn check(record: &SensorRecord) -> Result<(), ClientError> {
    let missing = record.missing_keys();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClientError::InvalidRecord(
            missing.into_iter().map(str::to_string).collect(),
        ))
    }
}

// ── MemoryClient ─────────────────────────────────────────────────────

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryClient {
    pending: Vec<SensorRecord>,
    sent: Vec<SensorRecord>,
    reject_sends: Option<String>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose every `send` fails with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject_sends: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn pending(&self) -> &[SensorRecord] {
        &self.pending
    }

    pub fn sent(&self) -> &[SensorRecord] {
        &self.sent
    }
}

impl TelemetryClient for MemoryClient {
    fn add(&mut self, record: SensorRecord) -> Result<(), ClientError> {
        check(&record)?;
        self.pending.push(record);
        Ok(())
    }

    fn send(&mut self) -> Result<SendOutcome, ClientError> {
        if let Some(reason) = &self.reject_sends {
            return Err(ClientError::Rejected(reason.clone()));
        }
        let sent = self.pending.len();
        self.sent.append(&mut self.pending);
        Ok(SendOutcome {
            sent,
            stored_offline: 0,
        })
    }

    fn has_offline_data(&self) -> bool {
        false
    }
}

/// Write each pending record as one JSON line.
///
/// A record leaves `pending` once its line is written, so after a failed
/// write a retry only writes what is left.
fn drain_lines<W: Write>(
    out: &mut W,
    pending: &mut Vec<SensorRecord>,
    io_err: impl Fn(io::Error) -> ClientError,
) -> Result<usize, ClientError> {
    let mut written = 0;
    let result = pending.iter().try_for_each(|record| -> Result<(), ClientError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        out.write_all(&line).map_err(&io_err)?;
        written += 1;
        Ok(())
    });
    pending.drain(..written);
    result.map(|()| written)
}

// ── JsonLinesClient ──────────────────────────────────────────────────

/// Writes each record as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesClient<W: Write> {
    out: W,
    pending: Vec<SensorRecord>,
}

impl<W: Write> JsonLinesClient<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TelemetryClient for JsonLinesClient<W> {
    fn add(&mut self, record: SensorRecord) -> Result<(), ClientError> {
        check(&record)?;
        self.pending.push(record);
        Ok(())
    }

    fn send(&mut self) -> Result<SendOutcome, ClientError> {
        let io_err = |source| ClientError::Io {
            path: PathBuf::from("<output>"),
            source,
        };
        let sent = drain_lines(&mut self.out, &mut self.pending, io_err)?;
        self.out.flush().map_err(io_err)?;
        Ok(SendOutcome {
            sent,
            stored_offline: 0,
        })
    }

    fn has_offline_data(&self) -> bool {
        false
    }
}

// ── SpoolClient ──────────────────────────────────────────────────────

/// Appends records to a JSON-lines spool file for a later upload.
#[derive(Debug)]
pub struct SpoolClient {
    path: PathBuf,
    pending: Vec<SensorRecord>,
}

impl SpoolClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> ClientError {
        ClientError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Every record currently in the spool file, oldest first.
    pub fn load(path: &Path) -> Result<Vec<SensorRecord>, ClientError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let io_err = |source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl TelemetryClient for SpoolClient {
    fn add(&mut self, record: SensorRecord) -> Result<(), ClientError> {
        check(&record)?;
        self.pending.push(record);
        Ok(())
    }

    fn send(&mut self) -> Result<SendOutcome, ClientError> {
        if self.pending.is_empty() {
            return Ok(SendOutcome::default());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        let path = self.path.clone();
        let stored = drain_lines(&mut file, &mut self.pending, |source| ClientError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), records = stored, "records spooled for later upload");
        Ok(SendOutcome {
            sent: 0,
            stored_offline: stored,
        })
    }

    fn has_offline_data(&self) -> bool {
        let has = fs::metadata(&self.path).is_ok_and(|m| m.len() > 0);
        debug!(path = %self.path.display(), has, "checked spool");
        has
    }
}
