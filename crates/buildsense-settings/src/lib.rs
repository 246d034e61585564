//! # buildsense-settings
//!
//! **Tier 0 (Configuration)**
//!
//! Types for `buildsense.toml`. Every field is optional so that a file only
//! states what it changes; the CLI layers its flags on top and supplies the
//! defaults.
//!
//! ## What belongs here
//! * `BuildsenseConfig` and its per-sensor tables
//! * Loading and discovery of the config file
//!
//! ## What does NOT belong here
//! * Clap types
//! * Default values (the CLI resolves them)

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Name of the config file looked up by [`BuildsenseConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "buildsense.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root of `buildsense.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildsenseConfig {
    /// Run-time policy shared by all sensors.
    pub sensor: SensorConfig,

    /// Where records go.
    pub client: ClientConfig,

    pub junit: JunitConfig,

    pub issues: IssuesConfig,

    pub commits: CommitsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Log every record before it is sent.
    pub verbose: Option<bool>,

    /// Abort on the first error (default: true).
    pub fail_on_error: Option<bool>,

    /// Extra send attempts after a failure (default: 0).
    pub retry_attempts: Option<u32>,

    /// Seconds between send attempts (default: 1).
    pub retry_wait_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Offline spool file.
    pub spool: Option<String>,

    /// Print records instead of spooling them.
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunitConfig {
    /// Report files or directories of `*.xml` reports.
    pub data: Option<Vec<String>>,

    /// Source root joined with the class path of each suite.
    pub source_path: Option<String>,

    /// Source trees searched for the file of each suite.
    pub src: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesConfig {
    /// Value of the `Tool` key.
    pub tool: Option<String>,

    /// Issue tracker CSV export.
    pub csv: Option<String>,

    /// Issue update Atom feed.
    pub feed: Option<String>,

    /// File holding the last known state of each issue.
    pub ledger: Option<String>,

    /// Tracker account to user name.
    pub accounts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitsConfig {
    /// Repository to read (default: current directory).
    pub repo: Option<String>,

    /// Revision range, e.g. `v1.0..HEAD`.
    pub range: Option<String>,

    pub max_commits: Option<usize>,

    /// Prepended to each file path in `Resource`.
    pub prefix: Option<String>,

    pub p4: PerforceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerforceConfig {
    pub port: Option<String>,
    pub user: Option<String>,
    pub client: Option<String>,

    /// Depot path to read, e.g. `//depot/project/...`.
    pub depot_path: Option<String>,

    /// Ignore whitespace-only changes.
    pub ignore_whitespace: Option<bool>,
}

impl BuildsenseConfig {
    /// Load configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Nearest `buildsense.toml` in `start` or one of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let found = start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file());
        debug!(start = %start.display(), found = ?found, "config discovery");
        found
    }

    /// Load `explicit` when given, else the discovered file, else defaults.
    pub fn load(explicit: Option<&Path>, start: &Path) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::discover(start) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_unset() {
        let config = BuildsenseConfig::parse("").unwrap();
        assert_eq!(config, BuildsenseConfig::default());
    }

    #[test]
    fn unknown_tables_are_ignored() {
        let config = BuildsenseConfig::parse("[extra]\nkey = 1\n").unwrap();
        assert_eq!(config.sensor.fail_on_error, None);
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(BuildsenseConfig::parse("[sensor]\nretry_attempts = \"three\"\n").is_err());
    }
}
