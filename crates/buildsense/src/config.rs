use std::io::{self, Stdout};
use std::path::PathBuf;

use buildsense_client::{JsonLinesClient, SpoolClient, TelemetryClient};
use buildsense_sensor::SensorSettings;
use buildsense_settings::BuildsenseConfig;
use tracing::debug;

use crate::cli::RunArgs;

/// Spool used when neither the flag nor the config names one.
pub(crate) const DEFAULT_SPOOL: &str = ".buildsense/spool.jsonl";

/// Where records of a run go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sink {
    Stdout,
    Spool(PathBuf),
}

impl Sink {
    pub(crate) fn client(&self) -> Box<dyn TelemetryClient> {
        match self {
            Sink::Stdout => Box::new(JsonLinesClient::<Stdout>::new(io::stdout())),
            Sink::Spool(path) => Box::new(SpoolClient::new(path.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedRun {
    pub settings: SensorSettings,
    pub sink: Sink,
}

/// Layer flags over the config file over built-in defaults.
pub(crate) fn resolve_run(args: &RunArgs, config: &BuildsenseConfig, verbose: u8) -> ResolvedRun {
    let defaults = SensorSettings::default();
    let file = &config.sensor;
    let settings = SensorSettings {
        verbose: verbose > 1 || file.verbose.unwrap_or(defaults.verbose),
        fail_on_error: args
            .fail_on_error
            .or(file.fail_on_error)
            .unwrap_or(defaults.fail_on_error),
        retry_attempts: args
            .retry_attempts
            .or(file.retry_attempts)
            .unwrap_or(defaults.retry_attempts),
        retry_wait_secs: args
            .retry_wait
            .or(file.retry_wait_secs)
            .unwrap_or(defaults.retry_wait_secs),
    };

    let sink = if args.dry_run || config.client.dry_run.unwrap_or(false) {
        Sink::Stdout
    } else {
        Sink::Spool(
            args.spool
                .clone()
                .or_else(|| config.client.spool.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPOOL)),
        )
    };
    debug!(?settings, ?sink, "resolved run settings");
    ResolvedRun { settings, sink }
}

/// Flag value, else the config list, else empty.
pub(crate) fn paths_or(flag: &[PathBuf], file: Option<&Vec<String>>) -> Vec<PathBuf> {
    if !flag.is_empty() {
        return flag.to_vec();
    }
    file.map(|v| v.iter().map(PathBuf::from).collect())
        .unwrap_or_default()
}

pub(crate) fn path_or(flag: Option<&PathBuf>, file: Option<&String>) -> Option<PathBuf> {
    flag.cloned().or_else(|| file.map(PathBuf::from))
}
