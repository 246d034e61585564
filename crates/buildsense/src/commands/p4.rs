use anyhow::{Context, Result, bail};
use buildsense_report::ParseContext;
use buildsense_sensor::{Sensor, execute};
use buildsense_settings::BuildsenseConfig;
use buildsense_tstamp::now_ms;
use buildsense_types::SensorRecord;
use buildsense_vcs::commit_records;
use buildsense_vcs::p4::{self, P4};

use crate::cli::P4Args;
use crate::config::resolve_run;

/// Changelists read when neither flag nor config bounds the history.
const DEFAULT_MAX_CHANGES: usize = 100;

/// Per-file statistics of submitted Perforce changelists.
pub(crate) struct PerforceSensor {
    pub p4: P4,
    pub depot_path: String,
    pub max_changes: usize,
    pub prefix: String,
}

impl Sensor for PerforceSensor {
    fn name(&self) -> &str {
        "p4"
    }

    fn run(&self, ctx: &mut ParseContext) -> Result<Vec<SensorRecord>> {
        if !self.p4.available() {
            bail!("p4 is not available on PATH");
        }
        let changes = self
            .p4
            .collect(&self.depot_path, self.max_changes)
            .with_context(|| format!("Failed to read changes under {}", self.depot_path))?;
        let mut records = Vec::new();
        for (commit, stats) in &changes {
            records.extend(commit_records(
                p4::TOOL,
                commit,
                stats,
                &self.prefix,
                &mut ctx.tstamps,
            ));
        }
        Ok(records)
    }
}

pub(crate) fn handle(args: P4Args, config: &BuildsenseConfig, verbose: u8) -> Result<()> {
    let run = resolve_run(&args.run, config, verbose);
    let file = &config.commits.p4;
    let Some(depot_path) = args.depot_path.or_else(|| file.depot_path.clone()) else {
        bail!("No depot path given; pass --depot-path or set [commits.p4] depot_path");
    };
    let sensor = PerforceSensor {
        p4: P4 {
            port: args.port.or_else(|| file.port.clone()),
            user: args.user.or_else(|| file.user.clone()),
            client: args.client.or_else(|| file.client.clone()),
            ignore_whitespace: args.ignore_whitespace || file.ignore_whitespace.unwrap_or(false),
        },
        depot_path,
        max_changes: args
            .max_changes
            .or(config.commits.max_commits)
            .unwrap_or(DEFAULT_MAX_CHANGES),
        prefix: args
            .prefix
            .or_else(|| config.commits.prefix.clone())
            .unwrap_or_default(),
    };
    let mut ctx = ParseContext::new(now_ms());
    let mut client = run.sink.client();
    let summary = execute(&sensor, client.as_mut(), &mut ctx, &run.settings)?;
    super::report(&summary, &run.sink);
    Ok(())
}
