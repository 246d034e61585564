pub(crate) mod commits;
pub(crate) mod diff;
pub(crate) mod issues;
pub(crate) mod junit;
pub(crate) mod p4;

use anyhow::Result;
use buildsense_sensor::RunSummary;
use buildsense_settings::BuildsenseConfig;

use crate::cli::{Cli, Commands};
use crate::config::Sink;

pub(crate) fn dispatch(cli: Cli, config: &BuildsenseConfig) -> Result<()> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Junit(args) => junit::handle(args, config, verbose),
        Commands::Issues(args) => issues::handle(args, config, verbose),
        Commands::Commits(args) => commits::handle(args, config, verbose),
        Commands::P4(args) => p4::handle(args, config, verbose),
        Commands::Diff(args) => diff::handle(args),
    }
}

/// One line per run. Dry runs keep stdout for the records.
pub(crate) fn report(summary: &RunSummary, sink: &Sink) {
    let line = format!(
        "{}: {} record(s), {} sent, {} stored offline{}",
        summary.sensor,
        summary.records,
        summary.sent,
        summary.stored_offline,
        if summary.rejected > 0 {
            format!(", {} rejected", summary.rejected)
        } else {
            String::new()
        }
    );
    match sink {
        Sink::Stdout => eprintln!("{line}"),
        Sink::Spool(_) => println!("{line}"),
    }
}
