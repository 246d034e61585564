use std::path::Path;

use anyhow::{Context, Result, bail};
use buildsense_report::issue_csv::DEFAULT_TOOL;
use buildsense_report::{
    IssueCsvFormat, IssueFeedFormat, IssueLedger, ParseContext, RawReport, ReportFormat,
};
use buildsense_sensor::{SensorSettings, signal_error, transmit};
use buildsense_settings::BuildsenseConfig;
use buildsense_tstamp::now_ms;
use buildsense_types::SensorRecord;
use tracing::info;

use crate::cli::IssuesArgs;
use crate::config::{path_or, resolve_run};

pub(crate) fn handle(args: IssuesArgs, config: &BuildsenseConfig, verbose: u8) -> Result<()> {
    let run = resolve_run(&args.run, config, verbose);
    let file = &config.issues;
    let csv = path_or(args.csv.as_ref(), file.csv.as_ref());
    let feed = path_or(args.feed.as_ref(), file.feed.as_ref());
    let ledger_path = path_or(args.ledger.as_ref(), file.ledger.as_ref());
    if csv.is_none() && feed.is_none() {
        bail!("No issue input given; pass --csv and/or --feed or set them under [issues]");
    }
    let tool = args
        .tool
        .clone()
        .or_else(|| file.tool.clone())
        .unwrap_or_else(|| DEFAULT_TOOL.to_string());

    let mut ctx = ParseContext::new(now_ms());
    let mut records = Vec::new();
    let mut ledger = None;

    if let Some(csv) = &csv {
        let format = IssueCsvFormat::new(tool.as_str(), file.accounts.clone());
        match read_export(&format, csv, ledger_path.as_deref(), &mut ctx) {
            Ok((rows, updated)) => {
                records.extend(rows);
                ledger = updated;
            }
            Err(err) => signal_error(&run.settings, err)?,
        }
    }
    if let Some(feed) = &feed {
        let format = IssueFeedFormat { tool: tool.clone() };
        match parse_file(&format, feed, &mut ctx) {
            Ok(rows) => records.extend(rows),
            Err(err) => signal_error(&run.settings, err)?,
        }
    }

    let mut client = run.sink.client();
    let summary = transmit(client.as_mut(), "issues", records, &run.settings)?;
    super::report(&summary, &run.sink);

    if let (Some(ledger), Some(path)) = (ledger, ledger_path) {
        let all_delivered = summary.records == summary.sent + summary.stored_offline;
        save_ledger(&ledger, &path, all_delivered, &run.settings)?;
    }
    Ok(())
}

fn parse_file(
    format: &dyn ReportFormat,
    path: &Path,
    ctx: &mut ParseContext,
) -> Result<Vec<SensorRecord>> {
    let report = RawReport::read(path)?;
    Ok(format.parse(&report, ctx)?)
}

/// Records for the export. With a ledger only new or changed issues are
/// returned, together with the updated ledger to save after sending.
fn read_export(
    format: &IssueCsvFormat,
    csv: &Path,
    ledger_path: Option<&Path>,
    ctx: &mut ParseContext,
) -> Result<(Vec<SensorRecord>, Option<IssueLedger>)> {
    let Some(ledger_path) = ledger_path else {
        return Ok((parse_file(format, csv, ctx)?, None));
    };
    let report = RawReport::read(csv)?;
    let rows = format.rows(&report)?;
    let mut ledger = IssueLedger::load(ledger_path)?;
    let records = ledger.sync(&format.tool, &rows, ctx);
    Ok((records, Some(ledger)))
}

/// The ledger is only advanced when every record left the process, so that
/// unsent changes are detected again on the next run.
fn save_ledger(
    ledger: &IssueLedger,
    path: &Path,
    all_delivered: bool,
    settings: &SensorSettings,
) -> Result<()> {
    if !all_delivered {
        info!(path = %path.display(), "not all records were delivered, keeping previous ledger");
        return Ok(());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if let Err(err) = ledger.save(path) {
        signal_error(settings, err.into())?;
    }
    Ok(())
}
