use anyhow::{Result, bail};
use buildsense_path::ClassPathResolver;
use buildsense_report::{JunitFormat, ParseContext, ResourceResolver};
use buildsense_sensor::{ReportSensor, execute, report_files};
use buildsense_settings::BuildsenseConfig;
use buildsense_tstamp::now_ms;

use crate::cli::JunitArgs;
use crate::config::{path_or, paths_or, resolve_run};

pub(crate) fn handle(args: JunitArgs, config: &BuildsenseConfig, verbose: u8) -> Result<()> {
    let run = resolve_run(&args.run, config, verbose);
    let data = paths_or(&args.data, config.junit.data.as_ref());
    if data.is_empty() {
        bail!("No JUnit reports given; pass --data or set [junit] data");
    }

    let src = paths_or(&args.src, config.junit.src.as_ref());
    let resolver = match path_or(args.source_path.as_ref(), config.junit.source_path.as_ref()) {
        Some(root) => ResourceResolver::SourceRoot(root),
        None if !src.is_empty() => ResourceResolver::Classes(ClassPathResolver::from_roots(&src)?),
        None => ResourceResolver::None,
    };

    let sensor = ReportSensor {
        name: "junit".to_string(),
        format: JunitFormat,
        files: report_files(&data, ".xml")?,
    };
    let mut ctx = ParseContext::new(now_ms()).with_resolver(resolver);
    let mut client = run.sink.client();
    let summary = execute(&sensor, client.as_mut(), &mut ctx, &run.settings)?;
    super::report(&summary, &run.sink);
    Ok(())
}
