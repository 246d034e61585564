use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use buildsense_report::ParseContext;
use buildsense_sensor::{Sensor, execute};
use buildsense_settings::BuildsenseConfig;
use buildsense_tstamp::now_ms;
use buildsense_types::SensorRecord;
use buildsense_vcs::{commit_records, git};
use tracing::info;

use crate::cli::CommitsArgs;
use crate::config::{path_or, resolve_run};

/// Per-file statistics of the commits in a git repository.
pub(crate) struct GitSensor {
    pub repo: PathBuf,
    pub range: Option<String>,
    pub max_commits: Option<usize>,
    pub prefix: String,
}

impl Sensor for GitSensor {
    fn name(&self) -> &str {
        "commits"
    }

    fn run(&self, ctx: &mut ParseContext) -> Result<Vec<SensorRecord>> {
        if !git::git_available() {
            bail!("git is not available on PATH");
        }
        let root = git::repo_root(&self.repo)
            .with_context(|| format!("{} is not inside a git repository", self.repo.display()))?;
        let commits = git::collect_commits(&root, self.range.as_deref(), self.max_commits)?;

        let mut records = Vec::new();
        for commit in &commits {
            let stats = git::commit_file_stats(&root, commit)
                .with_context(|| format!("Failed to read files of commit {}", commit.commit.id))?;
            records.extend(commit_records(
                git::TOOL,
                &commit.commit,
                &stats,
                &self.prefix,
                &mut ctx.tstamps,
            ));
        }
        info!(commits = commits.len(), records = records.len(), "git history read");
        Ok(records)
    }
}

pub(crate) fn handle(args: CommitsArgs, config: &BuildsenseConfig, verbose: u8) -> Result<()> {
    let run = resolve_run(&args.run, config, verbose);
    let file = &config.commits;
    let sensor = GitSensor {
        repo: path_or(args.repo.as_ref(), file.repo.as_ref()).unwrap_or_else(|| PathBuf::from(".")),
        range: args.range.or_else(|| file.range.clone()),
        max_commits: args.max_commits.or(file.max_commits),
        prefix: args
            .prefix
            .or_else(|| file.prefix.clone())
            .unwrap_or_default(),
    };
    let mut ctx = ParseContext::new(now_ms());
    let mut client = run.sink.client();
    let summary = execute(&sensor, client.as_mut(), &mut ctx, &run.settings)?;
    super::report(&summary, &run.sink);
    Ok(())
}
