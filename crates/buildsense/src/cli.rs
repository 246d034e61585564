use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Development telemetry sensors.
#[derive(Parser, Debug)]
#[command(name = "buildsense", version, about, long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: nearest buildsense.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send JUnit XML test results.
    Junit(JunitArgs),

    /// Send issue tracker changes from a CSV export and update feed.
    Issues(IssuesArgs),

    /// Send per-file statistics of git commits.
    Commits(CommitsArgs),

    /// Send per-file statistics of Perforce changelists.
    P4(P4Args),

    /// Compare two files and print the line statistics as JSON.
    Diff(DiffArgs),
}

/// Flags shared by every sensor command.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Abort on the first error (default: true).
    #[arg(long, value_name = "BOOL")]
    pub fail_on_error: Option<bool>,

    /// Extra send attempts after a failure.
    #[arg(long, value_name = "N")]
    pub retry_attempts: Option<u32>,

    /// Seconds between send attempts.
    #[arg(long, value_name = "SECS")]
    pub retry_wait: Option<u64>,

    /// Offline spool file records are appended to.
    #[arg(long, value_name = "FILE")]
    pub spool: Option<PathBuf>,

    /// Print records as JSON lines instead of spooling them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct JunitArgs {
    /// Report files, or directories searched for *.xml reports.
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub data: Vec<PathBuf>,

    /// Source root joined with each suite's class path.
    #[arg(long, value_name = "DIR", conflicts_with = "src")]
    pub source_path: Option<PathBuf>,

    /// Source trees searched for each suite's file.
    #[arg(long, value_name = "DIR", num_args = 1..)]
    pub src: Vec<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IssuesArgs {
    /// Issue tracker CSV export.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Issue update Atom feed.
    #[arg(long, value_name = "FILE")]
    pub feed: Option<PathBuf>,

    /// Last known issue state; only new or changed issues are sent.
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Value of the Tool key.
    #[arg(long)]
    pub tool: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CommitsArgs {
    /// Repository to read.
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Revision range, e.g. v1.0..HEAD.
    #[arg(long)]
    pub range: Option<String>,

    #[arg(long, value_name = "N")]
    pub max_commits: Option<usize>,

    /// Prepended to each file path in Resource.
    #[arg(long)]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct P4Args {
    /// Depot path, e.g. //depot/project/...
    #[arg(long)]
    pub depot_path: Option<String>,

    #[arg(long)]
    pub port: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub client: Option<String>,

    #[arg(long, value_name = "N")]
    pub max_changes: Option<usize>,

    /// Ignore whitespace-only changes.
    #[arg(long)]
    pub ignore_whitespace: bool,

    /// Prepended to each depot path in Resource.
    #[arg(long)]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
}
