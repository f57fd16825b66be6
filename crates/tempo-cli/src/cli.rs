//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Uploads Timewarrior records to your Jira Tempo timesheet.
///
/// Completed records inside the sync range are matched to billing tickets
/// through their tags and submitted as Tempo worklogs. Anything that would
/// duplicate an existing worklog is skipped.
#[derive(Debug, Parser)]
#[command(name = "tempo", version, about, long_about = None)]
pub struct Cli {
    /// Date to begin uploading records from. Defaults to the end of the
    /// last submitted worklog.
    #[arg(long)]
    pub from: Option<String>,

    /// Date to upload records until. Defaults to the current time.
    #[arg(long)]
    pub until: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
