use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed project and task tracker.
/// Storage lives in the data directory of the selected environment preset.
#[derive(Parser)]
#[command(name = "tm", version, about = "Project and task tracking CLI")]
pub struct Cli {
    /// Configuration preset: development | testing | production.
    #[arg(long, global = true, env = "TM_ENV", default_value = "development")]
    pub env: String,

    /// Override the preset's data directory.
    #[arg(long, global = true, env = "TM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Act as this user (owner of new projects, assignee of new tasks).
    #[arg(long, global = true, env = "TM_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
