//! `tm` - project and task tracking from the command line.
//!
//! ## Key Commands
//!
//! - `tm demo` - Create a sample team setup and print its report
//! - `tm project add <name>` - Create a project owned by `--user`
//! - `tm task add <title> --project <id>` - Create a task with optional due date and tags
//! - `tm task list --mine` - View tasks assigned to `--user`
//! - `tm stats <project>` - Completion statistics for a project
//! - `tm overdue` - Open tasks past their due date
//!
//! Data is stored in the data directory of the selected preset (`--env`, default
//! `development` -> `./data/dev`) unless `--data-dir` points elsewhere.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use task_manager::cli::Cli;
use task_manager::cmd::*;
use task_manager::error::exit_codes;
use task_manager::utils::validate_username;
use task_manager::{Config, Error, Result, Store, TaskManager};

fn init_tracing(default_level: &str) {
    // RUST_LOG wins when it parses; otherwise fall back to the preset's level.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }
    if let Commands::Config = cli.command {
        return cmd_config(config);
    }

    let store = Store::from_config(config)?;
    debug!(data_dir = %store.data_dir().display(), "opened store");
    let mut manager = TaskManager::new(store);
    if let Some(user) = cli.user {
        if !validate_username(&user) {
            return Err(Error::InvalidArgument(format!(
                "invalid user name '{user}': use 3-20 letters, digits or underscores"
            )));
        }
        manager.set_current_user(user);
    }

    match cli.command {
        Commands::Demo => cmd_demo(&mut manager),
        Commands::Project { action } => cmd_project(&mut manager, config, action),
        Commands::Task { action } => cmd_task(&mut manager, config, action),
        Commands::Stats { project } => cmd_stats(&manager, project),
        Commands::Overdue => {
            cmd_overdue(&manager, config);
            Ok(())
        }
        Commands::Config | Commands::Completions { .. } => unreachable!("handled above"),
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = Config::for_environment(&cli.env);
    if let Some(dir) = cli.data_dir.as_ref() {
        config = config.with_data_dir(dir);
    }
    init_tracing(&config.log_level);

    match run(cli, &config) {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
