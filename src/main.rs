//! wsync - keep a workspace directory in sync with an S3 prefix.

use clap::{Parser, Subcommand};
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wsync_config::Config;
use wsync_engine::{SyncProgress, SyncResult, WorkspaceSync};

#[derive(Debug, Parser)]
#[command(name = "wsync", version, about = "Keep a workspace directory in sync with an S3 prefix")]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default one
    #[arg(long, global = true, env = "WSYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download the remote prefix into the workspace, deleting local extras
    Pull,
    /// Upload new and changed workspace files
    Push,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fatal(e),
    };
    match cli.command {
        Command::Config => {
            println!("{config}");
            ExitCode::SUCCESS
        },
        Command::Pull | Command::Push => run(&config, cli.command).await,
    }
}

async fn run(config: &Config, command: Command) -> ExitCode {
    let sync = match build(config) {
        Ok(sync) => sync,
        Err(code) => return code,
    };
    let result = match command {
        Command::Pull => sync.pull_with_progress(report).await,
        Command::Push => sync.push_with_progress(report).await,
        Command::Config => return ExitCode::SUCCESS,
    };
    match result {
        Ok(result) => summarize(&result),
        Err(e) => fatal(e),
    }
}

fn build(config: &Config) -> Result<WorkspaceSync, ExitCode> {
    let options = config.sync_options().map_err(fatal)?;
    let target = options.target().map_err(fatal)?;
    let store = config.object_store(&target).map_err(fatal)?;
    WorkspaceSync::new(options, store).map_err(fatal)
}

fn report(progress: SyncProgress) {
    tracing::debug!(
        phase = %progress.phase,
        current = progress.current,
        total = progress.total,
        percentage = progress.percentage,
        file = ?progress.current_file,
        "Progress"
    );
}

fn summarize(result: &SyncResult) -> ExitCode {
    println!(
        "downloaded {}, uploaded {}, deleted {}, skipped {}, errors {} in {:.2?}",
        result.downloaded_files.len(),
        result.uploaded_files.len(),
        result.deleted_files.len(),
        result.skipped_files.len(),
        result.errors.len(),
        result.duration,
    );
    for error in &result.errors {
        eprintln!("  {error}");
    }
    if result.success { ExitCode::SUCCESS } else { ExitCode::from(1) }
}

fn fatal(error: impl Debug) -> ExitCode {
    eprintln!("error: {error:?}");
    ExitCode::from(2)
}
