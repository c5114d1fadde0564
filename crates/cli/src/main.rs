//! Mural CLI - mural command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

mod cmd;
mod system_config;

/// Mural - a shared pixel canvas
#[derive(Parser)]
#[command(name = "mural")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/mural/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write daily log files here instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the board until interrupted
    Run,
    /// Show the stored board and token count
    Info,
    /// Write the stored board to a file
    Export {
        /// Output file
        out: PathBuf,
        /// Prefix a binary PPM (P6) header
        #[arg(long)]
        ppm: bool,
    },
    /// View and edit the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show every setting
    List,
    /// Print one setting (e.g. board.width)
    Get {
        key: String,
    },
    /// Change one setting
    Set {
        key: String,
        value: String,
    },
    /// Print the config file location
    Path {
        /// Write the defaults if the file does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example file
    Example,
}

fn init_tracing(log_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("mural")
                .filename_suffix("log")
                .build(dir)
                .with_context(|| format!("Failed to open log directory: {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            // stderr keeps stdout clean for `config get` and friends
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Guard flushes buffered log lines on exit
    let _guard = init_tracing(cli.log_dir.as_deref(), cli.verbose)?;

    let config_path = system_config::resolve_path(cli.config)?;

    match cli.command {
        Commands::Run => cmd::run::run(&config_path).await,
        Commands::Info => cmd::info::run(&config_path).await,
        Commands::Export { out, ppm } => cmd::export::run(&config_path, &out, ppm).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list(&config_path).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&config_path, &key).await,
            ConfigCommands::Set { key, value } => {
                cmd::config::run_set(&config_path, &key, &value).await
            }
            ConfigCommands::Path { create } => cmd::config::run_path(&config_path, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
