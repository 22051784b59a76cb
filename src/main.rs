use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, error};

use pgvault::config::Config;
use pgvault::ops::{self, OperationRequest};
use pgvault::workflow::OperationKind;

/// Backup, restore and archive PostgreSQL servers
#[derive(Parser)]
#[command(name = "pgvault")]
#[command(about = "Backup, restore and archive orchestration agent for PostgreSQL", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = "pgvault.toml")]
    config: PathBuf,

    /// Write the 4-byte operation status code to this path instead of only
    /// reflecting it in the exit code
    #[arg(long, global = true)]
    status_to: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a base backup of a server
    Backup {
        /// Server name from the configuration
        server: String,
    },
    /// Restore a backup into a directory
    Restore {
        /// Server name from the configuration
        server: String,
        /// Backup identifier: newest, oldest, or an explicit label
        #[arg(short, long, default_value = "newest")]
        id: String,
        /// Directory to restore into
        #[arg(short, long)]
        directory: PathBuf,
    },
    /// Restore a backup and package it as a tar.gz archive
    Archive {
        /// Server name from the configuration
        server: String,
        /// Backup identifier: newest, oldest, or an explicit label
        #[arg(short, long, default_value = "newest")]
        id: String,
        /// Directory to place the archive in
        #[arg(short, long)]
        directory: PathBuf,
    },
    /// Re-check a backup against its recorded manifest
    Verify {
        /// Server name from the configuration
        server: String,
        /// Backup identifier: newest, oldest, or an explicit label
        #[arg(short, long, default_value = "newest")]
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("pgvault started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;

    let mut channel: Box<dyn Write> = match &cli.status_to {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::sink()),
    };

    let succeeded = match &cli.command {
        Commands::Backup { server } => ops::run(
            &config,
            OperationKind::Backup,
            server,
            &OperationRequest::default(),
            &mut channel,
        )?,
        Commands::Restore {
            server,
            id,
            directory,
        } => ops::run(
            &config,
            OperationKind::Restore,
            server,
            &OperationRequest {
                identifier: Some(id),
                directory: Some(directory),
            },
            &mut channel,
        )?,
        Commands::Archive {
            server,
            id,
            directory,
        } => ops::run(
            &config,
            OperationKind::Archive,
            server,
            &OperationRequest {
                identifier: Some(id),
                directory: Some(directory),
            },
            &mut channel,
        )?,
        Commands::Verify { server, id } => ops::run(
            &config,
            OperationKind::Verify,
            server,
            &OperationRequest {
                identifier: Some(id),
                directory: None,
            },
            &mut channel,
        )?,
    };
    drop(channel);

    if !succeeded {
        anyhow::bail!("operation failed; see log for details");
    }
    Ok(())
}
