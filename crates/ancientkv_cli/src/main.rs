//! AncientKV CLI
//!
//! Serves a store read-only over RPC.
//!
//! # Commands
//!
//! - `serve` - Open the store and serve it until interrupted
//! - `inspect` - Print store statistics
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// AncientKV read-only database server.
#[derive(Parser, Debug)]
#[command(name = "ancientkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `info` or `ancientkv_server=debug`
    #[arg(global = true, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(global = true, long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose output (same as `--log-level debug`)
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the store over RPC until interrupted
    Serve(commands::serve::ServeArgs),

    /// Print store statistics
    Inspect(commands::StoreArgs),

    /// Show version information
    Version,
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&cli.log_level)?
    };

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args).await?,
        Commands::Inspect(store) => commands::inspect::run(&store)?,
        Commands::Version => {
            println!("AncientKV CLI v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "RPC API {} v{}",
                ancientkv_server::API_NAMESPACE,
                ancientkv_server::API_VERSION
            );
        }
    }

    Ok(())
}
