//! `tillscan`: receipt photo in, `[{name, price}]` out.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Extract line items and prices from receipt photos.
#[derive(Parser)]
#[command(name = "tillscan", author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a tillscan.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// OCR a receipt image and extract its items
    Scan(commands::ScanArgs),
    /// Extract items from already-recognized OCR text
    Parse(commands::ParseArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Scan(args) => commands::scan(args, &config).await?,
        Command::Parse(args) => commands::parse(args, &config)?,
    };
    println!("{output}");
    Ok(())
}

/// Logs go to stderr; stdout carries only the extraction result.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
