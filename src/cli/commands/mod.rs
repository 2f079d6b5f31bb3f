//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod capture;
mod normalize;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "likecap")]
#[command(about = "Capture a profile's liked posts and normalize them into flat records")]
#[command(version)]
pub struct Cli {
    /// Config file path (default: likecap.toml in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll a profile's likes timeline and save the matching API responses
    Capture(capture::CaptureArgs),

    /// Flatten captured responses into a JSON array of records
    Normalize(normalize::NormalizeArgs),
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Capture(args) => capture::cmd_capture(settings, args).await,
        Commands::Normalize(args) => normalize::cmd_normalize(args),
    }
}
