//! Pixbatch CLI - batch crop, flatten and resize folders of images to JPEG.
//!
//! Pixbatch takes a folder of mixed raster images and writes flat
//! directories of uniformly sized JPEGs, with optional centered square
//! cropping and transparency flattened onto white.
//!
//! # Usage
//!
//! ```bash
//! # Guided run: prompts for folder, crop choice, and target sizes
//! pixbatch run
//!
//! # Fully non-interactive
//! pixbatch run ./photos --crop all --size 1200x800 --size 600x400
//!
//! # View configuration
//! pixbatch config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pixbatch - batch crop, flatten and resize folders of images to JPEG.
#[derive(Parser, Debug)]
#[command(name = "pixbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the batch pipeline over a folder of images
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

/// Load the config file, falling back to defaults on any failure.
///
/// A broken config file should not stop a batch run; logging is not up
/// yet when this runs, so the warning goes through eprintln.
fn load_config() -> pixbatch_core::Config {
    pixbatch_core::Config::load().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config: {e}\n  \
             Using default configuration. Check your config file with `pixbatch config path`."
        );
        pixbatch_core::Config::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config();
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("pixbatch v{}", pixbatch_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
