//! Bleach CLI - strip identifying metadata from JPEG and PNG images.
//!
//! Bleach reports the GPS coordinates, device details, capture timestamps and
//! serial numbers embedded in images, and writes copies with that metadata
//! removed. Pixel data is copied byte-for-byte.
//!
//! # Usage
//!
//! ```bash
//! # Report what a folder of photos gives away
//! bleach scan ./photos --insights
//!
//! # Write scrubbed copies to ./bleached
//! bleach clean ./photos
//!
//! # Scrub in place
//! bleach clean -i ./photos
//!
//! # View configuration
//! bleach config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Bleach - strip identifying metadata from images.
#[derive(Parser, Debug)]
#[command(name = "bleach")]
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
    /// Report privacy metadata without modifying files
    Scan(cli::scan::ScanArgs),

    /// Strip EXIF/XMP/IPTC metadata from images
    Clean(cli::clean::CleanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go straight to stderr.
    let config = match bleach_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `bleach config path`."
            );
            bleach_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Bleach v{}", bleach_core::VERSION);

    match cli.command {
        Commands::Scan(args) => cli::scan::execute(args, &config).await,
        Commands::Clean(args) => cli::clean::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
