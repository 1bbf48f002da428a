//! The `bleach clean` command: write metadata-free images.

use anyhow::Context;
use bleach_core::pipeline::discovery::absolute;
use bleach_core::{Config, RunOptions};
use clap::Args;
use std::path::PathBuf;

use super::render::render_summary;
use super::run_with_progress;

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Image file or directory to clean
    #[arg(required = true)]
    pub input: PathBuf,

    /// Modify files in place
    #[arg(short = 'i', long = "inplace", conflicts_with = "output")]
    pub in_place: bool,

    /// Destination folder for sanitized copies (defaults to `[clean] output_dir`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Preserve ICC color profiles
    #[arg(long)]
    pub preserve_icc: bool,
}

impl CleanArgs {
    fn run_options(&self, config: &Config) -> RunOptions {
        let base = if self.in_place {
            RunOptions::clean_in_place()
        } else {
            let output = self.output.clone().unwrap_or_else(|| config.output_dir());
            RunOptions::clean_into(output)
        };
        RunOptions {
            preserve_icc: self.preserve_icc || config.clean.preserve_icc,
            ..base
        }
    }
}

/// Execute the clean command.
pub async fn execute(args: CleanArgs, config: &Config) -> anyhow::Result<()> {
    let options = args.run_options(config);

    let outcome = run_with_progress(config, &args.input, &options).await;
    let (summary, _) = outcome
        .into_result()
        .with_context(|| format!("Clean of {} failed", args.input.display()))?;

    println!("{}", render_summary(&summary));
    match &options.output_dir {
        None => println!("In-place clean complete."),
        Some(dir) => {
            let shown = absolute(dir).unwrap_or_else(|_| dir.clone());
            println!("Cleaned files written to: {}", shown.display());
            println!("Note: originals are unchanged unless --inplace is used.");
        }
    }

    if summary.errors > 0 {
        tracing::warn!("{} files could not be cleaned; see the log above", summary.errors);
    }
    Ok(())
}
