//! The `bleach scan` command: report metadata without modifying files.

use anyhow::Context;
use bleach_core::{Config, OutputFormat, OutputWriter, RunOptions};
use clap::{Args, ValueEnum};
use std::io::BufWriter;
use std::path::PathBuf;

use super::render::print_reports;
use super::run_with_progress;

/// Report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Styled listing for terminals
    Text,
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl ReportFormat {
    /// Parse the `[output] format` config value.
    fn from_config(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "jsonl" => Self::Jsonl,
            _ => Self::Text,
        }
    }

    fn writer_format(self) -> Option<OutputFormat> {
        match self {
            Self::Text => None,
            Self::Json => Some(OutputFormat::Json),
            Self::Jsonl => Some(OutputFormat::JsonLines),
        }
    }
}

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image file or directory to scan
    #[arg(required = true)]
    pub input: PathBuf,

    /// Explain what the metadata could reveal about you
    #[arg(long)]
    pub insights: bool,

    /// Report format (defaults to `[output] format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, config: &Config) -> anyhow::Result<()> {
    let options = RunOptions {
        insights: args.insights || config.scan.insights,
        ..RunOptions::scan()
    };
    let format = args
        .format
        .unwrap_or_else(|| ReportFormat::from_config(&config.output.format));

    let outcome = run_with_progress(config, &args.input, &options).await;
    let (summary, reports) = outcome
        .into_result()
        .with_context(|| format!("Scan of {} failed", args.input.display()))?;

    match format.writer_format() {
        None => print_reports(&reports),
        Some(format) => {
            let stdout = std::io::stdout();
            let mut writer =
                OutputWriter::new(BufWriter::new(stdout.lock()), format, config.output.pretty);
            writer.write_run(&reports, &summary)?;
            writer.flush()?;
        }
    }

    tracing::info!(
        "Scanned {} files ({} errors)",
        summary.processed,
        summary.errors
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_format_from_config() {
        assert_eq!(ReportFormat::from_config("json"), ReportFormat::Json);
        assert_eq!(ReportFormat::from_config("jsonl"), ReportFormat::Jsonl);
        assert_eq!(ReportFormat::from_config("text"), ReportFormat::Text);
    }

    #[test]
    fn text_has_no_writer_format() {
        assert!(ReportFormat::Text.writer_format().is_none());
        assert_eq!(
            ReportFormat::Jsonl.writer_format(),
            Some(OutputFormat::JsonLines)
        );
    }

    #[tokio::test]
    async fn scan_directory_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"plain text, not an image").unwrap();
        let args = ScanArgs {
            input: dir.path().to_path_buf(),
            insights: false,
            format: Some(ReportFormat::Json),
        };
        execute(args, &Config::default()).await.unwrap();
    }

    #[tokio::test]
    async fn scan_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScanArgs {
            input: dir.path().join("missing"),
            insights: false,
            format: None,
        };
        let err = execute(args, &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("Scan of"));
    }
}
