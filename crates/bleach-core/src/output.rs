//! Machine-readable report output in JSON or JSON Lines.
//!
//! JSON writes one document `{"reports": [...], "summary": {...}}`. JSON Lines
//! writes one report per line followed by a final `{"summary": {...}}` line,
//! so a consumer can stream reports as they arrive.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{ScanReport, Summary};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RunDocument<'a> {
    reports: &'a [ScanReport],
    summary: &'a Summary,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: &'a Summary,
}

/// Serializes scan reports and run summaries.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    fn write_value<T: Serialize + ?Sized>(&mut self, value: &T, pretty: bool) -> io::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    /// Write one report as a standalone line or document.
    pub fn write_report(&mut self, report: &ScanReport) -> io::Result<()> {
        let pretty = self.pretty && self.format == OutputFormat::Json;
        self.write_value(report, pretty)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write the reports and summary of a finished run.
    pub fn write_run(&mut self, reports: &[ScanReport], summary: &Summary) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let doc = RunDocument { reports, summary };
                self.write_value(&doc, self.pretty)?;
                self.items_written += reports.len();
            }
            OutputFormat::JsonLines => {
                for report in reports {
                    self.write_report(report)?;
                }
                self.write_value(&SummaryLine { summary }, false)?;
            }
        }
        Ok(())
    }

    /// Number of reports written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
