//! Core data types for the bleach scrubbing pipeline.
//!
//! These types describe what goes into a run (`RunOptions`, `Job`), what each
//! worker produces (`FileOutcome`), and what the run hands back (`Summary`,
//! `ScanReport`, `ProgressUpdate`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::PipelineError;
use crate::formats::Kind;
use crate::privacy::Category;

/// What a run does with each supported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Report metadata without touching files
    #[default]
    Scan,
    /// Write metadata-free copies
    Clean,
}

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: Mode,

    /// Overwrite sources instead of writing to `output_dir`
    pub in_place: bool,

    /// Destination root for clean mode when not in place
    pub output_dir: Option<PathBuf>,

    /// Keep embedded ICC colour profiles when cleaning
    pub preserve_icc: bool,

    /// Derive insights in scan mode
    pub insights: bool,
}

impl RunOptions {
    pub fn scan() -> Self {
        Self::default()
    }

    pub fn clean_into(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::Clean,
            output_dir: Some(output_dir.into()),
            ..Self::default()
        }
    }

    pub fn clean_in_place() -> Self {
        Self {
            mode: Mode::Clean,
            in_place: true,
            ..Self::default()
        }
    }
}

/// One regular file to process. Created once by the walker, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Absolute source path
    pub path: PathBuf,
    /// Path relative to the scan root
    pub rel_path: PathBuf,
    /// Name shown in reports
    pub display: String,
}

/// Outcome of processing one job.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub display: String,
    pub kind: Option<Kind>,
    /// The file was recognized as JPEG, PNG or TIFF
    pub supported: bool,
    pub error: Option<PipelineError>,
    pub leaks: usize,
    /// Source size minus cleaned size; may be zero or negative
    pub bytes_saved: i64,
    pub details: Vec<ScanDetail>,
    pub insights: Vec<ScanInsight>,
}

impl FileOutcome {
    pub fn new(job: &Job) -> Self {
        Self {
            display: job.display.clone(),
            ..Self::default()
        }
    }

    pub fn failed(mut self, error: PipelineError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Run-wide counters, written only by the collector.
///
/// `total` and `processed` always move together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Supported files seen
    pub total: usize,
    /// Supported files handled
    pub processed: usize,
    /// Files whose outcome carried an error
    pub errors: usize,
    /// GPS plus serial-number tags found
    pub leaks: usize,
    /// Bytes removed across all cleaned files
    pub bytes_saved: i64,
}

/// Scan output for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub path: String,
    pub details: Vec<ScanDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<ScanInsight>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.details.is_empty()
    }
}

/// Values found for one privacy category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDetail {
    pub category: Category,
    pub values: Vec<String>,
}

impl ScanDetail {
    pub fn new(category: Category, values: Vec<String>) -> Self {
        Self { category, values }
    }
}

/// Kind of a derived insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightKind {
    Location,
    Device,
    Timeline,
    Identifier,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Location => "Location",
            Self::Device => "Device",
            Self::Timeline => "Timeline",
            Self::Identifier => "Identifier",
        };
        f.write_str(name)
    }
}

/// A human-readable statement inferred from scan details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInsight {
    pub kind: InsightKind,
    pub message: String,
}

impl ScanInsight {
    pub fn new(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Delta record streamed to a progress observer.
///
/// Observers must only ever add these up; any field may be zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub leaks: usize,
    pub bytes_saved: i64,
}

impl ProgressUpdate {
    pub fn total(n: usize) -> Self {
        Self {
            total: n,
            ..Self::default()
        }
    }

    pub fn processed(n: usize) -> Self {
        Self {
            processed: n,
            ..Self::default()
        }
    }

    pub fn errors(n: usize) -> Self {
        Self {
            errors: n,
            ..Self::default()
        }
    }

    pub fn leaks(n: usize) -> Self {
        Self {
            leaks: n,
            ..Self::default()
        }
    }

    pub fn bytes_saved(n: i64) -> Self {
        Self {
            bytes_saved: n,
            ..Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Observer-side running totals built from `ProgressUpdate` deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTotals {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub leaks: usize,
    pub bytes_saved: i64,
}

impl ProgressTotals {
    pub fn apply(&mut self, update: &ProgressUpdate) {
        self.total += update.total;
        self.processed += update.processed;
        self.errors += update.errors;
        self.leaks += update.leaks;
        self.bytes_saved += update.bytes_saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_totals_ignore_zero_fields() {
        let mut totals = ProgressTotals::default();
        totals.apply(&ProgressUpdate::total(1));
        totals.apply(&ProgressUpdate::default());
        totals.apply(&ProgressUpdate::processed(1));
        totals.apply(&ProgressUpdate::bytes_saved(-12));
        totals.apply(&ProgressUpdate::leaks(3));

        assert_eq!(
            totals,
            ProgressTotals {
                total: 1,
                processed: 1,
                errors: 0,
                leaks: 3,
                bytes_saved: -12,
            }
        );
        assert!(ProgressUpdate::default().is_zero());
        assert!(!ProgressUpdate::errors(1).is_zero());
    }

    #[test]
    fn test_scan_report_serde() {
        let report = ScanReport {
            path: "a.jpg".to_string(),
            details: vec![ScanDetail::new(
                Category::DeviceModel,
                vec!["Model=TestCam".to_string()],
            )],
            insights: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"category\":\"Device Model\""));
        assert!(!json.contains("insights"));

        let parsed: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_serial_category_name() {
        let json = serde_json::to_string(&Category::Identifier).unwrap();
        assert_eq!(json, "\"Serial Numbers\"");
    }
}
