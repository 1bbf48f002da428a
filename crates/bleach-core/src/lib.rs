//! Bleach Core - metadata scanning and stripping for JPEG, PNG and TIFF.
//!
//! Bleach walks a file or directory, recognizes images by their signature
//! (never by extension), and either reports the privacy-sensitive metadata it
//! finds or writes copies with that metadata removed. Pixel data is never
//! decoded or re-encoded.
//!
//! # Architecture
//!
//! ```text
//! Walker → Job queue → Workers (sniff → analyze → strip) → Collector → Summary
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use bleach_core::{CancelToken, Config, RunOptions, Scrubber};
//!
//! #[tokio::main]
//! async fn main() -> bleach_core::Result<()> {
//!     let config = Config::load()?;
//!     let scrubber = Scrubber::new(&config);
//!
//!     let outcome = scrubber
//!         .run("./photos".as_ref(), &RunOptions::scan(), CancelToken::new(), None)
//!         .await;
//!     let (summary, reports) = outcome.into_result()?;
//!     println!("{} files, {} with metadata", summary.processed, reports.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod output;
pub mod pipeline;
pub mod privacy;
pub mod types;

pub use config::Config;
pub use error::{BleachError, ConfigError, FormatError, PipelineError, PipelineResult, Result};
pub use formats::Kind;
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{CancelToken, RunOutcome, Scrubber};
pub use privacy::Category;
pub use types::{
    InsightKind, Mode, ProgressTotals, ProgressUpdate, RunOptions, ScanDetail, ScanInsight,
    ScanReport, Summary,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
