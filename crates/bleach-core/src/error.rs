//! Error types for the bleach scrubbing engine.
//!
//! Errors are split by layer: container-level parse failures (`FormatError`),
//! pipeline failures that are either fatal to a run or scoped to one file
//! (`PipelineError`), and configuration problems (`ConfigError`).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for bleach operations.
#[derive(Error, Debug)]
pub enum BleachError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Malformed or unreadable container data.
///
/// Raised by the sniffer, the strippers and the analyzers. These know nothing
/// about file paths; the pipeline wraps them with the offending path.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Fewer than 8 bytes were available for signature detection
    #[error("header too short ({0} bytes)")]
    TruncatedHeader(usize),

    /// Stream does not start with FF D8
    #[error("invalid JPEG SOI marker")]
    InvalidJpegSoi,

    /// Stream does not start with the 8-byte PNG signature
    #[error("invalid PNG signature")]
    InvalidPngSignature,

    /// Segment length field smaller than its own two bytes
    #[error("invalid JPEG segment length {length} for marker 0x{marker:02X}")]
    InvalidSegmentLength { marker: u8, length: u16 },

    /// The EXIF decoder rejected the payload
    #[error("EXIF decode failed: {0}")]
    Exif(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pipeline errors.
///
/// `RootNotFound`, `Walk`, `OutputDir` and `OutputDirRequired` abort a run.
/// Every other variant is recorded on a single file's outcome.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input root does not exist or cannot be stat'ed
    #[error("Input path not found: {path}: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory enumeration failed
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Clean mode without --inplace needs somewhere to write
    #[error("Output directory required when not cleaning in place")]
    OutputDirRequired,

    /// File could not be opened
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Signature could not be read (empty or truncated file)
    #[error("Cannot detect format of {path}: {source}")]
    Sniff {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Metadata analysis failed
    #[error("Metadata analysis failed for {path}: {source}")]
    Analyze {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Stripping failed
    #[error("Strip failed for {path}: {source}")]
    Strip {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Destination path is unusable (e.g. it is the source itself)
    #[error("Invalid destination for {path}: {message}")]
    Destination { path: PathBuf, message: String },

    /// Format recognized but cleaning is not implemented for it
    #[error("Unsupported format for {path}: {format} stripping not implemented")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Temp file creation, permission copy, fsync or rename failed
    #[error("Failed to replace {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether this error aborts the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound { .. }
                | Self::Walk { .. }
                | Self::OutputDir { .. }
                | Self::OutputDirRequired
        )
    }
}

/// Convenience type alias for bleach results.
pub type Result<T> = std::result::Result<T, BleachError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PipelineError::OutputDirRequired.is_fatal());
        assert!(PipelineError::Walk {
            path: PathBuf::from("/photos"),
            message: "permission denied".into(),
        }
        .is_fatal());
        assert!(!PipelineError::Destination {
            path: PathBuf::from("/photos/a.jpg"),
            message: "same file".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_segment_length_message() {
        let err = FormatError::InvalidSegmentLength {
            marker: 0xE1,
            length: 1,
        };
        assert_eq!(
            err.to_string(),
            "invalid JPEG segment length 1 for marker 0xE1"
        );
    }
}
