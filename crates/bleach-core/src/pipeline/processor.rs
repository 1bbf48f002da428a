//! Per-job work: open, sniff, then scan or clean one file.
//!
//! Everything here is synchronous and runs on the blocking pool. The file
//! handle never leaves the call that opened it.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use tokio::sync::mpsc;

use super::replace::{resolve_destination, write_atomically};
use crate::error::{FormatError, PipelineError, PipelineResult};
use crate::formats::{sniff, strip_jpeg, strip_png, Kind};
use crate::privacy::{analyze_exif, analyze_png, build_insights};
use crate::types::{FileOutcome, Job, Mode, ProgressUpdate, RunOptions, ScanDetail};

/// Process one job.
///
/// Returns `None` for unrecognized files, which are skipped silently. A
/// recognized file reports `total += 1` to `progress` before the work starts.
pub fn process_job(
    job: &Job,
    options: &RunOptions,
    progress: Option<&mpsc::Sender<ProgressUpdate>>,
) -> Option<FileOutcome> {
    let outcome = FileOutcome::new(job);

    let mut file = match File::open(&job.path) {
        Ok(file) => file,
        Err(source) => {
            return Some(outcome.failed(PipelineError::Open {
                path: job.path.clone(),
                source,
            }))
        }
    };

    let kind = match sniff(&mut file) {
        Ok(kind) => kind,
        Err(source) => {
            return Some(outcome.failed(PipelineError::Sniff {
                path: job.path.clone(),
                source,
            }))
        }
    };
    if !kind.is_supported() {
        tracing::trace!("Skipping unrecognized file {:?}", job.path);
        return None;
    }

    let mut outcome = FileOutcome {
        kind: Some(kind),
        supported: true,
        ..outcome
    };
    if let Some(tx) = progress {
        let _ = tx.blocking_send(ProgressUpdate::total(1));
    }
    tracing::debug!("Processing {} ({})", job.display, kind);

    match options.mode {
        Mode::Scan => match scan_file(&mut file, kind) {
            Ok(details) => {
                if options.insights {
                    outcome.insights = build_insights(&details);
                }
                outcome.details = details;
            }
            Err(source) => {
                return Some(outcome.failed(PipelineError::Analyze {
                    path: job.path.clone(),
                    source,
                }))
            }
        },
        Mode::Clean => {
            match count_leaks(&mut file, kind) {
                Ok(leaks) => outcome.leaks = leaks,
                Err(source) => {
                    return Some(outcome.failed(PipelineError::Analyze {
                        path: job.path.clone(),
                        source,
                    }))
                }
            }
            match clean_file(&mut file, job, kind, options) {
                Ok(saved) => outcome.bytes_saved = saved,
                Err(e) => return Some(outcome.failed(e)),
            }
        }
    }

    Some(outcome)
}

/// Scan details for a recognized file.
pub fn scan_file(file: &mut File, kind: Kind) -> Result<Vec<ScanDetail>, FormatError> {
    match kind {
        Kind::Jpeg | Kind::Tiff => Ok(analyze_exif(file)?.details()),
        Kind::Png => Ok(analyze_png(file)?.details()),
        Kind::Unknown => Ok(Vec::new()),
    }
}

/// GPS plus serial-number tags, the metric reported when cleaning.
pub fn count_leaks(file: &mut File, kind: Kind) -> Result<usize, FormatError> {
    match kind {
        Kind::Jpeg | Kind::Tiff => Ok(analyze_exif(file)?.leak_count()),
        Kind::Png => Ok(analyze_png(file)?.leak_count()),
        Kind::Unknown => Ok(0),
    }
}

/// Strip `file` into its destination and return the bytes saved.
pub fn clean_file(
    file: &mut File,
    job: &Job,
    kind: Kind,
    options: &RunOptions,
) -> PipelineResult<i64> {
    let strip: fn(&mut File, &mut File, bool) -> Result<(), FormatError> = match kind {
        Kind::Jpeg => |src: &mut File, dst: &mut File, icc: bool| strip_jpeg(src, dst, icc),
        Kind::Png => |src: &mut File, dst: &mut File, icc: bool| strip_png(src, dst, icc),
        Kind::Tiff | Kind::Unknown => {
            return Err(PipelineError::UnsupportedFormat {
                path: job.path.clone(),
                format: kind.to_string(),
            })
        }
    };

    let replace_err = |source| PipelineError::Replace {
        path: job.path.clone(),
        source,
    };

    let src_meta = file.metadata().map_err(replace_err)?;
    let dest = resolve_destination(job, options)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(replace_err)?;
    }
    file.seek(SeekFrom::Start(0)).map_err(replace_err)?;

    write_atomically(&dest, src_meta.permissions(), |tmp| {
        strip(file, tmp, options.preserve_icc).map_err(|source| PipelineError::Strip {
            path: job.path.clone(),
            source,
        })
    })?;

    let out_len = fs::metadata(&dest).map_err(replace_err)?.len();
    tracing::debug!(
        "Cleaned {} -> {:?} ({} -> {} bytes)",
        job.display,
        dest,
        src_meta.len(),
        out_len
    );
    Ok(src_meta.len() as i64 - out_len as i64)
}
