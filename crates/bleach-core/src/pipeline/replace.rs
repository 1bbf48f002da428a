//! Destination resolution and crash-safe replacement.
//!
//! Output is written to a hidden temp file beside the destination (same
//! filesystem), given the source's permission bits, fsynced, closed and then
//! renamed over the destination. The source is never touched before that
//! final rename succeeds.

use std::fs::{self, File, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, PathPersistError, TempPath};

use super::discovery::absolute;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{Job, RunOptions};

const TEMP_PREFIX: &str = ".bleach-";
const TEMP_SUFFIX: &str = ".tmp";

/// Where the cleaned copy of `job` goes.
///
/// In place: the source itself. Otherwise `output_dir/rel_path`, rejected
/// when that is the source file.
pub fn resolve_destination(job: &Job, options: &RunOptions) -> PipelineResult<PathBuf> {
    if options.in_place {
        return Ok(job.path.clone());
    }
    let output_dir = options
        .output_dir
        .as_ref()
        .ok_or(PipelineError::OutputDirRequired)?;

    let dest = output_dir.join(&job.rel_path);
    if same_file(&dest, &job.path) {
        return Err(PipelineError::Destination {
            path: job.path.clone(),
            message: "output path resolves to the input file; use --inplace or a different --output"
                .to_string(),
        });
    }
    Ok(dest)
}

/// Canonical comparison when `dest` exists, lexical otherwise.
fn same_file(dest: &Path, source: &Path) -> bool {
    if dest.exists() {
        if let (Ok(a), Ok(b)) = (dest.canonicalize(), source.canonicalize()) {
            return a == b;
        }
    }
    match (absolute(dest), absolute(source)) {
        (Ok(a), Ok(b)) => a == b,
        _ => dest == source,
    }
}

/// Write `dest` through a temp file in its directory and rename it into place.
///
/// `write` fills the temp file. On any failure the temp file is removed and
/// `dest` is left as it was.
pub fn write_atomically<F>(dest: &Path, permissions: Permissions, write: F) -> PipelineResult<()>
where
    F: FnOnce(&mut File) -> PipelineResult<()>,
{
    let replace_err = |source: io::Error| PipelineError::Replace {
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(replace_err)?;

    tmp.as_file().set_permissions(permissions).map_err(replace_err)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all().map_err(replace_err)?;

    // Closes the handle; the path is still removed on drop until persisted.
    let tmp_path = tmp.into_temp_path();
    persist(tmp_path, dest).map_err(replace_err)
}

/// Rename over `dest`; if that fails, remove `dest` and retry once.
fn persist(tmp_path: TempPath, dest: &Path) -> io::Result<()> {
    match tmp_path.persist(dest) {
        Ok(()) => Ok(()),
        Err(PathPersistError { error, path }) => {
            tracing::debug!("Rename onto {:?} failed ({}), retrying", dest, error);
            match fs::remove_file(dest) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            path.persist(dest).map_err(|e| e.error)
        }
    }
}
