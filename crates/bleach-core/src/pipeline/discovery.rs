//! Job production: turn an input root into one `Job` per regular file.

use std::io;
use std::ops::ControlFlow;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};
use crate::types::Job;

/// Recursive directory walker that emits jobs.
///
/// Symlinks are not followed and only regular files become jobs. The
/// `exclude` directory (clean-mode output inside the root) is never entered.
pub struct Walker {
    root: PathBuf,
    exclude: Option<PathBuf>,
}

impl Walker {
    /// `root` and `exclude` are expected to be absolute.
    pub fn new(root: impl Into<PathBuf>, exclude: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude,
        }
    }

    /// Walk the tree in file-name order, handing each job to `emit`.
    ///
    /// `emit` returning `Break` stops the walk early without error. Any
    /// traversal failure aborts the walk.
    pub fn walk<F>(&self, mut emit: F) -> PipelineResult<()>
    where
        F: FnMut(Job) -> ControlFlow<()>,
    {
        let exclude = self.exclude.as_deref();
        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match exclude {
                Some(dir) => !(entry.file_type().is_dir() && is_within(entry.path(), dir)),
                None => true,
            });

        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::Walk {
                path: e.path().unwrap_or(&self.root).to_path_buf(),
                message: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_path_buf();
            let rel_path = path
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            let job = Job {
                display: rel_path.display().to_string(),
                path,
                rel_path,
            };

            if emit(job).is_break() {
                tracing::debug!("Walk of {:?} stopped early", self.root);
                break;
            }
        }

        Ok(())
    }
}

/// The single job for a file given directly as the input root.
pub fn single_file_job(path: &Path) -> Job {
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf());
    Job {
        path: path.to_path_buf(),
        display: name.display().to_string(),
        rel_path: name,
    }
}

/// Whether `path` equals `root` or lies beneath it, comparing components.
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Absolute, lexically normalized form of `path` (`.` dropped, `..` folded).
///
/// Does not touch the filesystem beyond reading the working directory.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
