//! Run orchestration: producer, worker pool and collector.
//!
//! ```text
//! Walker ──(jobs, cap 1)──▶ W workers ──(outcomes, cap 1)──▶ Collector ──▶ observer
//! ```
//!
//! The producer and the per-file work run on the blocking pool; workers and
//! the collector are async tasks.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::cancel::CancelToken;
use super::collector::Collector;
use super::discovery::{absolute, is_within, single_file_job, Walker};
use super::processor::process_job;
use crate::config::Config;
use crate::error::{BleachError, PipelineError, PipelineResult, Result};
use crate::types::{FileOutcome, Job, Mode, ProgressUpdate, RunOptions, ScanReport, Summary};

/// Everything a run hands back.
///
/// `summary` and `reports` hold whatever completed, even when `error` is set
/// or the run was cancelled.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: Summary,
    pub reports: Vec<ScanReport>,
    /// Cancellation was requested during the run
    pub cancelled: bool,
    /// Fatal precondition or enumeration failure
    pub error: Option<BleachError>,
}

impl RunOutcome {
    fn failed(error: PipelineError) -> Self {
        Self {
            summary: Summary::default(),
            reports: Vec::new(),
            cancelled: false,
            error: Some(error.into()),
        }
    }

    /// Drop the partial results of a failed run.
    pub fn into_result(self) -> Result<(Summary, Vec<ScanReport>)> {
        match self.error {
            Some(e) => Err(e),
            None => Ok((self.summary, self.reports)),
        }
    }
}

/// The scrubbing engine.
#[derive(Debug, Clone)]
pub struct Scrubber {
    workers: usize,
    progress_buffer: usize,
}

impl Scrubber {
    pub fn new(config: &Config) -> Self {
        Self {
            workers: config.worker_count(),
            progress_buffer: config.pipeline.progress_buffer,
        }
    }

    /// Override the worker count (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Capacity to use for the progress observer channel.
    pub fn progress_buffer(&self) -> usize {
        self.progress_buffer
    }

    /// Scan or clean everything under `root`.
    pub async fn run(
        &self,
        root: &Path,
        options: &RunOptions,
        cancel: CancelToken,
        progress: Option<mpsc::Sender<ProgressUpdate>>,
    ) -> RunOutcome {
        let start = std::time::Instant::now();

        let prepared = match prepare(root, options) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!("{}", e);
                return RunOutcome::failed(e);
            }
        };
        tracing::info!(
            "Starting {:?} of {:?} with {} workers",
            options.mode,
            prepared.root,
            self.workers
        );

        let (job_tx, job_rx) = mpsc::channel::<Job>(1);
        let (result_tx, result_rx) = mpsc::channel::<FileOutcome>(1);

        let collector = tokio::spawn(Collector::new(progress.clone()).run(result_rx));

        let job_rx = Arc::new(Mutex::new(job_rx));
        let options = Arc::new(prepared.options);
        let workers: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&job_rx),
                    result_tx.clone(),
                    Arc::clone(&options),
                    cancel.clone(),
                    progress.clone(),
                ))
            })
            .collect();
        drop(result_tx);
        drop(job_rx);

        let producer = {
            let cancel = cancel.clone();
            let (root, exclude, is_dir) =
                (prepared.root.clone(), prepared.exclude, prepared.is_dir);
            tokio::task::spawn_blocking(move || produce(&root, exclude, is_dir, job_tx, &cancel))
        };

        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }
        let (summary, reports) = match collector.await {
            Ok(collected) => collected,
            Err(e) => {
                tracing::error!("Collector task failed: {}", e);
                (Summary::default(), Vec::new())
            }
        };

        let error = match producer.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(e) => Some(PipelineError::Walk {
                path: prepared.root.clone(),
                message: e.to_string(),
            }),
        };

        let cancelled = cancel.is_cancelled();
        tracing::info!(
            "Finished in {:.2?}: {} processed, {} errors, {} leaks{}",
            start.elapsed(),
            summary.processed,
            summary.errors,
            summary.leaks,
            if cancelled { " (cancelled)" } else { "" }
        );

        RunOutcome {
            summary,
            reports,
            cancelled,
            error: error.map(BleachError::from),
        }
    }
}

/// Validated run inputs.
struct Prepared {
    root: PathBuf,
    is_dir: bool,
    exclude: Option<PathBuf>,
    options: RunOptions,
}

/// Check the root and, for a separate-output clean, create the output dir.
fn prepare(root: &Path, options: &RunOptions) -> PipelineResult<Prepared> {
    let meta = std::fs::metadata(root).map_err(|source| PipelineError::RootNotFound {
        path: root.to_path_buf(),
        source,
    })?;
    let abs_root = absolute(root).map_err(|source| PipelineError::RootNotFound {
        path: root.to_path_buf(),
        source,
    })?;

    let mut options = options.clone();
    let mut exclude = None;

    if options.mode == Mode::Clean && !options.in_place {
        let output_dir = options
            .output_dir
            .as_deref()
            .ok_or(PipelineError::OutputDirRequired)?;
        let abs_out = absolute(output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        std::fs::create_dir_all(&abs_out).map_err(|source| PipelineError::OutputDir {
            path: abs_out.clone(),
            source,
        })?;

        if abs_out != abs_root && is_within(&abs_out, &abs_root) {
            tracing::debug!("Excluding output directory {:?} from the walk", abs_out);
            exclude = Some(abs_out.clone());
        }
        options.output_dir = Some(abs_out);
    }

    Ok(Prepared {
        root: abs_root,
        is_dir: meta.is_dir(),
        exclude,
        options,
    })
}

/// Enumerate jobs into the job channel.
///
/// Cancellation is checked before each hand-off. A closed channel means all
/// workers have stopped, which ends the walk quietly.
fn produce(
    root: &Path,
    exclude: Option<PathBuf>,
    is_dir: bool,
    jobs: mpsc::Sender<Job>,
    cancel: &CancelToken,
) -> PipelineResult<()> {
    let send = |job: Job| {
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        match jobs.blocking_send(job) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    };

    if is_dir {
        Walker::new(root, exclude).walk(send)
    } else {
        let _ = send(single_file_job(root));
        Ok(())
    }
}

async fn worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<FileOutcome>,
    options: Arc<RunOptions>,
    cancel: CancelToken,
    progress: Option<mpsc::Sender<ProgressUpdate>>,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let job = {
            let mut rx = jobs.lock().await;
            rx.recv().await
        };
        let Some(job) = job else { break };
        if cancel.is_cancelled() {
            break;
        }

        let options = Arc::clone(&options);
        let progress = progress.clone();
        let job_name = job.display.clone();
        let handled =
            tokio::task::spawn_blocking(move || process_job(&job, &options, progress.as_ref()))
                .await;

        match handled {
            Ok(Some(outcome)) => {
                if results.send(outcome).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Worker {} failed on {}: {}", id, job_name, e),
        }
    }
    tracing::trace!("Worker {} exiting", id);
}
