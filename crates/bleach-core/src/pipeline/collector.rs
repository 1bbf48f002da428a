//! Single-writer aggregation of per-file outcomes.

use tokio::sync::mpsc;

use crate::types::{FileOutcome, ProgressUpdate, ScanReport, Summary};

/// Owns the run `Summary` and report list.
///
/// Outcomes arrive one at a time over a channel, so the counters need no
/// locking. Each nonzero change is forwarded to the observer as a delta.
pub struct Collector {
    summary: Summary,
    reports: Vec<ScanReport>,
    progress: Option<mpsc::Sender<ProgressUpdate>>,
}

impl Collector {
    pub fn new(progress: Option<mpsc::Sender<ProgressUpdate>>) -> Self {
        Self {
            summary: Summary::default(),
            reports: Vec::new(),
            progress,
        }
    }

    /// Drain `results` until every sender is gone.
    pub async fn run(
        mut self,
        mut results: mpsc::Receiver<FileOutcome>,
    ) -> (Summary, Vec<ScanReport>) {
        while let Some(outcome) = results.recv().await {
            self.record(outcome).await;
        }
        (self.summary, self.reports)
    }

    /// Fold one outcome into the summary.
    pub async fn record(&mut self, outcome: FileOutcome) {
        if outcome.supported {
            self.summary.total += 1;
            self.summary.processed += 1;
            self.emit(ProgressUpdate::processed(1)).await;
        }
        if let Some(error) = &outcome.error {
            tracing::warn!("{}: {}", outcome.display, error);
            self.summary.errors += 1;
            self.emit(ProgressUpdate::errors(1)).await;
        }
        if outcome.leaks > 0 {
            self.summary.leaks += outcome.leaks;
            self.emit(ProgressUpdate::leaks(outcome.leaks)).await;
        }
        if outcome.bytes_saved != 0 {
            self.summary.bytes_saved += outcome.bytes_saved;
            self.emit(ProgressUpdate::bytes_saved(outcome.bytes_saved)).await;
        }

        if outcome.supported && outcome.error.is_none() {
            self.reports.push(ScanReport {
                path: outcome.display,
                details: outcome.details,
                insights: outcome.insights,
            });
        }
    }

    async fn emit(&self, update: ProgressUpdate) {
        if let Some(tx) = &self.progress {
            // A departed observer is not an error for the run.
            let _ = tx.send(update).await;
        }
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}
