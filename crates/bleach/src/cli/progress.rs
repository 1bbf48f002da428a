//! Progress bar fed by the engine's `ProgressUpdate` stream.

use bleach_core::{ProgressTotals, ProgressUpdate};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Owns the bar and the task draining the update channel.
pub struct ProgressReporter {
    handle: JoinHandle<ProgressTotals>,
}

impl ProgressReporter {
    /// Start draining `updates` into a progress bar on stderr.
    ///
    /// The bar length grows as files are recognized, since the total is not
    /// known up front.
    pub fn spawn(mut updates: mpsc::Receiver<ProgressUpdate>) -> Self {
        let bar = create_progress_bar();
        let handle = tokio::spawn(async move {
            let mut totals = ProgressTotals::default();
            while let Some(update) = updates.recv().await {
                if update.is_zero() {
                    continue;
                }
                totals.apply(&update);
                bar.inc_length(update.total as u64);
                bar.inc(update.processed as u64);
                bar.set_message(status_message(&totals));
            }
            bar.finish_and_clear();
            totals
        });
        Self { handle }
    }

    /// Wait for the channel to close and return the observed totals.
    pub async fn finish(self) -> ProgressTotals {
        match self.handle.await {
            Ok(totals) => totals,
            Err(e) => {
                tracing::debug!("Progress task failed: {}", e);
                ProgressTotals::default()
            }
        }
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("scanning...");
    pb
}

fn status_message(totals: &ProgressTotals) -> String {
    let mut msg = format!("{} leaks", totals.leaks);
    if totals.errors > 0 {
        msg.push_str(&format!(", {} errors", totals.errors));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_mentions_errors_only_when_present() {
        let mut totals = ProgressTotals::default();
        totals.apply(&ProgressUpdate::leaks(3));
        assert_eq!(status_message(&totals), "3 leaks");

        totals.apply(&ProgressUpdate::errors(1));
        assert_eq!(status_message(&totals), "3 leaks, 1 errors");
    }

    #[tokio::test]
    async fn reporter_sums_deltas() {
        let (tx, rx) = mpsc::channel(4);
        let reporter = ProgressReporter::spawn(rx);
        tx.send(ProgressUpdate::total(2)).await.unwrap();
        tx.send(ProgressUpdate::processed(1)).await.unwrap();
        tx.send(ProgressUpdate::default()).await.unwrap();
        tx.send(ProgressUpdate::processed(1)).await.unwrap();
        drop(tx);

        let totals = reporter.finish().await;
        assert_eq!(totals.total, 2);
        assert_eq!(totals.processed, 2);
    }
}
