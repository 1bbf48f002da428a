//! CLI command implementations.

pub mod clean;
pub mod config;
pub mod progress;
pub mod render;
pub mod scan;

use std::path::Path;

use bleach_core::{CancelToken, Config, RunOptions, RunOutcome, Scrubber};
use tokio::sync::mpsc;

use progress::ProgressReporter;

/// Run the engine with a progress bar and Ctrl-C handling.
///
/// The first Ctrl-C stops new files from being started; files already being
/// written finish normally.
pub(crate) async fn run_with_progress(
    config: &Config,
    input: &Path,
    options: &RunOptions,
) -> RunOutcome {
    let scrubber = Scrubber::new(config);
    let cancel = CancelToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing files in flight");
                cancel.cancel();
            }
        })
    };

    let (tx, rx) = mpsc::channel(scrubber.progress_buffer());
    let reporter = ProgressReporter::spawn(rx);

    let outcome = scrubber.run(input, options, cancel, Some(tx)).await;

    interrupt.abort();
    reporter.finish().await;

    if outcome.cancelled {
        tracing::warn!("Run cancelled; {} files processed", outcome.summary.processed);
    }
    outcome
}
