//! Concurrent scan/clean pipeline.
//!
//! - **discovery**: walk the input root and produce jobs
//! - **processor**: sniff, analyze and strip one file
//! - **replace**: destination resolution and atomic temp-file replacement
//! - **collector**: single writer of the run summary and reports
//! - **cancel**: cooperative cancellation token
//! - **runner**: wires the stages together over bounded channels

pub mod cancel;
pub mod collector;
pub mod discovery;
pub mod processor;
pub mod replace;
pub mod runner;

pub use cancel::CancelToken;
pub use collector::Collector;
pub use discovery::Walker;
pub use processor::process_job;
pub use runner::{RunOutcome, Scrubber};
