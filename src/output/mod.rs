//! Output module for persisting crawl results
//!
//! This module handles:
//! - The sink ports the crawl writes through (results and traces)
//! - JSON and trace files on disk
//! - Crawl statistics for the console

mod files;
pub mod stats;
mod traits;

pub use files::{epoch_millis, FileTraceSink, JsonFileSink};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, ResultSink, TraceSink};
