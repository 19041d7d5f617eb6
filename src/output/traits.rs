//! Output sink traits and error types
//!
//! The coordinator only talks to the outside world through these ports,
//! so the crawl loop can be exercised without touching the filesystem.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for raw bodies of pages that failed to fetch or parse
pub trait TraceSink {
    /// Stores one page body for offline diagnosis
    ///
    /// # Returns
    ///
    /// The location the trace was written to
    fn save_trace(&self, body: &str) -> OutputResult<PathBuf>;
}

/// Destination for the accumulated listing collections
pub trait ResultSink {
    /// Persists one named collection
    ///
    /// # Arguments
    ///
    /// * `records` - The records to persist, in order
    /// * `name` - Collection name, e.g. `new_vehicles`
    ///
    /// # Returns
    ///
    /// The location the collection was written to
    fn persist<T: Serialize>(&self, records: &[T], name: &str) -> OutputResult<PathBuf>;
}

impl<S: TraceSink + ?Sized> TraceSink for &S {
    fn save_trace(&self, body: &str) -> OutputResult<PathBuf> {
        (**self).save_trace(body)
    }
}
