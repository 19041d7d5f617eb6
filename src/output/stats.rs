//! Post-crawl statistics
//!
//! This module summarizes a finished crawl for the log and the console.

use crate::state::{CrawlOutcome, StopReason};
use crate::vehicle::count_duplicate_ids;
use std::path::PathBuf;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of new-vehicle listings collected
    pub new_vehicles: usize,

    /// Number of used-vehicle listings collected
    pub used_vehicles: usize,

    /// New-vehicle listings repeating an id seen earlier in the crawl
    pub duplicate_new: usize,

    /// Used-vehicle listings repeating an id seen earlier in the crawl
    pub duplicate_used: usize,

    /// Pages whose listings were accumulated
    pub pages_processed: u32,

    /// Why the crawl ended
    pub stop_reason: StopReason,

    /// Files the collections were written to
    pub files: Vec<PathBuf>,
}

impl CrawlStatistics {
    /// Builds statistics from a crawl outcome
    ///
    /// Duplicates are counted before any dedup stage runs.
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        Self {
            new_vehicles: outcome.new_vehicles.len(),
            used_vehicles: outcome.used_vehicles.len(),
            duplicate_new: count_duplicate_ids(&outcome.new_vehicles),
            duplicate_used: count_duplicate_ids(&outcome.used_vehicles),
            pages_processed: outcome.pages_processed,
            stop_reason: outcome.stop_reason,
            files: Vec::new(),
        }
    }

    /// Total listings of both kinds
    pub fn total_vehicles(&self) -> usize {
        self.new_vehicles + self.used_vehicles
    }

    /// Returns true when the crawl ran to its natural end
    pub fn is_complete(&self) -> bool {
        !self.stop_reason.is_error()
    }
}

/// Prints statistics in a human-readable format
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages processed: {}", stats.pages_processed);
    println!("Stopped: {}", stats.stop_reason);
    println!();

    println!("Listings:");
    println!(
        "  New vehicles:  {} ({} duplicate ids)",
        stats.new_vehicles, stats.duplicate_new
    );
    println!(
        "  Used vehicles: {} ({} duplicate ids)",
        stats.used_vehicles, stats.duplicate_used
    );
    println!("  Total:         {}", stats.total_vehicles());

    if !stats.files.is_empty() {
        println!("\nFiles:");
        for file in &stats.files {
            println!("  {}", file.display());
        }
    }
}
