//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the phases of the pagination state machine
//! - `StopReason`: why a crawl ended
//! - `CrawlState`: accumulated listings, page cursor and phase of one crawl
//! - `CrawlOutcome`: what a finished crawl hands back to its caller

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::{CrawlPhase, StopReason};
pub use crawl_state::{CrawlOutcome, CrawlState};
