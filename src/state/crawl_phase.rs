/// Crawl phase definitions for the pagination state machine
///
/// This module defines every phase a crawl passes through and why it stops.
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Nothing has been requested yet
    Start,

    /// Waiting on the unpaginated first results page
    FetchingFirstPage,

    /// Waiting on a paginated results page
    FetchingPage,

    /// Appending a page's listings to the accumulated collections
    Accumulating,

    /// Pagination counter says more pages remain
    Continue,

    // ===== Terminal Phases =====
    /// Stopped because the pagination counter was exhausted or the page
    /// limit was reached
    StopNormal,

    /// Stopped because a page could not be fetched or parsed
    StopOnError,
}

impl CrawlPhase {
    /// Returns true if the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StopNormal | Self::StopOnError)
    }

    /// Checks whether moving from this phase to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        matches!(
            (self, next),
            (Start, FetchingFirstPage)
                | (FetchingFirstPage, Accumulating)
                | (FetchingFirstPage, StopOnError)
                | (Accumulating, FetchingPage)
                | (Accumulating, Continue)
                | (Accumulating, StopNormal)
                | (Continue, FetchingPage)
                | (Continue, StopNormal)
                | (FetchingPage, Accumulating)
                | (FetchingPage, StopOnError)
        )
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::FetchingFirstPage => "fetching_first_page",
            Self::FetchingPage => "fetching_page",
            Self::Accumulating => "accumulating",
            Self::Continue => "continue",
            Self::StopNormal => "stop_normal",
            Self::StopOnError => "stop_on_error",
        };
        write!(f, "{}", name)
    }
}

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The pagination counter reached its total
    Exhausted { total: u32 },

    /// The next page number exceeded the configured page limit
    PageLimit { limit: u32 },

    /// The first page could not be fetched or parsed; nothing was kept
    FirstPageFailed,

    /// A later page could not be fetched or parsed; earlier pages were kept
    PageFailed { page: u32 },
}

impl StopReason {
    /// Returns true if the crawl stopped because of a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FirstPageFailed | Self::PageFailed { .. })
    }

    /// The terminal phase this reason leads to
    pub fn terminal_phase(&self) -> CrawlPhase {
        if self.is_error() {
            CrawlPhase::StopOnError
        } else {
            CrawlPhase::StopNormal
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { total } => write!(f, "all {} pages processed", total),
            Self::PageLimit { limit } => write!(f, "page limit of {} reached", limit),
            Self::FirstPageFailed => write!(f, "first page failed"),
            Self::PageFailed { page } => write!(f, "page {} failed", page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(CrawlPhase::StopNormal.is_terminal());
        assert!(CrawlPhase::StopOnError.is_terminal());
        assert!(!CrawlPhase::Start.is_terminal());
        assert!(!CrawlPhase::Continue.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        assert!(CrawlPhase::Start.can_transition_to(CrawlPhase::FetchingFirstPage));
        assert!(CrawlPhase::FetchingFirstPage.can_transition_to(CrawlPhase::StopOnError));
        assert!(CrawlPhase::Accumulating.can_transition_to(CrawlPhase::StopNormal));
        assert!(CrawlPhase::Continue.can_transition_to(CrawlPhase::FetchingPage));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!CrawlPhase::Start.can_transition_to(CrawlPhase::FetchingPage));
        assert!(!CrawlPhase::StopNormal.can_transition_to(CrawlPhase::FetchingPage));
        assert!(!CrawlPhase::StopOnError.can_transition_to(CrawlPhase::StopNormal));
        assert!(!CrawlPhase::Accumulating.can_transition_to(CrawlPhase::StopOnError));
    }

    #[test]
    fn test_stop_reason_phase() {
        assert_eq!(
            StopReason::Exhausted { total: 3 }.terminal_phase(),
            CrawlPhase::StopNormal
        );
        assert_eq!(
            StopReason::PageLimit { limit: 3 }.terminal_phase(),
            CrawlPhase::StopNormal
        );
        assert_eq!(
            StopReason::PageFailed { page: 4 }.terminal_phase(),
            CrawlPhase::StopOnError
        );
        assert!(StopReason::FirstPageFailed.is_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::StopOnError.to_string(), "stop_on_error");
        assert_eq!(StopReason::PageFailed { page: 7 }.to_string(), "page 7 failed");
    }
}
