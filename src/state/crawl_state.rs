use crate::state::{CrawlPhase, StopReason};
use crate::vehicle::{NewVehicle, UsedVehicle};

/// Mutable state of a single crawl invocation
///
/// Owned by the coordinator for the duration of one `run` and consumed
/// into a [`CrawlOutcome`] when the crawl ends.
#[derive(Debug)]
pub struct CrawlState {
    new_vehicles: Vec<NewVehicle>,
    used_vehicles: Vec<UsedVehicle>,
    page_cursor: u32,
    phase: CrawlPhase,
    stop_reason: Option<StopReason>,
}

/// Final result of a crawl: whatever was accumulated, and why it stopped
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub new_vehicles: Vec<NewVehicle>,
    pub used_vehicles: Vec<UsedVehicle>,
    /// Number of pages whose listings were accumulated
    pub pages_processed: u32,
    pub stop_reason: StopReason,
    pub done: bool,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            new_vehicles: Vec::new(),
            used_vehicles: Vec::new(),
            page_cursor: 0,
            phase: CrawlPhase::Start,
            stop_reason: None,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Number of pages processed so far
    pub fn page_cursor(&self) -> u32 {
        self.page_cursor
    }

    /// The page that will be requested next (1-based)
    pub fn next_page(&self) -> u32 {
        self.page_cursor + 1
    }

    pub fn done(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Moves to a non-terminal phase
    pub fn transition(&mut self, next: CrawlPhase) {
        debug_assert!(
            !next.is_terminal(),
            "terminal phases are entered through finish()"
        );
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid crawl transition: {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Appends one page's listings and advances the page cursor
    pub fn accumulate(&mut self, new_vehicles: Vec<NewVehicle>, used_vehicles: Vec<UsedVehicle>) {
        self.transition(CrawlPhase::Accumulating);
        self.new_vehicles.extend(new_vehicles);
        self.used_vehicles.extend(used_vehicles);
        self.page_cursor += 1;
    }

    /// Enters the terminal phase for `reason`; may only happen once
    pub fn finish(&mut self, reason: StopReason) {
        let next = reason.terminal_phase();
        debug_assert!(self.stop_reason.is_none(), "crawl finished twice");
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid crawl transition: {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
        self.stop_reason = Some(reason);
    }

    /// Consumes the state into the crawl's outcome
    ///
    /// A first-page failure discards anything accumulated.
    pub fn into_outcome(self) -> CrawlOutcome {
        let done = self.done();
        let stop_reason = self.stop_reason.unwrap_or(StopReason::FirstPageFailed);

        if stop_reason == StopReason::FirstPageFailed {
            return CrawlOutcome {
                new_vehicles: Vec::new(),
                used_vehicles: Vec::new(),
                pages_processed: 0,
                stop_reason,
                done,
            };
        }

        CrawlOutcome {
            new_vehicles: self.new_vehicles,
            used_vehicles: self.used_vehicles,
            pages_processed: self.page_cursor,
            stop_reason,
            done,
        }
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
