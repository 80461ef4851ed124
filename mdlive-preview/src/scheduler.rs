//! Debounced refresh scheduling
//!
//! A scheduler holds at most one pending refresh. Every change notification
//! cancels the pending one and starts a new one, so a burst of edits produces
//! a single refresh once the document has been quiet for `delay`.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Pending { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    delay: Duration,
    state: SchedulerState,
}

impl RefreshScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: SchedulerState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Record a change at `now`, replacing any pending refresh.
    /// Returns true if a pending refresh was cancelled.
    pub fn notify(&mut self, now: Instant) -> bool {
        let replaced = self.is_pending();
        self.state = SchedulerState::Pending {
            deadline: now + self.delay,
        };
        replaced
    }

    /// Returns true exactly once per pending refresh, when its deadline has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Pending { deadline } if now >= deadline => {
                self.state = SchedulerState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending refresh, if any
    pub fn cancel(&mut self) {
        self.state = SchedulerState::Idle;
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Pending { deadline } => Some(deadline),
            SchedulerState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SchedulerState::Pending { .. })
    }
}
