//! Wall-clock budget tracking for one walk.
//!
//! A [`WalkClock`] is started once per walk and handed read-only to every
//! transition. States derive "time remaining" from it; nothing in the core
//! sets timers or spawns watchdogs. The monotonic side uses
//! [`tokio::time::Instant`] so tests can drive it with a paused runtime
//! clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Elapsed/remaining budget arithmetic for a single walk.
///
/// Cloning is cheap; clones share the same origin instant, so a clone
/// observes the same deadline as the original.
#[derive(Clone, Debug)]
pub struct WalkClock {
    started: Instant,
    started_at: DateTime<Utc>,
    max_time: Duration,
}

impl WalkClock {
    /// Start the clock now, with the given overall walk budget.
    #[must_use]
    pub fn start(max_time: Duration) -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            max_time,
        }
    }

    /// Wall-clock timestamp at which the walk started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Overall budget this walk was given.
    #[must_use]
    pub fn max_time(&self) -> Duration {
        self.max_time
    }

    /// Time spent since the walk started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Budget still available, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.max_time.saturating_sub(self.elapsed())
    }

    /// Whether the overall budget is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Budget to hand a single step: the step's own cap, bounded by what
    /// is left of the walk budget.
    #[must_use]
    pub fn step_budget(&self, step_max: Option<Duration>) -> Duration {
        match step_max {
            Some(cap) => cap.min(self.remaining()),
            None => self.remaining(),
        }
    }
}
