//! Executor: drives exactly one walk of a state graph.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::states::{State, StateRef};

/// How a walk ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkOutcome {
    /// The walk reached the terminal state.
    Completed,
    /// The cancellation token was signalled before the terminal state.
    /// Not an error: the caller simply observes that the walk did not
    /// finish.
    Cancelled,
}

/// Result of one walk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalkReport {
    pub outcome: WalkOutcome,
    /// Wall-clock time at which the walk started.
    pub started_at: DateTime<Utc>,
    /// Number of transitions taken.
    pub transitions: u64,
    /// Total time spent.
    pub elapsed: Duration,
    /// Whether the overall budget was spent by the time the walk ended.
    pub budget_exhausted: bool,
    /// Name of the state the walk ended on.
    pub last_state: String,
}

impl WalkReport {
    /// `true` when the walk reached the terminal state.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == WalkOutcome::Completed
    }
}

/// Walks a graph from an initial state to a terminal state, once per call.
///
/// The executor owns no graph and no context: both are handed in per walk,
/// so one executor value can serve any number of contexts sequentially.
/// It recomputes the remaining budget before every transition and threads
/// the cancellation token through; the transition logic itself never
/// blocks; only bounded operations (and the runner's inter-pass sleep)
/// suspend.
#[derive(Clone, Debug)]
pub struct Executor {
    max_walk_time: Duration,
}

impl Executor {
    #[must_use]
    pub fn new(max_walk_time: Duration) -> Self {
        Self { max_walk_time }
    }

    /// Walk from `initial` until the terminal state or cancellation.
    #[instrument(
        skip(self, ctx, initial, token),
        fields(context = %ctx.context_id(), max_time = ?self.max_walk_time)
    )]
    pub async fn run_walk<C: AnalysisContext>(
        &self,
        ctx: &Arc<C>,
        initial: StateRef<C>,
        token: &CancellationToken,
    ) -> WalkReport {
        let clock = WalkClock::start(self.max_walk_time);
        let mut current = initial;
        let mut transitions: u64 = 0;

        let outcome = loop {
            if token.is_cancelled() {
                debug!(state = current.name(), transitions, "walk cancelled");
                break WalkOutcome::Cancelled;
            }
            if current.is_end() {
                break WalkOutcome::Completed;
            }
            trace!(
                state = current.name(),
                remaining = ?clock.remaining(),
                "transition"
            );
            current = current.next(ctx, token, &clock).await;
            transitions += 1;
        };

        let report = WalkReport {
            outcome,
            started_at: clock.started_at(),
            transitions,
            elapsed: clock.elapsed(),
            budget_exhausted: clock.is_exhausted(),
            last_state: current.name().to_string(),
        };
        debug!(
            outcome = ?report.outcome,
            transitions = report.transitions,
            elapsed = ?report.elapsed,
            budget_exhausted = report.budget_exhausted,
            "walk finished"
        );
        report
    }
}
