//! Bounded-action node: invoke one operation, route on its outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::WalkClock;
use crate::context::{AnalysisContext, BoundedOp, StepOutcome};
use crate::states::{State, StateRef};

/// Invokes a bounded operation and routes on its tri-state outcome.
///
/// The operation itself is responsible for respecting the budget it is
/// handed and returning promptly; this state only interprets the result:
///
/// - [`StepOutcome::Completed`] → success branch
/// - [`StepOutcome::BudgetExceeded`] → budget branch (often the same state
///   as the success branch: "still progress, re-enter later")
/// - [`StepOutcome::Faulted`] → the error is logged with the state name
///   and the walk continues on the fault branch; a single broken step
///   never aborts the pass
///
/// An optional per-step budget caps what the operation receives; the
/// effective budget is always further bounded by what is left of the walk.
pub struct BoundedActionState<C: AnalysisContext> {
    name: String,
    operation: BoundedOp<C>,
    step_budget: Option<Duration>,
    on_success: StateRef<C>,
    on_budget_exceeded: StateRef<C>,
    on_fault: StateRef<C>,
}

impl<C: AnalysisContext> BoundedActionState<C> {
    pub fn new(
        name: impl Into<String>,
        operation: BoundedOp<C>,
        on_success: StateRef<C>,
        on_budget_exceeded: StateRef<C>,
        on_fault: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            operation,
            step_budget: None,
            on_success,
            on_budget_exceeded,
            on_fault,
        })
    }

    /// Same as [`new`](Self::new), with a per-step budget cap.
    pub fn with_step_budget(
        name: impl Into<String>,
        operation: BoundedOp<C>,
        step_budget: Duration,
        on_success: StateRef<C>,
        on_budget_exceeded: StateRef<C>,
        on_fault: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            operation,
            step_budget: Some(step_budget),
            on_success,
            on_budget_exceeded,
            on_fault,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for BoundedActionState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        ctx: &Arc<C>,
        token: &CancellationToken,
        clock: &WalkClock,
    ) -> StateRef<C> {
        if token.is_cancelled() {
            // The executor aborts the walk on its next check; don't start
            // an operation that would be thrown away.
            debug!(state = %self.name, "cancellation requested, operation not started");
            return self.on_success.clone();
        }

        let budget = clock.step_budget(self.step_budget);
        match (self.operation)(Arc::clone(ctx), token.clone(), budget).await {
            StepOutcome::Completed => self.on_success.clone(),
            StepOutcome::BudgetExceeded => {
                debug!(state = %self.name, ?budget, "operation stopped at budget");
                self.on_budget_exceeded.clone()
            }
            StepOutcome::Faulted(error) => {
                warn!(state = %self.name, %error, "operation faulted, continuing on fault branch");
                self.on_fault.clone()
            }
        }
    }
}
