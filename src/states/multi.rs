//! Multi node: contributed sub-steps inside an otherwise fixed graph.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::WalkClock;
use crate::context::{AnalysisContext, BoundedOp, StepOutcome};
use crate::states::{State, StateRef};

/// One contributed sub-step of a [`MultiState`].
///
/// A self-contained one-shot bounded action: same budget and fault
/// handling as a [`BoundedActionState`](crate::states::BoundedActionState),
/// but with no routing of its own.
pub struct SubState<C> {
    pub name: String,
    pub operation: BoundedOp<C>,
    pub step_budget: Option<Duration>,
}

impl<C> SubState<C> {
    pub fn new(name: impl Into<String>, operation: BoundedOp<C>) -> Self {
        Self {
            name: name.into(),
            operation,
            step_budget: None,
        }
    }

    #[must_use]
    pub fn with_step_budget(mut self, step_budget: Duration) -> Self {
        self.step_budget = Some(step_budget);
        self
    }
}

impl<C> Clone for SubState<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            operation: Arc::clone(&self.operation),
            step_budget: self.step_budget,
        }
    }
}

/// Visits each contributed sub-step in registration order, then routes
/// unconditionally to `next` (immediately, if the list is empty).
///
/// Faults are logged and swallowed per sub-step; a sub-step that runs out
/// of budget simply yields to the next one. Once the walk budget itself is
/// spent, remaining sub-steps are skipped so no further operations start.
pub struct MultiState<C: AnalysisContext> {
    name: String,
    sub_states: Vec<SubState<C>>,
    next: StateRef<C>,
}

impl<C: AnalysisContext> MultiState<C> {
    pub fn new(name: impl Into<String>, sub_states: Vec<SubState<C>>, next: StateRef<C>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            sub_states,
            next,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for MultiState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        ctx: &Arc<C>,
        token: &CancellationToken,
        clock: &WalkClock,
    ) -> StateRef<C> {
        for sub in &self.sub_states {
            if token.is_cancelled() {
                break;
            }
            if clock.is_exhausted() {
                debug!(
                    state = %self.name,
                    skipped = %sub.name,
                    "walk budget spent, skipping remaining contributed steps"
                );
                break;
            }
            let budget = clock.step_budget(sub.step_budget);
            match (sub.operation)(Arc::clone(ctx), token.clone(), budget).await {
                StepOutcome::Completed => {}
                StepOutcome::BudgetExceeded => {
                    debug!(state = %self.name, sub = %sub.name, ?budget, "contributed step stopped at budget");
                }
                StepOutcome::Faulted(error) => {
                    warn!(state = %self.name, sub = %sub.name, %error, "contributed step faulted");
                }
            }
        }
        self.next.clone()
    }
}
