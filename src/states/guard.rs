//! Max-time guard node.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::states::{State, StateRef};

/// Short-circuits once the walk budget is spent.
///
/// Placed immediately before expensive optional stretches of a graph: if
/// the overall budget is exhausted the guard routes to its fallback
/// (typically a safe terminal or near-terminal node) regardless of where
/// the proceed branch would have gone.
///
/// A fallback may point at a state conceptually *earlier* than the guard;
/// termination then relies on the wall-clock budget eventually forcing
/// every other guard onto its fallback as well.
pub struct CheckMaxTimeState<C: AnalysisContext> {
    name: String,
    fallback: StateRef<C>,
    proceed: StateRef<C>,
}

impl<C: AnalysisContext> CheckMaxTimeState<C> {
    pub fn new(name: impl Into<String>, fallback: StateRef<C>, proceed: StateRef<C>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fallback,
            proceed,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for CheckMaxTimeState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        clock: &WalkClock,
    ) -> StateRef<C> {
        if clock.is_exhausted() {
            debug!(
                state = %self.name,
                elapsed = ?clock.elapsed(),
                "walk budget spent, taking fallback branch"
            );
            self.fallback.clone()
        } else {
            self.proceed.clone()
        }
    }
}
