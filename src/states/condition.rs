//! Condition node: pure predicate routing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::states::{State, StateRef};

/// Predicate evaluated by a [`ConditionState`]. Must be side-effect free.
pub type Predicate<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Routes on a cheap, deterministic predicate over the context.
pub struct ConditionState<C: AnalysisContext> {
    name: String,
    predicate: Predicate<C>,
    on_true: StateRef<C>,
    on_false: StateRef<C>,
}

impl<C: AnalysisContext> ConditionState<C> {
    pub fn new(
        name: impl Into<String>,
        predicate: Predicate<C>,
        on_true: StateRef<C>,
        on_false: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            predicate,
            on_true,
            on_false,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for ConditionState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        if (self.predicate)(ctx.as_ref()) {
            self.on_true.clone()
        } else {
            self.on_false.clone()
        }
    }
}
