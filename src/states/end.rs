//! Terminal node.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::states::{State, StateRef};

/// Terminal state: a walk that reaches it stops advancing.
///
/// The executor checks [`State::is_end`] before transitioning, so
/// [`State::next`] is never called on a reached terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct EndState;

#[async_trait]
impl<C: AnalysisContext> State<C> for EndState {
    fn name(&self) -> &str {
        "End"
    }

    fn is_end(&self) -> bool {
        true
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        Arc::new(EndState)
    }
}
