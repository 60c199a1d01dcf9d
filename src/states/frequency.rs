//! Frequency node: alternate a rare and a common branch on wall-clock time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::states::{State, StateRef};

/// Takes the rare branch at most once per `frequency`, the common branch
/// otherwise. The first visit always takes the rare branch.
///
/// Used to alternate "process everything pending" (rare, expensive)
/// against "process only high-priority work" (common, cheap). The last
/// rare-run timestamp lives inside the state, so it persists across walks
/// for as long as the graph instance does, which is why the assembler
/// builds one graph per context, never a shared singleton.
pub struct FrequencyState<C: AnalysisContext> {
    name: String,
    frequency: Duration,
    last_rare: Mutex<Option<Instant>>,
    rare_next: StateRef<C>,
    common_next: StateRef<C>,
}

impl<C: AnalysisContext> FrequencyState<C> {
    pub fn new(
        name: impl Into<String>,
        frequency: Duration,
        rare_next: StateRef<C>,
        common_next: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            frequency,
            last_rare: Mutex::new(None),
            rare_next,
            common_next,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for FrequencyState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        let now = Instant::now();
        let mut last_rare = self
            .last_rare
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last_rare {
            Some(last) if now.duration_since(last) < self.frequency => self.common_next.clone(),
            _ => {
                debug!(state = %self.name, "taking rare branch");
                *last_rare = Some(now);
                self.rare_next.clone()
            }
        }
    }
}
