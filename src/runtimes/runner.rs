//! Runner: graph selection plus the optional pass loop.
//!
//! The executor performs exactly one walk per call; everything periodic
//! lives here. A runner selects a graph for its context once, then walks
//! it either a single time or in a sleep-and-restart loop until
//! cancellation. Because the graph instance survives across passes,
//! frequency counters inside it keep their memory from one walk to the
//! next; only a process restart resets them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::context::{AnalysisContext, ContextId};
use crate::graphs::ExtensionRegistry;
use crate::runtimes::config::{AnalysisTuning, RunnerConfig};
use crate::runtimes::executor::{Executor, WalkOutcome, WalkReport};

/// Aggregated result of one [`Runner::run`] call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub context: ContextId,
    /// Name of the selected graph extension, or `None` when no extension
    /// succeeded and the run was a no-op pass.
    pub graph: Option<String>,
    /// One report per walk, in order.
    pub walks: Vec<WalkReport>,
}

impl RunSummary {
    /// `true` when every walk reached the terminal state.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.walks.iter().all(WalkReport::is_completed)
    }
}

/// Drives periodic analysis passes for one context.
pub struct Runner<C: AnalysisContext> {
    registry: ExtensionRegistry<C>,
    tuning: AnalysisTuning,
    config: RunnerConfig,
}

impl<C: AnalysisContext> Runner<C> {
    pub fn new(registry: ExtensionRegistry<C>) -> Self {
        Self {
            registry,
            tuning: AnalysisTuning::default(),
            config: RunnerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: AnalysisTuning) -> Self {
        self.tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Select a graph and walk it: once, or repeatedly with the
    /// configured inter-pass sleep.
    ///
    /// When no extension succeeds the context no-ops: the summary carries
    /// zero walks and `graph: None`, and the call returns immediately.
    /// Cancellation ends the loop after the current walk aborts; it is an
    /// observable outcome on the last report, not an error.
    #[instrument(
        skip(self, ctx, token),
        fields(run_id = %self.config.run_id, context = %ctx.context_id())
    )]
    pub async fn run(&self, ctx: Arc<C>, token: CancellationToken) -> RunSummary {
        let context = ctx.context_id();
        let Some(selected) = self.registry.assemble(ctx.as_ref()) else {
            warn!("no graph available, skipping context for this pass");
            return RunSummary {
                run_id: self.config.run_id.clone(),
                context,
                graph: None,
                walks: Vec::new(),
            };
        };
        info!(
            extension = %selected.extension,
            priority = selected.priority,
            "analysis graph selected"
        );

        let executor = Executor::new(self.tuning.max_walk_time);
        let mut walks = Vec::new();
        loop {
            let report = executor
                .run_walk(&ctx, selected.initial.clone(), &token)
                .await;
            let cancelled = report.outcome == WalkOutcome::Cancelled;
            walks.push(report);
            if cancelled || !self.config.loop_passes {
                break;
            }
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.pass_interval) => {}
            }
        }

        RunSummary {
            run_id: self.config.run_id.clone(),
            context,
            graph: Some(selected.extension),
            walks,
        }
    }
}
