//! Demo: requesting and clearing a catch-up pass.
//!
//! Sets the persisted catch-up flag for a machine the way an
//! administrative CLI would, then runs two walks. The first takes the
//! catch-up branch and deletes the flag at its end; the second, started
//! immediately after, takes the normal branch again.
//!
//! Running:
//! ```bash
//! cargo run --example catch_up_cycle
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use miette::IntoDiagnostic;
use tokio_util::sync::CancellationToken;

use millpass::context::{
    ActivityOps, AnalysisContext, ContextId, ModificationOps, ProductionOps, StepOutcome,
};
use millpass::flags::{FlagStore, MemoryFlagStore, request_catch_up};
use millpass::graphs::{ExtensionRegistry, MonitoredMachineGraph};
use millpass::runtimes::Runner;

struct QuietMachine;

#[async_trait]
impl AnalysisContext for QuietMachine {
    fn context_id(&self) -> ContextId {
        ContextId::Machine(7)
    }

    async fn initialize(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    fn is_cleanup_required(&self) -> bool {
        false
    }
}

#[async_trait]
impl ModificationOps for QuietMachine {
    async fn run_pending_modifications(
        &self,
        _: &CancellationToken,
        _: Duration,
        _: i32,
        _: i32,
    ) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn clean_flagged_modifications(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }
}

#[async_trait]
impl ActivityOps for QuietMachine {
    async fn run_activity(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn run_detection(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn run_auto_sequence(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn run_processing_reason_slots(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }
}

#[async_trait]
impl ProductionOps for QuietMachine {
    async fn run_production(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn run_operation_slot_split(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        StepOutcome::Completed
    }

    async fn manage_machine_state_templates(
        &self,
        _: &CancellationToken,
        _: Duration,
    ) -> StepOutcome {
        StepOutcome::Completed
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    millpass::telemetry::init();

    let store = Arc::new(MemoryFlagStore::new());
    let machine = Arc::new(QuietMachine);
    let key = machine.context_id().catch_up_key();

    request_catch_up(store.as_ref(), &machine.context_id())
        .await
        .into_diagnostic()?;
    println!("flag {key} set: {}", store.exists(&key).await.into_diagnostic()?);

    let flag_store: Arc<dyn FlagStore> = store.clone();
    let registry: ExtensionRegistry<QuietMachine> =
        ExtensionRegistry::new().register(Arc::new(MonitoredMachineGraph::new(flag_store)));
    let runner = Runner::new(registry);

    let first = runner
        .run(Arc::clone(&machine), CancellationToken::new())
        .await;
    println!(
        "first pass: {} transitions, flag present afterwards: {}",
        first.walks[0].transitions,
        store.exists(&key).await.into_diagnostic()?
    );

    let second = runner.run(machine, CancellationToken::new()).await;
    println!("second pass: {} transitions", second.walks[0].transitions);
    Ok(())
}
