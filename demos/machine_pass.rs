//! Demo: one bounded analysis pass over a single machine.
//!
//! Builds the built-in monitored-machine graph, runs a single walk with
//! the default budgets and prints the resulting summary. The machine here
//! is simulated: every operation sleeps briefly and reports completion.
//!
//! Running:
//! ```bash
//! cargo run --example machine_pass
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use miette::IntoDiagnostic;
use tokio_util::sync::CancellationToken;

use millpass::context::{
    ActivityOps, AnalysisContext, ContextId, ModificationOps, ProductionOps, StepOutcome,
};
use millpass::flags::MemoryFlagStore;
use millpass::graphs::{ExtensionRegistry, MonitoredMachineGraph};
use millpass::runtimes::Runner;

/// A machine whose analysis operations all succeed after a short delay.
struct SimulatedMachine {
    id: i64,
    operations: AtomicU32,
}

impl SimulatedMachine {
    fn new(id: i64) -> Self {
        Self {
            id,
            operations: AtomicU32::new(0),
        }
    }

    async fn work(&self) -> StepOutcome {
        self.operations.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(5)).await;
        StepOutcome::Completed
    }
}

#[async_trait]
impl AnalysisContext for SimulatedMachine {
    fn context_id(&self) -> ContextId {
        ContextId::Machine(self.id)
    }

    async fn initialize(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    fn is_cleanup_required(&self) -> bool {
        false
    }
}

#[async_trait]
impl ModificationOps for SimulatedMachine {
    async fn run_pending_modifications(
        &self,
        _: &CancellationToken,
        _: Duration,
        _: i32,
        _: i32,
    ) -> StepOutcome {
        self.work().await
    }

    async fn clean_flagged_modifications(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }
}

#[async_trait]
impl ActivityOps for SimulatedMachine {
    async fn run_activity(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    async fn run_detection(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    async fn run_auto_sequence(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    async fn run_processing_reason_slots(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }
}

#[async_trait]
impl ProductionOps for SimulatedMachine {
    async fn run_production(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    async fn run_operation_slot_split(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
        self.work().await
    }

    async fn manage_machine_state_templates(
        &self,
        _: &CancellationToken,
        _: Duration,
    ) -> StepOutcome {
        self.work().await
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    millpass::telemetry::init();

    let store = Arc::new(MemoryFlagStore::new());
    let registry: ExtensionRegistry<SimulatedMachine> =
        ExtensionRegistry::new().register(Arc::new(MonitoredMachineGraph::new(store)));

    let machine = Arc::new(SimulatedMachine::new(18));
    let runner = Runner::new(registry);
    let summary = runner.run(Arc::clone(&machine), CancellationToken::new()).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).into_diagnostic()?
    );
    println!(
        "operations invoked: {}",
        machine.operations.load(Ordering::Relaxed)
    );
    Ok(())
}
