//! Scripted analysis contexts for driving graphs in tests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use millpass::context::{
    ActivityOps, AnalysisContext, ContextId, ModificationOps, ProductionOps, StepError,
    StepOutcome, TemplateOps,
};

/// What a scripted operation should do when invoked.
#[derive(Clone, Copy, Debug)]
pub enum OpBehavior {
    /// Return `Completed` immediately.
    Complete,
    /// Sleep for the given duration, then return `Completed`.
    CompleteAfter(Duration),
    /// Return `BudgetExceeded` immediately.
    ExceedBudget,
    /// Return `Faulted` with the given message.
    Fault(&'static str),
    /// Cancel the walk's token on the n-th invocation (1-based), then
    /// return `Completed`.
    CancelTokenOnCall(usize),
}

/// A context whose operations follow a per-operation script and record
/// every invocation in a journal.
pub struct ScriptedContext {
    id: ContextId,
    cleanup_required: bool,
    behaviors: FxHashMap<&'static str, OpBehavior>,
    journal: Mutex<Vec<String>>,
}

impl ScriptedContext {
    pub fn machine(id: i64) -> Self {
        Self {
            id: ContextId::Machine(id),
            cleanup_required: false,
            behaviors: FxHashMap::default(),
            journal: Mutex::new(Vec::new()),
        }
    }

    pub fn global() -> Self {
        Self {
            id: ContextId::Global,
            cleanup_required: false,
            behaviors: FxHashMap::default(),
            journal: Mutex::new(Vec::new()),
        }
    }

    pub fn with_cleanup_required(mut self, cleanup_required: bool) -> Self {
        self.cleanup_required = cleanup_required;
        self
    }

    /// Script one operation by name; unscripted operations complete
    /// immediately.
    pub fn behave(mut self, op: &'static str, behavior: OpBehavior) -> Self {
        self.behaviors.insert(op, behavior);
        self
    }

    /// All invocations so far, in order.
    pub fn journal(&self) -> Vec<String> {
        self.lock_journal().clone()
    }

    /// Number of invocations of the named operation.
    pub fn calls(&self, op: &str) -> usize {
        self.lock_journal()
            .iter()
            .filter(|entry| entry.starts_with(op))
            .count()
    }

    pub fn clear_journal(&self) {
        self.lock_journal().clear();
    }

    fn lock_journal(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_op(&self, op: &'static str, entry: String, token: &CancellationToken) -> StepOutcome {
        self.lock_journal().push(entry);
        match self.behaviors.get(op).copied().unwrap_or(OpBehavior::Complete) {
            OpBehavior::Complete => StepOutcome::Completed,
            OpBehavior::CompleteAfter(delay) => {
                tokio::time::sleep(delay).await;
                StepOutcome::Completed
            }
            OpBehavior::ExceedBudget => StepOutcome::BudgetExceeded,
            OpBehavior::Fault(message) => StepOutcome::Faulted(StepError::Other(message.into())),
            OpBehavior::CancelTokenOnCall(n) => {
                if self.calls(op) == n {
                    token.cancel();
                }
                StepOutcome::Completed
            }
        }
    }
}

#[async_trait]
impl AnalysisContext for ScriptedContext {
    fn context_id(&self) -> ContextId {
        self.id.clone()
    }

    async fn initialize(&self, token: &CancellationToken, _budget: Duration) -> StepOutcome {
        self.run_op("initialize", "initialize".into(), token).await
    }

    fn is_cleanup_required(&self) -> bool {
        self.cleanup_required
    }
}

#[async_trait]
impl ModificationOps for ScriptedContext {
    async fn run_pending_modifications(
        &self,
        token: &CancellationToken,
        _budget: Duration,
        min_past_priority: i32,
        min_present_priority: i32,
    ) -> StepOutcome {
        self.run_op(
            "pending_modifications",
            format!("pending_modifications({min_past_priority},{min_present_priority})"),
            token,
        )
        .await
    }

    async fn clean_flagged_modifications(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op(
            "clean_flagged_modifications",
            "clean_flagged_modifications".into(),
            token,
        )
        .await
    }
}

#[async_trait]
impl ActivityOps for ScriptedContext {
    async fn run_activity(&self, token: &CancellationToken, _budget: Duration) -> StepOutcome {
        self.run_op("activity", "activity".into(), token).await
    }

    async fn run_detection(&self, token: &CancellationToken, _budget: Duration) -> StepOutcome {
        self.run_op("detection", "detection".into(), token).await
    }

    async fn run_auto_sequence(&self, token: &CancellationToken, _budget: Duration) -> StepOutcome {
        self.run_op("auto_sequence", "auto_sequence".into(), token)
            .await
    }

    async fn run_processing_reason_slots(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op(
            "processing_reason_slots",
            "processing_reason_slots".into(),
            token,
        )
        .await
    }
}

#[async_trait]
impl ProductionOps for ScriptedContext {
    async fn run_production(&self, token: &CancellationToken, _budget: Duration) -> StepOutcome {
        self.run_op("production", "production".into(), token).await
    }

    async fn run_operation_slot_split(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op("operation_slot_split", "operation_slot_split".into(), token)
            .await
    }

    async fn manage_machine_state_templates(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op(
            "machine_state_templates",
            "machine_state_templates".into(),
            token,
        )
        .await
    }
}

#[async_trait]
impl TemplateOps for ScriptedContext {
    async fn manage_day_templates(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op("day_templates", "day_templates".into(), token)
            .await
    }

    async fn manage_shift_templates(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op("shift_templates", "shift_templates".into(), token)
            .await
    }

    async fn manage_week_numbers(
        &self,
        token: &CancellationToken,
        _budget: Duration,
    ) -> StepOutcome {
        self.run_op("week_numbers", "week_numbers".into(), token)
            .await
    }
}
