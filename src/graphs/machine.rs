//! Built-in graph for one monitored machine.
//!
//! The pass walks, in order: machine-state templates, operation-slot
//! split, production, the pending-modification frequency ladder, any
//! contributed extension steps, activity, processing-reason slots,
//! detection, auto-sequence, and finally flagged-modification cleanup
//! when required. Max-time guards sit before every expensive stretch so
//! an exhausted budget cascades the walk to the terminal state instead of
//! starting more work.
//!
//! When the persisted catch-up flag is set for the machine, a heavier
//! variant of the same pass runs instead, with day-long step budgets and
//! no frequency throttling, and the flag is deleted once that branch has
//! fully completed.

use std::sync::Arc;

use crate::context::{
    ActivityOps, AnalysisContext, BoundedOp, ContextId, ModificationOps, ProductionOps, bounded_op,
};
use crate::flags::FlagStore;
use crate::graphs::{GraphError, GraphExtension, clean_flagged_op, initialize_op, pending_op};
use crate::runtimes::AnalysisTuning;
use crate::states::{
    BoundedActionState, CatchUpSwitchState, CheckMaxTimeState, ConditionState,
    DeleteApplicationStateState, EndState, FrequencyState, MultiState, StateRef, SubState,
};

fn activity_op<C: ActivityOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.run_activity(&token, budget).await })
}

fn detection_op<C: ActivityOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.run_detection(&token, budget).await })
}

fn auto_sequence_op<C: ActivityOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.run_auto_sequence(&token, budget).await })
}

fn reason_slots_op<C: ActivityOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move {
        c.run_processing_reason_slots(&token, budget).await
    })
}

fn production_op<C: ProductionOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.run_production(&token, budget).await })
}

fn operation_slot_split_op<C: ProductionOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move {
        c.run_operation_slot_split(&token, budget).await
    })
}

fn machine_state_templates_op<C: ProductionOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move {
        c.manage_machine_state_templates(&token, budget).await
    })
}

/// Graph extension for monitored-machine contexts.
///
/// Applies only to [`ContextId::Machine`] contexts; initializing against
/// the global context is reported as not applicable so the registry can
/// fall back to other extensions.
pub struct MonitoredMachineGraph<C: AnalysisContext> {
    store: Arc<dyn FlagStore>,
    tuning: AnalysisTuning,
    priority: f64,
    contributed: Vec<SubState<C>>,
}

impl<C> MonitoredMachineGraph<C>
where
    C: ActivityOps + ModificationOps + ProductionOps,
{
    pub const DEFAULT_PRIORITY: f64 = 20.0;

    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self {
            store,
            tuning: AnalysisTuning::default(),
            priority: Self::DEFAULT_PRIORITY,
            contributed: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: AnalysisTuning) -> Self {
        self.tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Contribute an extension step, run in registration order between
    /// the pending-modification ladder and the activity analysis.
    #[must_use]
    pub fn contribute(mut self, sub: SubState<C>) -> Self {
        self.contributed.push(sub);
        self
    }

    fn build_normal_branch(&self, end: StateRef<C>) -> StateRef<C> {
        let t = &self.tuning;

        let clean = BoundedActionState::with_step_budget(
            "CleanFlaggedModifications",
            clean_flagged_op(),
            t.clean_flagged_modifications_max_time,
            end.clone(),
            end.clone(),
            end.clone(),
        );
        let g_clean = CheckMaxTimeState::new("CleanFlaggedModificationsMaxTime", end.clone(), clean);
        let cond = ConditionState::new(
            "TestIsCleanupRequired",
            Arc::new(|c: &C| c.is_cleanup_required()),
            g_clean,
            end.clone(),
        );

        let auto_seq = BoundedActionState::new(
            "AutoSequence",
            auto_sequence_op(),
            cond.clone(),
            cond.clone(),
            cond.clone(),
        );
        let g_auto = CheckMaxTimeState::new("AutoSequenceMaxTime", end.clone(), auto_seq);

        let detection = BoundedActionState::new(
            "Detection",
            detection_op(),
            g_auto.clone(),
            g_auto.clone(),
            g_auto.clone(),
        );
        let g_det = CheckMaxTimeState::new("DetectionMaxTime", g_auto, detection);

        let reason_slots = BoundedActionState::with_step_budget(
            "ProcessingReasonSlots",
            reason_slots_op(),
            t.processing_reason_slots_max_time,
            g_det.clone(),
            g_det.clone(),
            g_det.clone(),
        );
        let g_reason = CheckMaxTimeState::new("ProcessingReasonSlotsMaxTime", g_det, reason_slots);

        // After an activity fault, flush the reason slots once, then stop.
        let reason_recovery = BoundedActionState::with_step_budget(
            "ProcessingReasonSlotsRecovery",
            reason_slots_op(),
            t.processing_reason_slots_max_time,
            end.clone(),
            end.clone(),
            end.clone(),
        );
        let g_recovery =
            CheckMaxTimeState::new("ProcessingReasonSlotsRecoveryMaxTime", end.clone(), reason_recovery);

        let activity = BoundedActionState::new(
            "Activity",
            activity_op(),
            g_reason.clone(),
            g_reason.clone(),
            g_recovery,
        );
        let g_activity = CheckMaxTimeState::new("ActivityMaxTime", g_reason, activity);

        let multi = MultiState::new(
            "ExtensionAnalysisStates",
            self.contributed.clone(),
            g_activity.clone(),
        );

        let pending_all = BoundedActionState::with_step_budget(
            "PendingModificationsAll",
            pending_op(0, 0),
            t.pending_modifications_max_time,
            multi.clone(),
            multi.clone(),
            multi.clone(),
        );
        let pending_low = BoundedActionState::with_step_budget(
            "PendingModificationsLow",
            pending_op(t.low_modification_priority, t.low_modification_priority),
            t.pending_modifications_max_time,
            multi.clone(),
            multi.clone(),
            multi.clone(),
        );
        let pending_normal = BoundedActionState::with_step_budget(
            "PendingModificationsNormal",
            pending_op(t.normal_modification_priority, t.normal_modification_priority),
            t.pending_modifications_max_time,
            multi.clone(),
            multi.clone(),
            multi,
        );
        let low_or_normal = FrequencyState::new(
            "PendingModificationsLowSwitch",
            t.low_priority_frequency,
            pending_low,
            pending_normal,
        );
        let pending_switch = FrequencyState::new(
            "PendingModificationsSwitch",
            t.very_low_priority_frequency,
            pending_all,
            low_or_normal,
        );
        let g_pending =
            CheckMaxTimeState::new("PendingModificationsMaxTime", g_activity, pending_switch);

        let production = BoundedActionState::with_step_budget(
            "Production",
            production_op(),
            t.production_max_time,
            g_pending.clone(),
            g_pending.clone(),
            g_pending.clone(),
        );
        let g_production = CheckMaxTimeState::new("ProductionMaxTime", g_pending, production);

        let op_split = BoundedActionState::with_step_budget(
            "OperationSlotSplit",
            operation_slot_split_op(),
            t.operation_slot_split_max_time,
            g_production.clone(),
            g_production.clone(),
            g_production.clone(),
        );
        let g_split = CheckMaxTimeState::new("OperationSlotSplitMaxTime", g_production, op_split);

        BoundedActionState::with_step_budget(
            "MachineStateTemplate",
            machine_state_templates_op(),
            t.machine_state_templates_max_time,
            g_split.clone(),
            g_split.clone(),
            g_split,
        )
    }

    fn build_catch_up_branch(&self, key: &str, end: StateRef<C>) -> StateRef<C> {
        let budget = self.tuning.catch_up_step_max_time;

        let delete: StateRef<C> = DeleteApplicationStateState::new(
            "DeleteCatchUpFlag",
            Arc::clone(&self.store),
            key,
            end.clone(),
        );

        let clean = BoundedActionState::with_step_budget(
            "CleanFlaggedModificationsCatchUp",
            clean_flagged_op(),
            budget,
            delete.clone(),
            delete.clone(),
            delete.clone(),
        );
        let g_clean =
            CheckMaxTimeState::new("CleanFlaggedModificationsCatchUpMaxTime", delete, clean);

        let auto_seq = BoundedActionState::with_step_budget(
            "AutoSequenceCatchUp",
            auto_sequence_op(),
            budget,
            g_clean.clone(),
            g_clean.clone(),
            g_clean,
        );
        // Past this point an exhausted budget ends the walk with the flag
        // still set, so the next walk resumes the catch-up.
        let g_auto = CheckMaxTimeState::new("AutoSequenceCatchUpMaxTime", end, auto_seq);

        let detection = BoundedActionState::with_step_budget(
            "DetectionCatchUp",
            detection_op(),
            budget,
            g_auto.clone(),
            g_auto.clone(),
            g_auto.clone(),
        );
        let g_det = CheckMaxTimeState::new("DetectionCatchUpMaxTime", g_auto, detection);

        let reason_slots = BoundedActionState::with_step_budget(
            "ProcessingReasonSlotsCatchUp",
            reason_slots_op(),
            budget,
            g_det.clone(),
            g_det.clone(),
            g_det.clone(),
        );
        let g_reason = CheckMaxTimeState::new("ProcessingReasonSlotsCatchUpMaxTime", g_det, reason_slots);

        let activity = BoundedActionState::with_step_budget(
            "ActivityCatchUp",
            activity_op(),
            budget,
            g_reason.clone(),
            g_reason.clone(),
            g_reason.clone(),
        );
        let g_activity = CheckMaxTimeState::new("ActivityCatchUpMaxTime", g_reason, activity);

        let multi = MultiState::new(
            "ExtensionAnalysisStatesCatchUp",
            self.contributed.clone(),
            g_activity,
        );

        let pending = BoundedActionState::with_step_budget(
            "PendingModificationsCatchUp",
            pending_op(0, 0),
            budget,
            multi.clone(),
            multi.clone(),
            multi.clone(),
        );
        let g_pending = CheckMaxTimeState::new("PendingModificationsCatchUpMaxTime", multi, pending);

        let production = BoundedActionState::with_step_budget(
            "ProductionCatchUp",
            production_op(),
            budget,
            g_pending.clone(),
            g_pending.clone(),
            g_pending.clone(),
        );
        let g_production = CheckMaxTimeState::new("ProductionCatchUpMaxTime", g_pending, production);

        let op_split = BoundedActionState::with_step_budget(
            "OperationSlotSplitCatchUp",
            operation_slot_split_op(),
            budget,
            g_production.clone(),
            g_production.clone(),
            g_production.clone(),
        );
        let g_split = CheckMaxTimeState::new("OperationSlotSplitCatchUpMaxTime", g_production, op_split);

        BoundedActionState::with_step_budget(
            "MachineStateTemplateCatchUp",
            machine_state_templates_op(),
            budget,
            g_split.clone(),
            g_split.clone(),
            g_split,
        )
    }
}

impl<C> GraphExtension<C> for MonitoredMachineGraph<C>
where
    C: ActivityOps + ModificationOps + ProductionOps,
{
    fn name(&self) -> &str {
        "monitored-machine"
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn initialize(&self, ctx: &C) -> Result<StateRef<C>, GraphError> {
        let id = ctx.context_id();
        if !matches!(id, ContextId::Machine(_)) {
            return Err(GraphError::NotApplicable(format!(
                "monitored-machine graph requires a machine context, got {id}"
            )));
        }
        let key = id.catch_up_key();

        let end: StateRef<C> = Arc::new(EndState);
        let normal_first = self.build_normal_branch(end.clone());
        let catch_up_first = self.build_catch_up_branch(&key, end.clone());

        let switch = CatchUpSwitchState::new(
            "CatchUpSwitch",
            Arc::clone(&self.store),
            key,
            catch_up_first,
            normal_first,
        );

        Ok(BoundedActionState::new(
            "MachineActivityAnalysisInitialization",
            initialize_op(),
            switch.clone(),
            switch,
            end,
        ))
    }
}
