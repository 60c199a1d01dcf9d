//! Built-in graph for the plant-wide context.
//!
//! Walks day templates, shift templates, week numbers, then the
//! pending-modification frequency switch, and ends with
//! flagged-modification cleanup when required. The catch-up branch runs
//! the same steps with day-long budgets and clears the persisted flag
//! (`Analysis.CatchUp.g`) once it has fully completed.

use std::sync::Arc;

use crate::context::{BoundedOp, ContextId, ModificationOps, TemplateOps, bounded_op};
use crate::flags::FlagStore;
use crate::graphs::{GraphError, GraphExtension, clean_flagged_op, initialize_op, pending_op};
use crate::runtimes::AnalysisTuning;
use crate::states::{
    BoundedActionState, CatchUpSwitchState, CheckMaxTimeState, ConditionState,
    DeleteApplicationStateState, EndState, FrequencyState, StateRef,
};

fn day_templates_op<C: TemplateOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.manage_day_templates(&token, budget).await })
}

fn shift_templates_op<C: TemplateOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move {
        c.manage_shift_templates(&token, budget).await
    })
}

fn week_numbers_op<C: TemplateOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.manage_week_numbers(&token, budget).await })
}

/// Graph extension for the global (plant-wide) context.
pub struct GlobalGraph {
    store: Arc<dyn FlagStore>,
    tuning: AnalysisTuning,
    priority: f64,
}

impl GlobalGraph {
    pub const DEFAULT_PRIORITY: f64 = 10.0;

    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self {
            store,
            tuning: AnalysisTuning::default(),
            priority: Self::DEFAULT_PRIORITY,
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

    fn build_normal_branch<C>(&self, end: StateRef<C>) -> StateRef<C>
    where
        C: ModificationOps + TemplateOps,
    {
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

        let pending_all = BoundedActionState::with_step_budget(
            "PendingModificationsAll",
            pending_op(0, 0),
            t.pending_modifications_max_time,
            cond.clone(),
            cond.clone(),
            cond.clone(),
        );
        let pending_normal = BoundedActionState::with_step_budget(
            "PendingModificationsNormal",
            pending_op(t.normal_modification_priority, t.normal_modification_priority),
            t.pending_modifications_max_time,
            cond.clone(),
            cond.clone(),
            cond.clone(),
        );
        let pending_switch = FrequencyState::new(
            "PendingModificationsSwitch",
            t.very_low_priority_frequency,
            pending_all,
            pending_normal,
        );
        let g_pending = CheckMaxTimeState::new("PendingModificationsMaxTime", cond, pending_switch);

        let weeks = BoundedActionState::new(
            "WeekNumbers",
            week_numbers_op(),
            g_pending.clone(),
            g_pending.clone(),
            g_pending.clone(),
        );
        let g_weeks = CheckMaxTimeState::new("WeekNumbersMaxTime", g_pending, weeks);

        let shifts = BoundedActionState::new(
            "ShiftTemplates",
            shift_templates_op(),
            g_weeks.clone(),
            g_weeks.clone(),
            g_weeks.clone(),
        );
        let g_shifts = CheckMaxTimeState::new("ShiftTemplatesMaxTime", g_weeks, shifts);

        BoundedActionState::new(
            "DayTemplates",
            day_templates_op(),
            g_shifts.clone(),
            g_shifts.clone(),
            g_shifts,
        )
    }

    fn build_catch_up_branch<C>(&self, key: &str, end: StateRef<C>) -> StateRef<C>
    where
        C: ModificationOps + TemplateOps,
    {
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

        let pending = BoundedActionState::with_step_budget(
            "PendingModificationsCatchUp",
            pending_op(0, 0),
            budget,
            g_clean.clone(),
            g_clean.clone(),
            g_clean,
        );
        // Past this point an exhausted budget ends the walk with the flag
        // still set, so the next walk resumes the catch-up.
        let g_pending = CheckMaxTimeState::new("PendingModificationsCatchUpMaxTime", end, pending);

        let weeks = BoundedActionState::with_step_budget(
            "WeekNumbersCatchUp",
            week_numbers_op(),
            budget,
            g_pending.clone(),
            g_pending.clone(),
            g_pending.clone(),
        );
        let g_weeks = CheckMaxTimeState::new("WeekNumbersCatchUpMaxTime", g_pending, weeks);

        let shifts = BoundedActionState::with_step_budget(
            "ShiftTemplatesCatchUp",
            shift_templates_op(),
            budget,
            g_weeks.clone(),
            g_weeks.clone(),
            g_weeks.clone(),
        );
        let g_shifts = CheckMaxTimeState::new("ShiftTemplatesCatchUpMaxTime", g_weeks, shifts);

        BoundedActionState::with_step_budget(
            "DayTemplatesCatchUp",
            day_templates_op(),
            budget,
            g_shifts.clone(),
            g_shifts.clone(),
            g_shifts,
        )
    }
}

impl<C> GraphExtension<C> for GlobalGraph
where
    C: ModificationOps + TemplateOps,
{
    fn name(&self) -> &str {
        "global-analysis"
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn initialize(&self, ctx: &C) -> Result<StateRef<C>, GraphError> {
        let id = ctx.context_id();
        if id != ContextId::Global {
            return Err(GraphError::NotApplicable(format!(
                "global-analysis graph requires the global context, got {id}"
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
            "GlobalAnalysisInitialization",
            initialize_op(),
            switch.clone(),
            switch,
            end,
        ))
    }
}
