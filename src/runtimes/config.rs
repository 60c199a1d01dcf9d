//! Tuning and runner configuration.
//!
//! Defaults mirror the production constants the built-in graphs were
//! tuned with; every duration can be overridden through the environment
//! (`MILLPASS_*` variables, whole seconds), resolved once at load time
//! via `dotenvy`.

use std::time::Duration;

use uuid::Uuid;

/// Time budgets, frequencies and priorities consumed by the built-in
/// graph extensions.
#[derive(Clone, Debug)]
pub struct AnalysisTuning {
    /// Overall budget for one walk.
    pub max_walk_time: Duration,
    /// Per-step cap for pending-modification processing.
    pub pending_modifications_max_time: Duration,
    /// Per-step cap for flagged-modification cleanup.
    pub clean_flagged_modifications_max_time: Duration,
    /// Per-step cap for production analysis.
    pub production_max_time: Duration,
    /// Per-step cap for operation-slot splitting.
    pub operation_slot_split_max_time: Duration,
    /// Per-step cap for machine-state template management.
    pub machine_state_templates_max_time: Duration,
    /// Per-step cap for processing-reason-slot analysis.
    pub processing_reason_slots_max_time: Duration,
    /// Per-step cap inside the catch-up branch, where steps are expected
    /// to chew through an arbitrarily large backlog.
    pub catch_up_step_max_time: Duration,
    /// How often the low-priority modification pass runs.
    pub low_priority_frequency: Duration,
    /// How often the process-everything modification pass runs.
    pub very_low_priority_frequency: Duration,
    /// Priority floor of the normal modification pass.
    pub normal_modification_priority: i32,
    /// Priority floor of the low-priority modification pass.
    pub low_modification_priority: i32,
}

impl Default for AnalysisTuning {
    fn default() -> Self {
        Self {
            max_walk_time: Duration::from_secs(40),
            pending_modifications_max_time: Duration::from_secs(120),
            clean_flagged_modifications_max_time: Duration::from_secs(600),
            production_max_time: Duration::from_secs(120),
            operation_slot_split_max_time: Duration::from_secs(120),
            machine_state_templates_max_time: Duration::from_secs(100),
            processing_reason_slots_max_time: Duration::from_secs(120),
            catch_up_step_max_time: Duration::from_secs(24 * 3600),
            low_priority_frequency: Duration::from_secs(120),
            very_low_priority_frequency: Duration::from_secs(600),
            normal_modification_priority: 100,
            low_modification_priority: 50,
        }
    }
}

impl AnalysisTuning {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut tuning = Self::default();
        apply_env_duration("MILLPASS_MAX_WALK_TIME", &mut tuning.max_walk_time);
        apply_env_duration(
            "MILLPASS_PENDING_MODIFICATIONS_MAX_TIME",
            &mut tuning.pending_modifications_max_time,
        );
        apply_env_duration(
            "MILLPASS_CLEAN_FLAGGED_MODIFICATIONS_MAX_TIME",
            &mut tuning.clean_flagged_modifications_max_time,
        );
        apply_env_duration("MILLPASS_PRODUCTION_MAX_TIME", &mut tuning.production_max_time);
        apply_env_duration(
            "MILLPASS_OPERATION_SLOT_SPLIT_MAX_TIME",
            &mut tuning.operation_slot_split_max_time,
        );
        apply_env_duration(
            "MILLPASS_MACHINE_STATE_TEMPLATES_MAX_TIME",
            &mut tuning.machine_state_templates_max_time,
        );
        apply_env_duration(
            "MILLPASS_PROCESSING_REASON_SLOTS_MAX_TIME",
            &mut tuning.processing_reason_slots_max_time,
        );
        apply_env_duration(
            "MILLPASS_CATCH_UP_STEP_MAX_TIME",
            &mut tuning.catch_up_step_max_time,
        );
        apply_env_duration(
            "MILLPASS_LOW_PRIORITY_FREQUENCY",
            &mut tuning.low_priority_frequency,
        );
        apply_env_duration(
            "MILLPASS_VERY_LOW_PRIORITY_FREQUENCY",
            &mut tuning.very_low_priority_frequency,
        );
        tuning
    }
}

/// Looping behavior of the [`Runner`](crate::runtimes::Runner).
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Correlation id stamped on every span of the run.
    pub run_id: String,
    /// Start a new walk after each completed one.
    pub loop_passes: bool,
    /// Sleep between walks when looping.
    pub pass_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            loop_passes: false,
            pass_interval: Duration::from_secs(10),
        }
    }
}

impl RunnerConfig {
    /// Loop forever with the given inter-pass sleep.
    #[must_use]
    pub fn looping(pass_interval: Duration) -> Self {
        Self {
            loop_passes: true,
            pass_interval,
            ..Self::default()
        }
    }
}

fn apply_env_duration(key: &str, slot: &mut Duration) {
    if let Some(value) = std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
    {
        *slot = Duration::from_secs(value);
    }
}
