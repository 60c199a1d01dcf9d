//! Context contract consumed by analysis state graphs.
//!
//! A *context* is the subject of an analysis pass: the whole plant, or a
//! single monitored machine. The scheduler never looks inside a context;
//! it only drives the bounded operations the context exposes, and reads a
//! couple of cheap facts (identity, whether cleanup work is pending).
//!
//! Operations are grouped into narrow capability traits
//! ([`ModificationOps`], [`ActivityOps`], [`ProductionOps`],
//! [`TemplateOps`]) so a graph can require exactly the surface it calls
//! and nothing more. A database-backed host composes whichever traits its
//! graphs need; tests script them freely.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Identity
// ============================================================================

/// Identity of an analysis context.
///
/// Used for log correlation and to derive the persisted catch-up flag key.
/// The global context and each machine get distinct keys, so catch-up can
/// be requested per machine or for the plant-wide pass independently.
///
/// # Examples
///
/// ```rust
/// use millpass::context::ContextId;
///
/// assert_eq!(ContextId::Global.catch_up_key(), "Analysis.CatchUp.g");
/// assert_eq!(ContextId::Machine(18).catch_up_key(), "Analysis.CatchUp.18");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextId {
    /// The plant-wide analysis context.
    Global,
    /// A single monitored machine, by its persistent id.
    Machine(i64),
}

impl ContextId {
    /// Key of the persisted catch-up flag for this context.
    #[must_use]
    pub fn catch_up_key(&self) -> String {
        match self {
            ContextId::Global => "Analysis.CatchUp.g".to_string(),
            ContextId::Machine(id) => format!("Analysis.CatchUp.{id}"),
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextId::Global => write!(f, "global"),
            ContextId::Machine(id) => write!(f, "machine:{id}"),
        }
    }
}

// ============================================================================
// Step outcomes
// ============================================================================

/// Tri-state outcome of one bounded operation.
///
/// Bounded operations are expected to watch the budget they are handed and
/// return promptly; the outcome tells the calling state how to route, it is
/// never persisted.
#[derive(Debug)]
pub enum StepOutcome {
    /// The operation finished everything it set out to do.
    Completed,
    /// The operation stopped early because its time budget ran out.
    /// Progress was still made; the state may re-enter it on a later pass.
    BudgetExceeded,
    /// The operation failed. The error is logged at the state boundary and
    /// the walk continues on the configured fault branch.
    Faulted(StepError),
}

impl StepOutcome {
    /// Returns `true` for [`StepOutcome::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

/// Failure raised by a bounded operation.
///
/// Step errors never escape the walk: the bounded-action state logs them
/// and routes to its fault branch, so one broken step cannot abort a pass.
#[derive(Debug, Error, Diagnostic)]
pub enum StepError {
    /// The backing data store rejected or aborted the operation.
    #[error("storage failure: {0}")]
    #[diagnostic(
        code(millpass::step::storage),
        help("Transient storage failures are retried naturally on the next pass.")
    )]
    Storage(String),

    /// The context refused the operation in its current state.
    #[error("operation not applicable: {0}")]
    #[diagnostic(code(millpass::step::not_applicable))]
    NotApplicable(String),

    /// Any other failure reported by the operation.
    #[error("{0}")]
    #[diagnostic(code(millpass::step::other))]
    Other(String),
}

// ============================================================================
// Bounded operations
// ============================================================================

/// Type-erased bounded operation stored inside a graph node.
///
/// The operation receives the context, the walk's cancellation token and
/// the time budget it must respect. See [`bounded_op`] for the usual way
/// to build one from an async closure.
pub type BoundedOp<C> =
    Arc<dyn Fn(Arc<C>, CancellationToken, Duration) -> BoxFuture<'static, StepOutcome> + Send + Sync>;

/// Wrap an async closure as a [`BoundedOp`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use millpass::context::{ActivityOps, BoundedOp, bounded_op};
///
/// fn detection_op<C: ActivityOps>() -> BoundedOp<C> {
///     bounded_op(|c: Arc<C>, token, budget| async move {
///         c.run_detection(&token, budget).await
///     })
/// }
/// ```
pub fn bounded_op<C, F, Fut>(f: F) -> BoundedOp<C>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, CancellationToken, Duration) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StepOutcome> + Send + 'static,
{
    Arc::new(move |ctx, token, budget| Box::pin(f(ctx, token, budget)))
}

// ============================================================================
// Context contract
// ============================================================================

/// Base contract every analysis context fulfills.
///
/// `initialize` must be wired as the very first bounded action of any
/// graph; `is_cleanup_required` is a cheap predicate suitable for a
/// condition node, evaluated without touching the budget.
#[async_trait]
pub trait AnalysisContext: Send + Sync + 'static {
    /// Stable identity, also the source of the catch-up flag key.
    fn context_id(&self) -> ContextId;

    /// Prepare the context for a pass (open sessions, warm caches).
    async fn initialize(&self, token: &CancellationToken, budget: Duration) -> StepOutcome;

    /// Whether flagged-modification cleanup is currently pending.
    fn is_cleanup_required(&self) -> bool;
}

/// Modification-queue operations.
#[async_trait]
pub trait ModificationOps: AnalysisContext {
    /// Process pending modifications at or above the given priorities.
    ///
    /// `min_past_priority` / `min_present_priority` of 0 mean "everything,
    /// however old or unimportant", the expensive, rare variant.
    async fn run_pending_modifications(
        &self,
        token: &CancellationToken,
        budget: Duration,
        min_past_priority: i32,
        min_present_priority: i32,
    ) -> StepOutcome;

    /// Remove modifications that were flagged for deletion.
    async fn clean_flagged_modifications(
        &self,
        token: &CancellationToken,
        budget: Duration,
    ) -> StepOutcome;
}

/// Machine activity, detection and auto-sequence operations.
#[async_trait]
pub trait ActivityOps: AnalysisContext {
    async fn run_activity(&self, token: &CancellationToken, budget: Duration) -> StepOutcome;

    async fn run_detection(&self, token: &CancellationToken, budget: Duration) -> StepOutcome;

    async fn run_auto_sequence(&self, token: &CancellationToken, budget: Duration) -> StepOutcome;

    async fn run_processing_reason_slots(
        &self,
        token: &CancellationToken,
        budget: Duration,
    ) -> StepOutcome;
}

/// Production tracking operations.
#[async_trait]
pub trait ProductionOps: AnalysisContext {
    async fn run_production(&self, token: &CancellationToken, budget: Duration) -> StepOutcome;

    async fn run_operation_slot_split(
        &self,
        token: &CancellationToken,
        budget: Duration,
    ) -> StepOutcome;

    async fn manage_machine_state_templates(
        &self,
        token: &CancellationToken,
        budget: Duration,
    ) -> StepOutcome;
}

/// Plant-wide template and calendar operations.
#[async_trait]
pub trait TemplateOps: AnalysisContext {
    async fn manage_day_templates(&self, token: &CancellationToken, budget: Duration)
    -> StepOutcome;

    async fn manage_shift_templates(
        &self,
        token: &CancellationToken,
        budget: Duration,
    ) -> StepOutcome;

    async fn manage_week_numbers(&self, token: &CancellationToken, budget: Duration)
    -> StepOutcome;
}
