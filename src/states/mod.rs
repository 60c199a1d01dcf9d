//! State primitives: the node types of an analysis graph.
//!
//! A graph is a directed structure of immutable states, built bottom-up
//! (terminal states first, then the states that reference them) and
//! possibly cyclic: a state may point back at an earlier one to express
//! "keep looping while still productive". Once built, a graph is read-only
//! and is walked by the executor one transition at a time.
//!
//! # Node types
//!
//! - [`BoundedActionState`]: invoke a bounded operation, route on its
//!   tri-state outcome
//! - [`ConditionState`]: pure predicate routing
//! - [`FrequencyState`]: alternate a rare (expensive) and a common (cheap)
//!   branch on a wall-clock frequency
//! - [`CheckMaxTimeState`]: guard that short-circuits once the walk budget
//!   is spent
//! - [`CatchUpSwitchState`] / [`DeleteApplicationStateState`]: read and
//!   clear the persisted catch-up flag
//! - [`MultiState`]: run contributed sub-steps in registration order
//! - [`EndState`]: terminal
//!
//! # Example
//!
//! Wiring is bottom-up; referencing an already-built state creates the
//! cycles, no forward references are ever needed:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use millpass::context::{AnalysisContext, bounded_op};
//! use millpass::states::{BoundedActionState, EndState, StateRef};
//!
//! fn tiny_graph<C: AnalysisContext>() -> StateRef<C> {
//!     let end: StateRef<C> = Arc::new(EndState);
//!     BoundedActionState::new(
//!         "Initialization",
//!         bounded_op(|c: Arc<C>, token, budget| async move {
//!             c.initialize(&token, budget).await
//!         }),
//!         end.clone(),
//!         end.clone(),
//!         end,
//!     )
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clock::WalkClock;
use crate::context::AnalysisContext;

mod action;
mod app_state;
mod condition;
mod end;
mod frequency;
mod guard;
mod multi;

pub use action::BoundedActionState;
pub use app_state::{CatchUpSwitchState, DeleteApplicationStateState};
pub use condition::{ConditionState, Predicate};
pub use end::EndState;
pub use frequency::FrequencyState;
pub use guard::CheckMaxTimeState;
pub use multi::{MultiState, SubState};

/// Shared handle to a state.
///
/// Graphs are wired from these; cloning is reference-counted and states
/// are immutable after construction, so handles may be shared freely
/// within one graph instance.
pub type StateRef<C> = Arc<dyn State<C>>;

/// A named node of an analysis graph.
///
/// The transition function is the whole contract: given the context, the
/// walk's cancellation token and its clock, produce the next state. States
/// never block in their own logic; any suspension happens inside the
/// bounded operations a state invokes.
#[async_trait]
pub trait State<C: AnalysisContext>: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Whether this state terminates the walk. The executor checks this
    /// before calling [`next`](State::next); terminal states are never
    /// transitioned out of.
    fn is_end(&self) -> bool {
        false
    }

    /// Compute the state that follows this one.
    async fn next(
        &self,
        ctx: &Arc<C>,
        token: &CancellationToken,
        clock: &WalkClock,
    ) -> StateRef<C>;
}
