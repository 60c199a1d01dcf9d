//! # Millpass: State-machine Scheduler for Periodic Analysis Passes
//!
//! Millpass drives long-running, periodic analysis work over production
//! contexts (a whole plant, or one monitored machine) to completion of a
//! bounded pass, repeatedly, under wall-clock budgets and priority
//! constraints.
//!
//! ## Core Concepts
//!
//! - **States**: Immutable graph nodes with a transition function; graphs
//!   are wired bottom-up and may be cyclic
//! - **Bounded operations**: Context-provided async steps that self-limit
//!   to a time budget and report `Completed`, `BudgetExceeded` or
//!   `Faulted`
//! - **Graph extensions**: Pluggable graph contributors selected by
//!   priority, first registered winning ties
//! - **Executor**: Walks a graph exactly once per call, tracking the
//!   remaining budget and honoring cooperative cancellation
//! - **Runner**: Owns everything periodic: selection, looping, the
//!   inter-pass sleep
//! - **Catch-up**: A persisted flag routes one heavier pass after a gap,
//!   cleared only when that pass fully completes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//!
//! use millpass::context::{AnalysisContext, ContextId, StepOutcome, bounded_op};
//! use millpass::runtimes::Executor;
//! use millpass::states::{BoundedActionState, EndState, StateRef};
//!
//! struct Machine;
//!
//! #[async_trait]
//! impl AnalysisContext for Machine {
//!     fn context_id(&self) -> ContextId {
//!         ContextId::Machine(1)
//!     }
//!
//!     async fn initialize(&self, _: &CancellationToken, _: Duration) -> StepOutcome {
//!         StepOutcome::Completed
//!     }
//!
//!     fn is_cleanup_required(&self) -> bool {
//!         false
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Terminal state first, then the states that reference it.
//!     let end: StateRef<Machine> = Arc::new(EndState);
//!     let initial = BoundedActionState::new(
//!         "Initialization",
//!         bounded_op(|c: Arc<Machine>, token, budget| async move {
//!             c.initialize(&token, budget).await
//!         }),
//!         end.clone(),
//!         end.clone(),
//!         end,
//!     );
//!
//!     let executor = Executor::new(Duration::from_secs(40));
//!     let report = executor
//!         .run_walk(&Arc::new(Machine), initial, &CancellationToken::new())
//!         .await;
//!     assert!(report.is_completed());
//! }
//! ```
//!
//! ## Built-in Graphs
//!
//! [`graphs::MonitoredMachineGraph`] and [`graphs::GlobalGraph`] mirror
//! the production pass wiring this crate was extracted from; register
//! them (or your own extensions) in a
//! [`graphs::ExtensionRegistry`] and hand it to a
//! [`runtimes::Runner`].
//!
//! ## Module Guide
//!
//! - [`context`] - Context contract, capability traits, step outcomes
//! - [`states`] - State primitives (the graph node types)
//! - [`graphs`] - Extension registry, priority selection, built-in graphs
//! - [`runtimes`] - One-walk executor and the periodic runner
//! - [`flags`] - Persisted flag store contract for the catch-up marker
//! - [`clock`] - Wall-clock budget tracking for one walk
//! - [`telemetry`] - Optional tracing subscriber setup

pub mod clock;
pub mod context;
pub mod flags;
pub mod graphs;
pub mod runtimes;
pub mod states;
pub mod telemetry;
