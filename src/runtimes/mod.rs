//! Runtime layer: one-walk execution and the periodic runner.
//!
//! Split deliberately in two:
//!
//! - [`Executor`] performs exactly one walk per call, which keeps it unit
//!   testable without any time-based flakiness;
//! - [`Runner`] owns everything periodic (graph selection, the optional
//!   loop, the inter-pass sleep) and runs one context per instance.
//!
//! Parallelism across contexts is the host's concern: spawn one runner
//! per context on its own task. Contexts never share mutable state, so no
//! locking is needed inside the core.

pub mod config;
pub mod executor;
pub mod runner;

pub use config::{AnalysisTuning, RunnerConfig};
pub use executor::{Executor, WalkOutcome, WalkReport};
pub use runner::{RunSummary, Runner};
