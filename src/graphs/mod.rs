//! Graph assembly and priority selection.
//!
//! Extensions contribute complete state graphs for a context type. At
//! startup the host composes an [`ExtensionRegistry`] from statically
//! linked (or configuration-declared) extensions; the registry then
//! assembles a graph for a concrete context by asking every extension to
//! initialize and keeping the highest-priority survivor.
//!
//! Built-in extensions live in [`machine`] and [`global`]; hosts are free
//! to register their own alongside or instead of them.
//!
//! # Selection rules
//!
//! - An extension whose `initialize` fails is excluded and logged, never
//!   escalated, unless *no* extension succeeds, in which case the context
//!   is skipped for the pass (reported, not fatal).
//! - Among survivors the numerically highest priority wins.
//! - Ties go to the first registered extension. This is part of the
//!   contract, not an accident: selection must be deterministic.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::{AnalysisContext, BoundedOp, ModificationOps, bounded_op};
use crate::states::StateRef;

pub mod global;
pub mod machine;

pub use global::GlobalGraph;
pub use machine::MonitoredMachineGraph;

/// A pluggable graph contributor.
///
/// `initialize` validates the extension against a concrete context
/// (configuration present, context applicable) and, on success, builds
/// the graph and returns its initial state. A fresh graph is built per
/// call: frequency counters live inside graph nodes and must be
/// per-context, never shared across contexts.
pub trait GraphExtension<C: AnalysisContext>: Send + Sync {
    /// Name used in logs and selection reports.
    fn name(&self) -> &str;

    /// Selection priority; numerically highest successful extension wins.
    fn priority(&self) -> f64;

    /// Validate against `ctx` and build the graph.
    fn initialize(&self, ctx: &C) -> Result<StateRef<C>, GraphError>;
}

/// Why an extension could not build a graph for a context.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The extension's configuration is missing or invalid.
    #[error("invalid graph configuration: {0}")]
    #[diagnostic(
        code(millpass::graphs::configuration),
        help("The extension is skipped for this pass; fix its configuration and restart.")
    )]
    Configuration(String),

    /// The extension does not apply to this context.
    #[error("extension does not apply to this context: {0}")]
    #[diagnostic(code(millpass::graphs::not_applicable))]
    NotApplicable(String),
}

/// The graph chosen for one context.
pub struct SelectedGraph<C: AnalysisContext> {
    /// Name of the winning extension.
    pub extension: String,
    /// Its priority at selection time.
    pub priority: f64,
    /// Initial state of the assembled graph.
    pub initial: StateRef<C>,
}

/// Ordered collection of graph extensions for one context type.
pub struct ExtensionRegistry<C: AnalysisContext> {
    extensions: Vec<Arc<dyn GraphExtension<C>>>,
}

impl<C: AnalysisContext> Default for ExtensionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: AnalysisContext> ExtensionRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Append an extension. Later registrations lose ties.
    #[must_use]
    pub fn register(mut self, extension: Arc<dyn GraphExtension<C>>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Assemble a graph for `ctx`, applying the selection rules above.
    ///
    /// Returns `None` when no extension succeeds; the caller must treat
    /// the context as a no-op pass, not as an error.
    pub fn assemble(&self, ctx: &C) -> Option<SelectedGraph<C>> {
        let mut best: Option<SelectedGraph<C>> = None;
        for extension in &self.extensions {
            match extension.initialize(ctx) {
                Ok(initial) => {
                    let priority = extension.priority();
                    let better = best
                        .as_ref()
                        .is_none_or(|current| priority > current.priority);
                    if better {
                        best = Some(SelectedGraph {
                            extension: extension.name().to_string(),
                            priority,
                            initial,
                        });
                    }
                }
                Err(err) => {
                    warn!(
                        extension = extension.name(),
                        %err,
                        "graph extension failed to initialize, excluded from selection"
                    );
                }
            }
        }
        match &best {
            Some(selected) => debug!(
                extension = %selected.extension,
                priority = selected.priority,
                "graph selected"
            ),
            None => warn!("no graph extension succeeded, context will no-op"),
        }
        best
    }
}

// Operations shared by the built-in graphs.

pub(crate) fn initialize_op<C: AnalysisContext>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move { c.initialize(&token, budget).await })
}

pub(crate) fn clean_flagged_op<C: ModificationOps>() -> BoundedOp<C> {
    bounded_op(|c: Arc<C>, token, budget| async move {
        c.clean_flagged_modifications(&token, budget).await
    })
}

pub(crate) fn pending_op<C: ModificationOps>(min_past: i32, min_present: i32) -> BoundedOp<C> {
    bounded_op(move |c: Arc<C>, token, budget| async move {
        c.run_pending_modifications(&token, budget, min_past, min_present)
            .await
    })
}
