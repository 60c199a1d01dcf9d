//! Test-only states and graph extensions.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use millpass::clock::WalkClock;
use millpass::context::AnalysisContext;
use millpass::graphs::{GraphError, GraphExtension};
use millpass::states::{EndState, State, StateRef};

/// A named non-terminal state used to observe routing decisions.
pub struct MarkerState {
    name: &'static str,
}

impl MarkerState {
    pub fn arc(name: &'static str) -> Arc<Self> {
        Arc::new(Self { name })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for MarkerState {
    fn name(&self) -> &str {
        self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        Arc::new(EndState)
    }
}

/// A state whose successor is bound after construction, letting tests
/// build genuinely cyclic graphs.
pub struct LateBoundState<C: AnalysisContext> {
    name: &'static str,
    next: Mutex<Option<StateRef<C>>>,
}

impl<C: AnalysisContext> LateBoundState<C> {
    pub fn arc(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            next: Mutex::new(None),
        })
    }

    pub fn bind(&self, next: StateRef<C>) {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = Some(next);
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for LateBoundState<C> {
    fn name(&self) -> &str {
        self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        self.next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .expect("LateBoundState visited before bind()")
    }
}

/// A graph extension with a fixed priority that either fails to
/// initialize or produces a trivially terminal graph.
pub struct StubExtension {
    pub name: &'static str,
    pub priority: f64,
    pub fail: bool,
}

impl StubExtension {
    pub fn ok(name: &'static str, priority: f64) -> Arc<Self> {
        Arc::new(Self {
            name,
            priority,
            fail: false,
        })
    }

    pub fn failing(name: &'static str, priority: f64) -> Arc<Self> {
        Arc::new(Self {
            name,
            priority,
            fail: true,
        })
    }
}

impl<C: AnalysisContext> GraphExtension<C> for StubExtension {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    fn initialize(&self, _ctx: &C) -> Result<StateRef<C>, GraphError> {
        if self.fail {
            Err(GraphError::Configuration("scripted failure".into()))
        } else {
            Ok(Arc::new(EndState))
        }
    }
}
