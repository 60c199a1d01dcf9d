//! Persisted-flag nodes: the catch-up switch and its clearing state.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::clock::WalkClock;
use crate::context::AnalysisContext;
use crate::flags::FlagStore;
use crate::states::{State, StateRef};

/// Routes on the persisted catch-up flag.
///
/// Wired as the state reachable right after graph initialization, so the
/// flag is read once at the very start of each walk. While the flag is
/// present, the catch-up branch runs instead of the normal one; the flag
/// is only cleared by [`DeleteApplicationStateState`] at the end of that
/// branch, so an interrupted catch-up is retried on the next walk.
///
/// A failure to read the flag is downgraded to "flag absent" (the cheaper
/// normal branch) but logged as a warning, since silently skipping
/// catch-up changes behavior.
pub struct CatchUpSwitchState<C: AnalysisContext> {
    name: String,
    store: Arc<dyn FlagStore>,
    key: String,
    catch_up_next: StateRef<C>,
    normal_next: StateRef<C>,
}

impl<C: AnalysisContext> CatchUpSwitchState<C> {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn FlagStore>,
        key: impl Into<String>,
        catch_up_next: StateRef<C>,
        normal_next: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            store,
            key: key.into(),
            catch_up_next,
            normal_next,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for CatchUpSwitchState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        match self.store.exists(&self.key).await {
            Ok(true) => {
                debug!(state = %self.name, key = %self.key, "catch-up requested, taking catch-up branch");
                self.catch_up_next.clone()
            }
            Ok(false) => self.normal_next.clone(),
            Err(err) => {
                warn!(
                    state = %self.name,
                    key = %self.key,
                    %err,
                    "could not read catch-up flag, assuming absent"
                );
                self.normal_next.clone()
            }
        }
    }
}

/// Deletes a persisted flag, then routes unconditionally.
///
/// Placed at the end of the catch-up branch so the flag is cleared exactly
/// when the catch-up work has fully completed. A failed delete is logged
/// and the walk continues; the still-present flag makes the next walk
/// retry the catch-up branch.
pub struct DeleteApplicationStateState<C: AnalysisContext> {
    name: String,
    store: Arc<dyn FlagStore>,
    key: String,
    next: StateRef<C>,
}

impl<C: AnalysisContext> DeleteApplicationStateState<C> {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn FlagStore>,
        key: impl Into<String>,
        next: StateRef<C>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            store,
            key: key.into(),
            next,
        })
    }
}

#[async_trait]
impl<C: AnalysisContext> State<C> for DeleteApplicationStateState<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next(
        &self,
        _ctx: &Arc<C>,
        _token: &CancellationToken,
        _clock: &WalkClock,
    ) -> StateRef<C> {
        if let Err(err) = self.store.delete(&self.key).await {
            error!(state = %self.name, key = %self.key, %err, "could not delete flag");
        }
        self.next.clone()
    }
}
