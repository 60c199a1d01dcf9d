mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{FlakyFlagStore, ScriptedContext};
use millpass::context::{AnalysisContext, ContextId};
use millpass::flags::{FlagStore, MemoryFlagStore, request_catch_up};
use millpass::graphs::{GraphExtension, MonitoredMachineGraph};
use millpass::runtimes::Executor;

fn executor() -> Executor {
    Executor::new(Duration::from_secs(40))
}

#[tokio::test]
async fn catch_up_branch_runs_once_then_flag_is_cleared() {
    let ctx = Arc::new(ScriptedContext::machine(1));
    let store = Arc::new(MemoryFlagStore::new());
    let key = ContextId::Machine(1).catch_up_key();

    request_catch_up(store.as_ref(), &ctx.context_id())
        .await
        .unwrap();

    let graph = MonitoredMachineGraph::new(Arc::clone(&store) as Arc<dyn FlagStore>);
    let initial = graph.initialize(ctx.as_ref()).unwrap();
    let token = CancellationToken::new();

    // First walk takes the catch-up branch: flagged-modification cleanup
    // runs unconditionally there, and the flag is gone afterwards.
    let first = executor().run_walk(&ctx, initial.clone(), &token).await;
    assert!(first.is_completed());
    assert_eq!(ctx.calls("clean_flagged_modifications"), 1);
    assert!(!store.exists(&key).await.unwrap());

    // A second walk started immediately after takes the normal branch;
    // with no cleanup required, the cleanup step is not visited again.
    let second = executor().run_walk(&ctx, initial, &token).await;
    assert!(second.is_completed());
    assert_eq!(ctx.calls("clean_flagged_modifications"), 1);
}

#[tokio::test]
async fn failed_flag_read_degrades_to_normal_branch() {
    let ctx = Arc::new(ScriptedContext::machine(2));
    let store = Arc::new(FlakyFlagStore::new().failing_exists());

    let graph = MonitoredMachineGraph::new(store as Arc<dyn FlagStore>);
    let initial = graph.initialize(ctx.as_ref()).unwrap();

    let report = executor()
        .run_walk(&ctx, initial, &CancellationToken::new())
        .await;

    assert!(report.is_completed());
    assert_eq!(ctx.calls("clean_flagged_modifications"), 0);
    assert_eq!(ctx.calls("activity"), 1);
}

#[tokio::test]
async fn failed_flag_delete_keeps_catch_up_pending() {
    let ctx = Arc::new(ScriptedContext::machine(3));
    let store = Arc::new(FlakyFlagStore::new().failing_delete());
    let key = ContextId::Machine(3).catch_up_key();
    store.set(&key).await.unwrap();

    let graph = MonitoredMachineGraph::new(Arc::clone(&store) as Arc<dyn FlagStore>);
    let initial = graph.initialize(ctx.as_ref()).unwrap();
    let token = CancellationToken::new();

    let first = executor().run_walk(&ctx, initial.clone(), &token).await;
    assert!(first.is_completed());
    assert!(store.exists(&key).await.unwrap());

    // The undeleted flag makes the next walk retry the catch-up branch.
    executor().run_walk(&ctx, initial, &token).await;
    assert_eq!(ctx.calls("clean_flagged_modifications"), 2);
}
