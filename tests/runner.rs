mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{OpBehavior, ScriptedContext, StubExtension};
use millpass::flags::MemoryFlagStore;
use millpass::graphs::{ExtensionRegistry, GlobalGraph, MonitoredMachineGraph};
use millpass::runtimes::{Runner, RunnerConfig, WalkOutcome};

fn machine_registry(store: Arc<MemoryFlagStore>) -> ExtensionRegistry<ScriptedContext> {
    ExtensionRegistry::new().register(Arc::new(MonitoredMachineGraph::new(store)))
}

#[tokio::test]
async fn context_without_graph_is_a_noop_pass() {
    let ctx = Arc::new(ScriptedContext::machine(1));
    let registry: ExtensionRegistry<ScriptedContext> =
        ExtensionRegistry::new().register(StubExtension::failing("broken", 10.0));

    let summary = Runner::new(registry)
        .run(Arc::clone(&ctx), CancellationToken::new())
        .await;

    assert!(summary.graph.is_none());
    assert!(summary.walks.is_empty());
    assert!(ctx.journal().is_empty());
}

#[tokio::test]
async fn single_pass_walks_once() {
    let ctx = Arc::new(ScriptedContext::machine(1));
    let registry = machine_registry(Arc::new(MemoryFlagStore::new()));

    let summary = Runner::new(registry)
        .run(Arc::clone(&ctx), CancellationToken::new())
        .await;

    assert_eq!(summary.graph.as_deref(), Some("monitored-machine"));
    assert_eq!(summary.walks.len(), 1);
    assert!(summary.all_completed());
    assert_eq!(ctx.calls("initialize"), 1);
}

#[tokio::test(start_paused = true)]
async fn looping_runner_restarts_walks_until_cancelled() {
    // The third pass cancels the token from inside its first step, so the
    // loop ends with two completed walks and one aborted walk.
    let ctx = Arc::new(ScriptedContext::machine(1).behave("initialize", OpBehavior::CancelTokenOnCall(3)));
    let registry = machine_registry(Arc::new(MemoryFlagStore::new()));
    let token = CancellationToken::new();

    let summary = Runner::new(registry)
        .with_config(RunnerConfig::looping(Duration::from_millis(50)))
        .run(Arc::clone(&ctx), token)
        .await;

    assert_eq!(summary.walks.len(), 3);
    assert_eq!(summary.walks[0].outcome, WalkOutcome::Completed);
    assert_eq!(summary.walks[1].outcome, WalkOutcome::Completed);
    assert_eq!(summary.walks[2].outcome, WalkOutcome::Cancelled);
    assert_eq!(ctx.calls("initialize"), 3);
}

#[tokio::test]
async fn mixed_registry_selects_by_context_kind() {
    let store = Arc::new(MemoryFlagStore::new());
    let registry: ExtensionRegistry<ScriptedContext> = ExtensionRegistry::new()
        .register(Arc::new(MonitoredMachineGraph::new(Arc::clone(&store) as _)))
        .register(Arc::new(GlobalGraph::new(Arc::clone(&store) as _)));

    let machine = Arc::new(ScriptedContext::machine(4));
    let machine_summary = Runner::new(registry)
        .run(Arc::clone(&machine), CancellationToken::new())
        .await;
    assert_eq!(machine_summary.graph.as_deref(), Some("monitored-machine"));

    let registry: ExtensionRegistry<ScriptedContext> = ExtensionRegistry::new()
        .register(Arc::new(MonitoredMachineGraph::new(Arc::clone(&store) as _)))
        .register(Arc::new(GlobalGraph::new(Arc::clone(&store) as _)));
    let global = Arc::new(ScriptedContext::global());
    let global_summary = Runner::new(registry)
        .run(Arc::clone(&global), CancellationToken::new())
        .await;
    assert_eq!(global_summary.graph.as_deref(), Some("global-analysis"));
    assert_eq!(global.calls("day_templates"), 1);
    assert_eq!(global.calls("shift_templates"), 1);
    assert_eq!(global.calls("week_numbers"), 1);
}
