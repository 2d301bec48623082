//! The recursive dataflow execution driver.
//!
//! Executing a worker resolves all of its upstream producers first
//! (depth-first, in edge insertion order), copies the produced values onto
//! the worker's input handles, applies conditional gating, and finally runs
//! the worker's registry behavior. Within one pass every worker runs at
//! most once; re-entry during resolution is reported as a cycle.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use tracing::debug;

use crate::{
    AgentflowError, Result,
    common::Vars,
    events::ExecutionEvent,
    graph::WorkerId,
    runtime::ExecutionContext,
};

/// Execute a worker and, transitively, its whole upstream subgraph.
///
/// The caller is responsible for resetting execution state between passes
/// (see [`ExecutionContext::reset`]); `execute` never resets. Behavior
/// errors propagate unchanged, with no retry; after an error a reset and
/// re-run is always safe.
pub async fn execute(
    ctx: &Arc<ExecutionContext>,
    wid: &WorkerId,
    params: &Vars,
) -> Result<()> {
    execute_boxed(ctx.clone(), wid.clone(), params.clone()).await
}

/// Boxed recursion: the graph depth is data-dependent, so the future is
/// heap-allocated per worker instead of nesting generic futures.
fn execute_boxed(
    ctx: Arc<ExecutionContext>,
    wid: WorkerId,
    params: Vars,
) -> BoxFuture<'static, Result<()>> {
    async move {
        if ctx.is_canceled() {
            return Err(AgentflowError::Canceled);
        }

        let executed = ctx
            .agent()
            .with_worker(&wid, |w| w.executed())
            .ok_or_else(|| AgentflowError::Worker(format!("worker '{}' not found", wid)))?;
        if executed {
            // memoized: at most one run per pass
            return Ok(());
        }

        if !ctx.enter(&wid) {
            return Err(AgentflowError::CyclicGraph(wid));
        }
        let ret = resolve_and_run(&ctx, &wid, &params).await;
        ctx.leave(&wid);
        ret
    }
    .boxed()
}

async fn resolve_and_run(
    ctx: &Arc<ExecutionContext>,
    wid: &WorkerId,
    params: &Vars,
) -> Result<()> {
    // Upstream before downstream: run every producer, then pull its output
    // value onto our input handle. Sequential and left-to-right; sibling
    // order is stable but not a semantic contract.
    for producer in ctx.agent().producers(wid, None) {
        execute_boxed(ctx.clone(), producer.source.clone(), params.clone()).await?;

        if ctx.agent().copy_edge_value(&producer, wid) {
            ctx.emit(ExecutionEvent::HandleValueChanged {
                worker: wid.clone(),
                handle: producer.target_handle.clone(),
            });
        }
    }

    let open = ctx.agent().with_worker(wid, |w| w.gate_open()).unwrap_or(true);
    if !open {
        // Condition unmet: the behavior does not run, but the worker still
        // counts as handled for this pass.
        ctx.agent().with_worker_mut(wid, |w| {
            w.touch();
            w.mark_executed();
        });
        ctx.set_current(None);
        ctx.emit(ExecutionEvent::WorkerSkipped(wid.clone()));
        debug!(worker = %wid, "condition unmet, behavior skipped");
        return Ok(());
    }

    let kind = ctx.agent().with_worker(wid, |w| w.kind().to_string()).unwrap_or_default();
    let behavior = ctx.registry().lookup(&kind)?;

    ctx.agent().with_worker_mut(wid, |w| {
        w.touch();
        w.mark_executed();
    });

    ctx.set_current(Some(wid.clone()));
    ctx.emit(ExecutionEvent::WorkerStarted(wid.clone()));
    debug!(worker = %wid, kind = %kind, "executing worker behavior");

    let ret = behavior.execute(ctx, wid, params).await;

    match ret {
        Ok(()) => {
            ctx.emit(ExecutionEvent::WorkerFinished(wid.clone()));
            ctx.set_current(None);
            Ok(())
        }
        Err(e) => {
            // no retry, no rollback: clear the pointer and let the error
            // bubble to the top-level caller
            ctx.set_current(None);
            Err(e)
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::execute;
    use crate::{
        AgentflowError, ConditionOperator, ExecutionEvent, IoType, IoValue, Result, Vars, WorkerCondition,
        graph::{Agent, WorkerId},
        model::{EdgeConfig, HandleConfig, WorkerConfig},
        registry::{Registry, WorkerBehavior},
        runtime::ExecutionContext,
    };

    /// Writes the pass parameter `text` to its `text` output handle.
    struct RequestBehavior;

    #[async_trait::async_trait]
    impl WorkerBehavior for RequestBehavior {
        async fn execute(
            &self,
            ctx: &ExecutionContext,
            wid: &WorkerId,
            params: &Vars,
        ) -> Result<()> {
            let text = params.get::<String>("text").unwrap_or_default();
            ctx.set_handle_value(wid, "text", IoValue::String(text))
        }
    }

    /// Copies its `text` input to its `text` output and records the call.
    struct EchoBehavior {
        calls: Arc<AtomicUsize>,
        trace: Arc<Mutex<Vec<WorkerId>>>,
    }

    #[async_trait::async_trait]
    impl WorkerBehavior for EchoBehavior {
        async fn execute(
            &self,
            ctx: &ExecutionContext,
            wid: &WorkerId,
            _: &Vars,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.trace.lock().unwrap().push(wid.clone());
            let value = ctx.handle_value(wid, "text-in").unwrap_or_default();
            ctx.set_handle_value(wid, "text", value)
        }
    }

    struct FailingBehavior;

    #[async_trait::async_trait]
    impl WorkerBehavior for FailingBehavior {
        async fn execute(
            &self,
            _: &ExecutionContext,
            _: &WorkerId,
            _: &Vars,
        ) -> Result<()> {
            Err(AgentflowError::Execution("boom".to_string()))
        }
    }

    struct Fixture {
        agent: Agent,
        calls: Arc<AtomicUsize>,
        trace: Arc<Mutex<Vec<WorkerId>>>,
        registry: Registry,
    }

    impl Fixture {
        fn new() -> Self {
            let calls = Arc::new(AtomicUsize::new(0));
            let trace = Arc::new(Mutex::new(Vec::new()));
            let mut registry = Registry::new();
            registry.register("request", RequestBehavior);
            registry.register(
                "echo",
                EchoBehavior {
                    calls: calls.clone(),
                    trace: trace.clone(),
                },
            );
            Self {
                agent: Agent::new("agent-1", "test graph"),
                calls,
                trace,
                registry,
            }
        }

        /// Worker with one `text` input (`<wid>-in`) and one `text` output
        /// (`<wid>-out`). Deterministic handle ids keep wiring terse.
        fn add_echo(
            &self,
            tag: &str,
        ) -> WorkerId {
            let mut config = WorkerConfig::of_kind("echo");
            config.id = Some(format!("NODE_{}", tag));
            let mut input = HandleConfig::input("text-in", IoType::String);
            input.id = Some(format!("{}-in", tag));
            config.handles.insert("text-in".into(), input);
            let mut output = HandleConfig::output("text", IoType::String);
            output.id = Some(format!("{}-out", tag));
            config.handles.insert("text".into(), output);
            self.agent.add_worker(config)
        }

        fn add_request(
            &self,
            tag: &str,
        ) -> WorkerId {
            let mut config = WorkerConfig::of_kind("request");
            config.id = Some(format!("NODE_{}", tag));
            let mut output = HandleConfig::output("text", IoType::String);
            output.id = Some(format!("{}-out", tag));
            config.handles.insert("text".into(), output);
            self.agent.add_worker(config)
        }

        fn wire(
            &self,
            source: &str,
            target: &str,
        ) {
            self.agent.add_edge(EdgeConfig {
                source: format!("NODE_{}", source),
                source_handle: format!("{}-out", source),
                target: format!("NODE_{}", target),
                target_handle: format!("{}-in", target),
            });
        }

        fn ctx(self) -> (Arc<ExecutionContext>, Arc<AtomicUsize>, Arc<Mutex<Vec<WorkerId>>>) {
            let ctx = ExecutionContext::new(self.agent, Arc::new(self.registry));
            (ctx, self.calls, self.trace)
        }
    }

    fn params(text: &str) -> Vars {
        let mut vars = Vars::new();
        vars.set("text", text);
        vars
    }

    #[tokio::test]
    async fn test_value_propagation_along_edge() {
        let fx = Fixture::new();
        let r = fx.add_request("r");
        let e = fx.add_echo("e");
        fx.wire("r", "e");
        let (ctx, _, _) = fx.ctx();

        execute(&ctx, &e, &params("hi")).await.unwrap();

        assert_eq!(ctx.handle_value(&e, "text-in"), Some(IoValue::String("hi".into())));
        assert_eq!(ctx.handle_value(&e, "text"), Some(IoValue::String("hi".into())));
        assert!(ctx.agent().with_worker(&r, |w| w.executed()).unwrap());
        assert!(ctx.agent().with_worker(&e, |w| w.executed()).unwrap());
    }

    #[tokio::test]
    async fn test_memoization_diamond_runs_shared_upstream_once() {
        // a feeds both b and c, both feed d
        let fx = Fixture::new();
        fx.add_echo("a");
        fx.add_echo("b");
        fx.add_echo("c");
        let d = fx.add_echo("d");
        fx.wire("a", "b");
        fx.wire("a", "c");
        fx.wire("b", "d");
        fx.wire("c", "d");
        let (ctx, calls, trace) = fx.ctx();

        execute(&ctx, &d, &Vars::new()).await.unwrap();

        // four workers, four behavior invocations: a ran once
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let trace = trace.lock().unwrap();
        assert_eq!(trace.iter().filter(|w| w.as_str() == "NODE_a").count(), 1);
    }

    #[tokio::test]
    async fn test_topological_order_upstream_completes_first() {
        let fx = Fixture::new();
        fx.add_echo("a");
        fx.add_echo("b");
        let c = fx.add_echo("c");
        fx.wire("a", "b");
        fx.wire("b", "c");
        let (ctx, _, trace) = fx.ctx();

        execute(&ctx, &c, &Vars::new()).await.unwrap();

        let trace = trace.lock().unwrap();
        assert_eq!(*trace, vec!["NODE_a".to_string(), "NODE_b".to_string(), "NODE_c".to_string()]);
    }

    #[tokio::test]
    async fn test_gating_blocks_behavior_on_falsy_condition() {
        let fx = Fixture::new();
        let r = fx.add_request("r");
        let e = fx.add_echo("e");
        fx.wire("r", "e");
        fx.agent.with_worker_mut(&e, |w| {
            let id = w.handle_by_name("text-in").unwrap().id.clone();
            w.update_handle(
                &id,
                crate::HandlePatch {
                    is_condition: Some(true),
                    ..Default::default()
                },
            );
            // behavior runs only when the incoming condition value is truthy
            w.set_condition(Some(WorkerCondition {
                operator: ConditionOperator::Eq,
                value: IoValue::Bool(true),
            }));
        });
        let (ctx, calls, _) = fx.ctx();

        // empty string propagates from the request worker: falsy
        execute(&ctx, &e, &params("")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ctx.agent().with_worker(&e, |w| w.executed()).unwrap());
        // the producer still ran
        assert!(ctx.agent().with_worker(&r, |w| w.executed()).unwrap());

        ctx.reset();
        execute(&ctx, &e, &params("hi")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dangling_edge_keeps_prior_value() {
        let fx = Fixture::new();
        let r = fx.add_request("r");
        let e = fx.add_echo("e");
        fx.wire("r", "e");
        fx.agent.with_worker_mut(&e, |w| {
            w.set_handle_value_by_name("text-in", IoValue::String("stale".into()));
        });
        fx.agent.delete_worker(&r);
        let (ctx, _, _) = fx.ctx();

        execute(&ctx, &e, &Vars::new()).await.unwrap();

        assert_eq!(ctx.handle_value(&e, "text-in"), Some(IoValue::String("stale".into())));
    }

    #[tokio::test]
    async fn test_cycle_raises_typed_error() {
        let fx = Fixture::new();
        let a = fx.add_echo("a");
        fx.add_echo("b");
        fx.wire("a", "b");
        fx.wire("b", "a");
        let (ctx, _, _) = fx.ctx();

        match execute(&ctx, &a, &Vars::new()).await {
            Err(AgentflowError::CyclicGraph(wid)) => assert_eq!(wid, a),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unregistered_worker_type_fails() {
        let fx = Fixture::new();
        let wid = fx.agent.add_worker(WorkerConfig::of_kind("teleport"));
        let (ctx, _, _) = fx.ctx();

        match execute(&ctx, &wid, &Vars::new()).await {
            Err(AgentflowError::UnregisteredWorkerType(kind)) => assert_eq!(kind, "teleport"),
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_behavior_error_propagates_and_reset_rerun_is_safe() {
        let mut fx = Fixture::new();
        fx.registry.register("echo", FailingBehavior);
        let e = fx.add_echo("e");
        let (ctx, _, _) = fx.ctx();

        assert!(matches!(execute(&ctx, &e, &Vars::new()).await, Err(AgentflowError::Execution(_))));
        assert_eq!(ctx.agent().current(), None);

        ctx.reset();
        assert!(matches!(execute(&ctx, &e, &Vars::new()).await, Err(AgentflowError::Execution(_))));
    }

    #[tokio::test]
    async fn test_cancellation_stops_pass() {
        let fx = Fixture::new();
        let e = fx.add_echo("e");
        let (ctx, _, _) = fx.ctx();

        ctx.cancel();
        assert!(matches!(execute(&ctx, &e, &Vars::new()).await, Err(AgentflowError::Canceled)));
    }

    #[tokio::test]
    async fn test_events_observable_by_subscribers() {
        let fx = Fixture::new();
        fx.add_request("r");
        let e = fx.add_echo("e");
        fx.wire("r", "e");
        let (ctx, _, _) = fx.ctx();
        let mut rx = ctx.subscribe();

        execute(&ctx, &e, &params("hi")).await.unwrap();

        let mut saw_current = false;
        let mut saw_value = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                ExecutionEvent::CurrentWorkerChanged(Some(_)) => saw_current = true,
                ExecutionEvent::HandleValueChanged {
                    ..
                } => saw_value = true,
                _ => {}
            }
        }
        assert!(saw_current);
        assert!(saw_value);
        assert_eq!(ctx.agent().current(), None);
    }

    #[tokio::test]
    async fn test_end_to_end_request_echo_deterministic_rerun() {
        let fx = Fixture::new();
        let r = fx.add_request("r");
        let e = fx.add_echo("e");
        fx.wire("r", "e");
        let (ctx, _, _) = fx.ctx();

        for _ in 0..2 {
            ctx.reset();
            execute(&ctx, &e, &params("hi")).await.unwrap();
            assert_eq!(ctx.handle_value(&e, "text"), Some(IoValue::String("hi".into())));
            assert!(ctx.agent().with_worker(&r, |w| w.executed()).unwrap());
            assert!(ctx.agent().with_worker(&e, |w| w.executed()).unwrap());
        }
    }
}
