// tests/runtime_fake_executor.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use sitepipe::config::{StageMap, default_stages};
use sitepipe::dag::Scheduler;
use sitepipe::engine::{
    CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use sitepipe_test_utils::fake_executor::FakeExecutor;
use sitepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Seed every stage as one trigger batch and run to completion with a fake
/// executor.
async fn run_stages(
    stages: &StageMap,
    failing: &[&str],
) -> Result<(Vec<String>, RunReport), Box<dyn Error>> {
    let scheduler = Scheduler::from_stages(stages);
    let options = RuntimeOptions {
        exit_when_idle: true,
    };

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let mut executor = FakeExecutor::new(rt_tx.clone(), executed.clone());
    for task in failing {
        executor = executor.failing(task);
    }

    rt_tx
        .send(RuntimeEvent::TasksTriggered {
            tasks: stages.keys().cloned().collect(),
            reason: TriggerReason::Manual,
        })
        .await?;

    let core = CoreRuntime::new(scheduler, TriggerWhileRunningBehaviour::Queue, 1, options);
    let runtime = Runtime::new(core, rt_rx, executor);
    let report = with_timeout(runtime.run()).await?;

    let tasks_run = executed.lock().unwrap().clone();
    Ok((tasks_run, report))
}

fn position(order: &[String], task: &str) -> usize {
    order
        .iter()
        .position(|t| t == task)
        .unwrap_or_else(|| panic!("{task} never ran: {order:?}"))
}

#[tokio::test]
async fn default_build_runs_in_stage_order() -> TestResult {
    init_tracing();

    let (order, report) = run_stages(&default_stages(), &[]).await?;
    assert_eq!(order.len(), 6, "{order:?}");
    assert_eq!(order[0], "clean");

    for transform in ["css", "html", "images"] {
        assert!(position(&order, "clean") < position(&order, transform));
        assert!(position(&order, transform) < position(&order, "js"));
    }
    assert!(position(&order, "js") < position(&order, "fonts"));

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 6);
    Ok(())
}

#[tokio::test]
async fn css_failure_skips_js_and_fonts() -> TestResult {
    init_tracing();

    let (order, report) = run_stages(&default_stages(), &["css"]).await?;
    assert!(!order.contains(&"js".to_string()), "{order:?}");
    assert!(!order.contains(&"fonts".to_string()), "{order:?}");
    assert!(order.contains(&"html".to_string()));
    assert!(order.contains(&"images".to_string()));

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "css");
    let mut skipped = report.skipped.clone();
    skipped.sort();
    assert_eq!(skipped, vec!["fonts", "js"]);
    assert_eq!(report.failed_tasks()[0], "css");
    Ok(())
}

#[tokio::test]
async fn clean_failure_skips_everything_else() -> TestResult {
    init_tracing();

    let (order, report) = run_stages(&default_stages(), &["clean"]).await?;
    assert_eq!(order, vec!["clean"]);
    assert_eq!(report.skipped.len(), 5, "{report:?}");
    Ok(())
}

#[tokio::test]
async fn single_task_graph_runs_only_that_task() -> TestResult {
    init_tracing();

    let stages = sitepipe::compose::single_task_stages(sitepipe::types::TaskKind::Fonts);
    let (order, report) = run_stages(&stages, &[]).await?;
    assert_eq!(order, vec!["fonts"]);
    assert_eq!(report.succeeded, vec!["fonts"]);
    Ok(())
}
