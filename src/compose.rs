// src/compose.rs

//! Composite entry points: `build`, `watch-changes` and single tasks.
//!
//! Each one builds a scheduler over a stage map, wires the runtime to a
//! [`PipelineExecutor`] and seeds every task as one trigger batch so
//! everything starts in a single run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::{ConfigFile, StageMap};
use crate::dag::Scheduler;
use crate::engine::{
    CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions, TaskName, TriggerReason,
};
use crate::errors::{PipelineError, Result};
use crate::exec::PipelineExecutor;
use crate::paths::PathTable;
use crate::reload::{NoopReload, ReloadHub};
use crate::server;
use crate::tasks::{TaskContext, TaskSet};
use crate::types::TaskKind;
use crate::watch::{WatchOptions, bindings_from_paths, spawn_watcher};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Stage map containing only `kind`, with no dependencies.
pub fn single_task_stages(kind: TaskKind) -> StageMap {
    let mut stages = StageMap::new();
    stages.insert(kind.to_string(), Vec::new());
    stages
}

/// Run the full build once. Fails if any task failed or was skipped.
pub async fn build(paths: PathTable, config: ConfigFile) -> Result<RunReport> {
    let stages = config.stages().clone();
    let ctx = TaskContext::new(paths, config, Arc::new(NoopReload));
    run_once(&stages, &ctx).await
}

/// Run one task on its own, ignoring the stage ordering.
pub async fn run_task(kind: TaskKind, paths: PathTable, config: ConfigFile) -> Result<RunReport> {
    let stages = single_task_stages(kind);
    let ctx = TaskContext::new(paths, config, Arc::new(NoopReload));
    run_once(&stages, &ctx).await
}

/// Build, then keep watching sources and serving the output with live
/// reload until Ctrl-C. Task failures are logged and never end the process.
pub async fn watch_changes(paths: PathTable, config: ConfigFile) -> Result<()> {
    let hub = ReloadHub::new();
    let stages = config.stages().clone();
    let ctx = TaskContext::new(paths, config, Arc::new(hub.clone()));

    let (tx, runtime) = prepare(&stages, &ctx, RuntimeOptions { exit_when_idle: false })?;

    let addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);
    let listener = server::bind(&addr).await?;
    let output_root = ctx.paths.output_root().to_path_buf();
    tokio::spawn(async move {
        if let Err(err) = server::serve_on(listener, output_root, hub).await {
            error!("dev server stopped: {err:#}");
        }
    });

    let bindings = bindings_from_paths(&ctx.paths)?;
    let options = WatchOptions {
        debounce: Duration::from_millis(ctx.config.watch.debounce_ms),
        use_hash: ctx.config.watch.use_hash,
    };
    let _watcher = spawn_watcher(
        ctx.paths.project_root(),
        ctx.paths.source_root(),
        bindings,
        tx.clone(),
        options,
    )?;

    spawn_ctrl_c(tx.clone());
    seed(&tx, stages.keys()).await?;
    drop(tx);

    runtime.run().await?;
    info!("watch-changes stopped");
    Ok(())
}

async fn run_once(stages: &StageMap, ctx: &TaskContext) -> Result<RunReport> {
    let (tx, runtime) = prepare(stages, ctx, RuntimeOptions { exit_when_idle: true })?;

    spawn_ctrl_c(tx.clone());
    seed(&tx, stages.keys()).await?;
    drop(tx);

    let report = runtime.run().await?;

    let unfinished: Vec<&TaskName> = stages
        .keys()
        .filter(|task| !reported(&report, task))
        .collect();
    if !unfinished.is_empty() {
        warn!(?unfinished, "run interrupted before all tasks finished");
        return Err(PipelineError::BuildFailed {
            failed: unfinished.into_iter().cloned().collect(),
        });
    }

    if !report.is_success() {
        return Err(PipelineError::BuildFailed {
            failed: report.failed_tasks(),
        });
    }
    Ok(report)
}

fn reported(report: &RunReport, task: &str) -> bool {
    report.succeeded.iter().any(|t| t == task)
        || report.failed.iter().any(|(t, _)| t == task)
        || report.skipped.iter().any(|t| t == task)
}

/// Scheduler, core and executor for a stage map, plus the sender feeding
/// the runtime.
fn prepare(
    stages: &StageMap,
    ctx: &TaskContext,
    options: RuntimeOptions,
) -> Result<(mpsc::Sender<RuntimeEvent>, Runtime<PipelineExecutor>)> {
    let kinds = stages
        .keys()
        .map(|name| {
            name.parse::<TaskKind>()
                .map_err(|_| PipelineError::UnknownTask(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    let tasks = TaskSet::for_kinds(&kinds, ctx)?;

    let scheduler = Scheduler::from_stages(stages);
    let core = CoreRuntime::new(
        scheduler,
        ctx.config.behaviour,
        ctx.config.queue_length,
        options,
    );

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);
    let executor = PipelineExecutor::new(tasks, tx.clone());
    Ok((tx, Runtime::new(core, rx, executor)))
}

/// Queue every task as one manual trigger batch before the runtime starts,
/// so they land in the first run ordered by the stage graph.
async fn seed<'a>(
    tx: &mpsc::Sender<RuntimeEvent>,
    tasks: impl Iterator<Item = &'a TaskName>,
) -> Result<()> {
    tx.send(RuntimeEvent::TasksTriggered {
        tasks: tasks.cloned().collect(),
        reason: TriggerReason::Manual,
    })
    .await
    .map_err(|e| PipelineError::Other(e.into()))
}

fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_stage_has_no_dependencies() {
        let stages = single_task_stages(TaskKind::Fonts);
        assert_eq!(stages.len(), 1);
        assert!(stages["fonts"].is_empty());
    }

    #[tokio::test]
    async fn seed_sends_every_stage_in_one_batch() {
        let stages = crate::config::default_stages();
        let (tx, mut rx) = mpsc::channel(4);

        seed(&tx, stages.keys()).await.unwrap();
        drop(tx);

        match rx.recv().await {
            Some(RuntimeEvent::TasksTriggered { tasks, reason }) => {
                assert_eq!(tasks, stages.keys().cloned().collect::<Vec<_>>());
                assert_eq!(reason, TriggerReason::Manual);
            }
            other => panic!("expected one trigger batch, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }
}
