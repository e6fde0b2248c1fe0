// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running tasks
//! itself. Production code uses [`PipelineExecutor`]; tests provide their
//! own backend that records scheduled tasks and emits `TaskCompleted`
//! events directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::tasks::{AssetTask, TaskSet};

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Implementations must eventually send one `TaskCompleted` event per
    /// task to the runtime.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor that runs the pipeline's asset tasks.
///
/// Each task runs on Tokio's blocking pool, so tasks that became ready
/// together (css, html, images) run in parallel.
pub struct PipelineExecutor {
    tasks: Arc<TaskSet>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(tasks: TaskSet, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            tasks: Arc::new(tasks),
            runtime_tx,
        }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let set = Arc::clone(&self.tasks);
        let runtime_tx = self.runtime_tx.clone();

        Box::pin(async move {
            for scheduled in tasks {
                let task = set.get(&scheduled.name);
                let tx = runtime_tx.clone();
                tokio::spawn(async move {
                    let outcome = match task {
                        Some(task) => run_asset_task(task, &scheduled).await,
                        None => {
                            warn!(task = %scheduled.name, "no implementation registered for task");
                            TaskOutcome::Failed(format!("unknown task '{}'", scheduled.name))
                        }
                    };
                    report_completion(&tx, scheduled.name, outcome).await;
                });
            }
            Ok(())
        })
    }
}

/// Send a `TaskCompleted` event. Returns `false` when the runtime has
/// already shut down and the completion was dropped.
async fn report_completion(
    tx: &mpsc::Sender<RuntimeEvent>,
    task: String,
    outcome: TaskOutcome,
) -> bool {
    match tx.send(RuntimeEvent::TaskCompleted { task, outcome }).await {
        Ok(()) => true,
        Err(err) => {
            warn!("failed to send RuntimeEvent::TaskCompleted: {err}");
            false
        }
    }
}

async fn run_asset_task(task: Arc<dyn AssetTask>, scheduled: &ScheduledTask) -> TaskOutcome {
    info!(task = %scheduled.name, run_id = scheduled.run_id, "task started");

    match tokio::task::spawn_blocking(move || task.run()).await {
        Ok(Ok(report)) => {
            info!(
                task = %scheduled.name,
                run_id = scheduled.run_id,
                written = report.written.len(),
                "task finished"
            );
            TaskOutcome::Success
        }
        Ok(Err(err)) => {
            error!(task = %scheduled.name, run_id = scheduled.run_id, "task failed: {err:#}");
            TaskOutcome::Failed(format!("{err:#}"))
        }
        Err(join_err) => {
            error!(task = %scheduled.name, run_id = scheduled.run_id, error = %join_err, "task panicked");
            TaskOutcome::Failed(format!("task panicked: {join_err}"))
        }
    }
}
