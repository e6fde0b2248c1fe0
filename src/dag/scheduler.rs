// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::StageMap;
use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{DepStatus, ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunId, RunState, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable stage graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is ready (deps satisfied)
/// - marking tasks as succeeded or failed
/// - skipping dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: RunId,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<RunId>,
}

impl Scheduler {
    /// Construct a scheduler from a validated stage map.
    pub fn from_stages(stages: &StageMap) -> Self {
        let graph = DagGraph::from_stages(stages);

        let tasks = graph
            .tasks()
            .map(|name| {
                let deps = graph.dependencies_of(name).to_vec();
                (name.to_string(), TaskInfo::new(name.to_string(), deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Whether the dependencies of `task` are satisfied for the current run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.dep_status_for_info(info) == DepStatus::Satisfied)
    }

    /// Start a new run, resetting per-run state. Success and failure
    /// history is kept for logging.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a task name.
    pub fn step_trigger(&mut self, task: &str) -> SchedulerStep {
        self.step_triggers(&[task])
    }

    /// Handle a batch of triggers that arrive together.
    ///
    /// Every task is marked `Pending` before readiness is evaluated, so
    /// dependencies inside the batch order the batch regardless of the
    /// order the names are given in.
    pub fn step_triggers<S: AsRef<str>>(&mut self, tasks: &[S]) -> SchedulerStep {
        if self.current_run_id.is_none() {
            warn!(
                tasks = tasks.len(),
                "trigger with no active run; implicitly starting a new run"
            );
            self.start_new_run();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        for task in tasks {
            manager.mark_task_pending(task.as_ref());
        }
        let (newly_scheduled, newly_skipped) = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            failed: None,
            newly_skipped,
            run_just_finished,
        }
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn step_completion(&mut self, task: &str, outcome: &TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return step;
        };

        if info.run_state != Some(RunState::Running) {
            debug!(task = %task, state = ?info.run_state, "completion for task that is not running");
        }

        let mut manager = match outcome {
            TaskOutcome::Success => {
                info.run_state = Some(RunState::DoneSuccess);
                info.last_success = Some(run_id);
                debug!(task = %info.name, run_id, "task completed successfully");
                StateManager::new(&self.graph, &mut self.tasks, self.current_run_id)
            }
            TaskOutcome::Failed(message) => {
                info.run_state = Some(RunState::DoneFailed);
                info.last_failure = Some(run_id);
                warn!(
                    task = %info.name,
                    run_id,
                    error = %message,
                    "task failed; skipping dependents in this run"
                );
                step.failed = Some(info.name.clone());
                let mut manager =
                    StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                step.newly_skipped = manager.mark_dependents_failed(task);
                manager
            }
        };

        let (ready, mut skipped) = manager.collect_new_ready_tasks();
        step.newly_scheduled = ready;
        step.newly_skipped.append(&mut skipped);
        step.run_just_finished = self.maybe_finish_run();
        step
    }

    /// Clear `current_run_id` once every task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if manager.all_tasks_terminal() {
            info!(run_id = self.current_run_id, "scheduler: run finished");
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}
