// src/dag/state_manager.rs

//! State transitions within one run: triggering, readiness, blocking and
//! failure propagation.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunId, RunState, ScheduledTask, TaskInfo};
use crate::engine::TaskName;

/// Dependency status of a pending task within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepStatus {
    /// Every dependency that takes part in this run succeeded. Dependencies
    /// outside the run do not gate the task.
    Satisfied,
    /// At least one dependency is still pending or running.
    Waiting,
    /// A dependency failed in this run. The task cannot run in this run.
    Blocked,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<RunId>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<RunId>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include a triggered task in this run.
    ///
    /// Only the task itself is marked: dependents are not pulled in, a
    /// changed stylesheet re-runs `css` and nothing else. Tasks already
    /// participating in this run keep their current state.
    pub fn mark_task_pending(&mut self, name: &str) {
        match self.tasks.get_mut(name) {
            Some(info) => {
                if info.run_state.is_none() {
                    info.run_state = Some(RunState::Pending);
                    debug!(task = %info.name, "marked Pending for this run");
                }
            }
            None => warn!(task = %name, "trigger for unknown task; ignoring"),
        }
    }

    /// Mark all dependents (transitively) of a failed task that take part
    /// in this run as `DoneFailed`.
    ///
    /// Returns the tasks newly marked as failed, excluding the root.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %info.name,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        newly_failed.push(info.name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {}
                }
            }
        }

        newly_failed
    }

    /// Collect `Pending` tasks whose dependencies are satisfied, mark them
    /// `Running` and return them as [`ScheduledTask`]s.
    ///
    /// Pending tasks whose dependencies are blocked are marked `DoneFailed`
    /// (together with their own pending dependents) and returned as skipped.
    pub fn collect_new_ready_tasks(&mut self) -> (Vec<ScheduledTask>, Vec<TaskName>) {
        let mut ready = Vec::new();
        let mut skipped = Vec::new();

        // Blocking one task may block others; repeat until nothing changes.
        loop {
            let blocked: Vec<TaskName> = self
                .pending_with_status(DepStatus::Blocked)
                .into_iter()
                .collect();
            if blocked.is_empty() {
                break;
            }
            for name in blocked {
                if let Some(info) = self.tasks.get_mut(&name) {
                    info.run_state = Some(RunState::DoneFailed);
                    warn!(
                        task = %info.name,
                        run_id = self.current_run_id,
                        "dependency failed; skipping task in this run"
                    );
                    skipped.push(name.clone());
                }
                skipped.extend(self.mark_dependents_failed(&name));
            }
        }

        let mut candidates = self.pending_with_status(DepStatus::Satisfied);
        candidates.sort();

        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                if info.has_run_before() {
                    info!(task = %info.name, run_id = self.current_run_id, "re-running task");
                } else {
                    info!(task = %info.name, run_id = self.current_run_id, "starting task");
                }

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::new(
                    info.name.clone(),
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        (ready, skipped)
    }

    fn pending_with_status(&self, wanted: DepStatus) -> Vec<TaskName> {
        let ro = ReadOnlyStateManager::new(self.tasks);
        self.tasks
            .values()
            .filter(|info| matches!(info.run_state, Some(RunState::Pending)))
            .filter(|info| ro.dep_status_for_info(info) == wanted)
            .map(|info| info.name.clone())
            .collect()
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(TaskInfo::is_active)
    }
}

/// Read-only view used when only shared access to the tasks map is available.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Dependency status of `info` for the *current run*.
    pub fn dep_status_for_info(&self, info: &TaskInfo) -> DepStatus {
        let mut status = DepStatus::Satisfied;

        for dep_name in &info.deps {
            let Some(dep) = self.tasks.get(dep_name) else {
                warn!(
                    task = %info.name,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                return DepStatus::Blocked;
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed) => return DepStatus::Blocked,
                Some(RunState::Pending) | Some(RunState::Running) => status = DepStatus::Waiting,
                None => {}
            }
        }

        status
    }
}
