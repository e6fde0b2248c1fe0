// src/dag/task_info.rs

use crate::engine::TaskName;

/// Identifier of one scheduler run; increases by one per run.
pub type RunId = u64;

/// Where a task stands in the current run. `None` in [`TaskInfo::run_state`]
/// means the task was not triggered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on dependencies.
    Pending,
    /// Handed to the executor.
    Running,
    DoneSuccess,
    /// Failed, or skipped because a dependency failed.
    DoneFailed,
}

/// Read-only view of a task's state, as reported by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// A stage of the build graph plus what the scheduler remembers about it.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Stages this one runs after.
    pub deps: Vec<TaskName>,
    pub run_state: Option<RunState>,
    pub last_success: Option<RunId>,
    pub last_failure: Option<RunId>,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            deps,
            run_state: None,
            last_success: None,
            last_failure: None,
        }
    }

    /// Pending or running in the current run.
    pub fn is_active(&self) -> bool {
        matches!(self.run_state, Some(RunState::Pending | RunState::Running))
    }

    pub fn has_run_before(&self) -> bool {
        self.last_success.is_some() || self.last_failure.is_some()
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub run_id: RunId,
}

impl ScheduledTask {
    pub fn new(name: impl Into<TaskName>, run_id: RunId) -> Self {
        Self {
            name: name.into(),
            run_id,
        }
    }
}
