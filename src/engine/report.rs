// src/engine/report.rs

use tracing::{error, info};

use crate::dag::SchedulerStep;
use crate::engine::{TaskName, TaskOutcome};

/// Summary of what happened to each task across one or more runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: Vec<TaskName>,
    /// Tasks whose own execution failed, with the error message.
    pub failed: Vec<(TaskName, String)>,
    /// Tasks that never ran because an upstream task failed.
    pub skipped: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Names of every failed or skipped task, failures first.
    pub fn failed_tasks(&self) -> Vec<TaskName> {
        self.failed
            .iter()
            .map(|(name, _)| name.clone())
            .chain(self.skipped.iter().cloned())
            .collect()
    }

    pub(crate) fn record_outcome(&mut self, task: &str, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Success => self.succeeded.push(task.to_string()),
            TaskOutcome::Failed(message) => {
                self.failed.push((task.to_string(), message.clone()));
            }
        }
    }

    pub(crate) fn record_step(&mut self, step: &SchedulerStep) {
        self.skipped.extend(step.newly_skipped.iter().cloned());
    }

    /// Log a one-line summary plus one error line per failed task.
    pub fn log_summary(&self) {
        for (task, message) in &self.failed {
            error!(task = %task, "task failed: {message}");
        }
        if !self.skipped.is_empty() {
            error!(skipped = ?self.skipped, "tasks skipped after upstream failure");
        }
        info!(
            succeeded = self.succeeded.len(),
            failed = self.failed.len(),
            skipped = self.skipped.len(),
            "run finished"
        );
    }
}
