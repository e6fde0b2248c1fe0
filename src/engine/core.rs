// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces an updated state plus a
//! list of [`CoreCommand`]s describing what the IO shell should do next.
//! It has no channels, no Tokio types and performs no IO, so it can be
//! stepped directly in tests.

use std::mem;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{CoreStep, handle_task_completion, handle_task_triggers};
use crate::engine::queue::TriggerQueue;
use crate::engine::report::RunReport;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::TriggerWhileRunningBehaviour;

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    report: RunReport,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            report: RunReport::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Report accumulated since the last call to [`CoreRuntime::take_report`].
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn take_report(&mut self) -> RunReport {
        mem::take(&mut self.report)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => handle_task_triggers(
                &mut self.scheduler,
                &mut self.queue,
                &mut self.report,
                &self.options,
                vec![task],
                reason,
            ),
            RuntimeEvent::TasksTriggered { tasks, reason } => handle_task_triggers(
                &mut self.scheduler,
                &mut self.queue,
                &mut self.report,
                &self.options,
                tasks,
                reason,
            ),
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &mut self.report,
                &self.options,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
