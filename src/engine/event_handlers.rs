// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;
use std::mem;

use tracing::{debug, warn};

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::report::RunReport;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A run finished; carries the report of that run for the shell to log.
    RunFinished(RunReport),
    /// Request that the process exits (when idle with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle one or more triggers that arrived together.
///
/// - Idle scheduler: start a new run seeded with these triggers plus
///   anything already queued.
/// - Active run, task not in it: merge it into the current run so unrelated
///   tasks share the run and can proceed in parallel.
/// - Active run, task already in it: honour queue/cancel semantics and keep
///   it for a future run.
pub fn handle_task_triggers(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    report: &mut RunReport,
    options: &RuntimeOptions,
    tasks: Vec<TaskName>,
    reason: TriggerReason,
) -> CoreStep {
    debug!(?tasks, ?reason, "handling trigger");

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.extend(tasks);

        let mut commands = start_new_run_from_triggers(
            scheduler,
            report,
            options,
            triggers.into_iter().collect(),
        );
        commands.extend(exit_if_idle(scheduler, queue, options));
        let keep_running = !commands.contains(&CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running,
        };
    }

    let mut joining = Vec::new();
    for task in tasks {
        match scheduler.run_state_of(&task) {
            None => warn!(task = %task, "trigger for unknown task; ignoring"),
            Some(TaskRunState::NotInRun) => joining.push(task),
            Some(_already_in_run) => queue.record_trigger(&task),
        }
    }

    let mut commands = Vec::new();
    if !joining.is_empty() {
        let step = scheduler.step_triggers(joining.as_slice());
        report.record_step(&step);
        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
        }
        if step.run_just_finished {
            commands.push(finish_run(report, options));
        }
    }

    commands.extend(maybe_start_queued_run(scheduler, queue, report, options));
    let exit = exit_if_idle(scheduler, queue, options);
    let keep_running = exit.is_empty();
    commands.extend(exit);

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    report: &mut RunReport,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    report.record_outcome(&task, &outcome);
    let step = scheduler.step_completion(&task, &outcome);
    report.record_step(&step);

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if step.run_just_finished {
        commands.push(finish_run(report, options));
    }

    commands.extend(maybe_start_queued_run(scheduler, queue, report, options));

    let exit = exit_if_idle(scheduler, queue, options);
    let keep_running = exit.is_empty();
    commands.extend(exit);

    CoreStep {
        commands,
        keep_running,
    }
}

/// Seed a new run from a set of triggers.
///
/// Pure: returns commands instead of performing IO.
pub fn start_new_run_from_triggers(
    scheduler: &mut Scheduler,
    report: &mut RunReport,
    options: &RuntimeOptions,
    triggers: Vec<TaskName>,
) -> Vec<CoreCommand> {
    let mut commands = Vec::new();
    if triggers.is_empty() {
        return commands;
    }

    scheduler.start_new_run();

    let step = scheduler.step_triggers(triggers.as_slice());
    report.record_step(&step);

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if step.run_just_finished {
        commands.push(finish_run(report, options));
    }

    commands
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    report: &mut RunReport,
    options: &RuntimeOptions,
) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }

    let triggers = queue.drain_pending();
    start_new_run_from_triggers(scheduler, report, options, triggers)
}

/// Snapshot the report of a finished run.
///
/// One-shot runtimes keep accumulating so the final report covers
/// everything; long-running ones start every run with an empty report.
fn finish_run(report: &mut RunReport, options: &RuntimeOptions) -> CoreCommand {
    if options.exit_when_idle {
        CoreCommand::RunFinished(report.clone())
    } else {
        CoreCommand::RunFinished(mem::take(report))
    }
}

fn exit_if_idle(
    scheduler: &Scheduler,
    queue: &TriggerQueue,
    options: &RuntimeOptions,
) -> Vec<CoreCommand> {
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        vec![CoreCommand::RequestExit]
    } else {
        Vec::new()
    }
}
