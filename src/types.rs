use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// The fixed set of tasks this pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Clean,
    Css,
    Html,
    Images,
    Js,
    Fonts,
    Otf2Ttf,
}

impl TaskKind {
    /// Tasks that take part in `build` (everything except the manual
    /// `otf2ttf` conversion).
    pub const BUILD: [TaskKind; 6] = [
        TaskKind::Clean,
        TaskKind::Css,
        TaskKind::Html,
        TaskKind::Images,
        TaskKind::Js,
        TaskKind::Fonts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Clean => "clean",
            TaskKind::Css => "css",
            TaskKind::Html => "html",
            TaskKind::Images => "images",
            TaskKind::Js => "js",
            TaskKind::Fonts => "fonts",
            TaskKind::Otf2Ttf => "otf2ttf",
        }
    }

    pub fn is_build_task(self) -> bool {
        !matches!(self, TaskKind::Otf2Ttf)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "clean" => Ok(TaskKind::Clean),
            "css" => Ok(TaskKind::Css),
            "html" => Ok(TaskKind::Html),
            "images" => Ok(TaskKind::Images),
            "js" => Ok(TaskKind::Js),
            "fonts" => Ok(TaskKind::Fonts),
            "otf2ttf" => Ok(TaskKind::Otf2Ttf),
            other => Err(format!("unknown task: {other}")),
        }
    }
}

/// Behaviour when a trigger arrives for a task that is already part of the
/// current run.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued run and only keep the latest
///   trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}
