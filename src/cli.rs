// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::TaskKind;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build static-site assets, then watch and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. Defaults to `watch-changes` (build, watch and serve).
    #[arg(value_enum, default_value_t = TaskCommand::WatchChanges)]
    pub task: TaskCommand,

    /// Project directory containing `src/`.
    ///
    /// The output root is `<project-dir>/<basename of project-dir>/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Sitepipe.toml` in the project directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the path table and stage graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Named entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TaskCommand {
    /// Full build, then keep watching sources and serving the output.
    #[value(name = "watch-changes", alias = "watchChanges", alias = "default")]
    WatchChanges,
    /// Full build once, then exit.
    Build,
    Clean,
    Css,
    Html,
    Js,
    Images,
    Fonts,
    /// Convert `.otf` sources to `.ttf` in the source tree.
    #[value(name = "otf2ttf")]
    Otf2Ttf,
}

impl TaskCommand {
    /// The single task this command maps to, if it is not a composite.
    pub fn single_task(self) -> Option<TaskKind> {
        match self {
            TaskCommand::WatchChanges | TaskCommand::Build => None,
            TaskCommand::Clean => Some(TaskKind::Clean),
            TaskCommand::Css => Some(TaskKind::Css),
            TaskCommand::Html => Some(TaskKind::Html),
            TaskCommand::Js => Some(TaskKind::Js),
            TaskCommand::Images => Some(TaskKind::Images),
            TaskCommand::Fonts => Some(TaskKind::Fonts),
            TaskCommand::Otf2Ttf => Some(TaskKind::Otf2Ttf),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
