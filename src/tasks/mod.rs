// src/tasks/mod.rs

//! Build tasks.
//!
//! Each task is constructed from a [`TaskContext`] (path table, validated
//! configuration and a reload notifier) and keeps no state between runs:
//! every `run` resolves its sources from disk again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::ConfigFile;
use crate::engine::TaskName;
use crate::paths::PathTable;
use crate::reload::ReloadNotifier;
use crate::transform::Asset;
use crate::types::TaskKind;

pub mod clean;
pub mod css;
pub mod fonts;
pub mod html;
pub mod images;
pub mod js;
pub mod otf2ttf;

pub use clean::CleanTask;
pub use css::CssTask;
pub use fonts::FontsTask;
pub use html::HtmlTask;
pub use images::ImagesTask;
pub use js::JsTask;
pub use otf2ttf::Otf2TtfTask;

/// Files a task wrote in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub written: Vec<PathBuf>,
}

impl TaskReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// A named unit of work the scheduler can run.
pub trait AssetTask: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Run the task to completion on the calling thread.
    fn run(&self) -> Result<TaskReport>;
}

/// Everything a task needs, passed explicitly at construction.
#[derive(Clone)]
pub struct TaskContext {
    pub paths: Arc<PathTable>,
    pub config: Arc<ConfigFile>,
    pub reload: Arc<dyn ReloadNotifier>,
}

impl TaskContext {
    pub fn new(paths: PathTable, config: ConfigFile, reload: Arc<dyn ReloadNotifier>) -> Self {
        Self {
            paths: Arc::new(paths),
            config: Arc::new(config),
            reload,
        }
    }
}

/// Construct the task implementing `kind`.
pub fn build_task(kind: TaskKind, ctx: &TaskContext) -> Result<Arc<dyn AssetTask>> {
    let task: Arc<dyn AssetTask> = match kind {
        TaskKind::Clean => Arc::new(CleanTask::new(ctx)),
        TaskKind::Css => Arc::new(CssTask::new(ctx)?),
        TaskKind::Html => Arc::new(HtmlTask::new(ctx)),
        TaskKind::Images => Arc::new(ImagesTask::new(ctx)),
        TaskKind::Js => Arc::new(JsTask::new(ctx)),
        TaskKind::Fonts => Arc::new(FontsTask::new(ctx)),
        TaskKind::Otf2Ttf => Arc::new(Otf2TtfTask::new(ctx)),
    };
    Ok(task)
}

/// Tasks available to the executor, keyed by name.
#[derive(Default, Clone)]
pub struct TaskSet {
    tasks: BTreeMap<TaskName, Arc<dyn AssetTask>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the given tasks from a shared context.
    pub fn for_kinds(kinds: &[TaskKind], ctx: &TaskContext) -> Result<Self> {
        let mut set = Self::new();
        for kind in kinds {
            set.insert(build_task(*kind, ctx)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, task: Arc<dyn AssetTask>) {
        self.tasks.insert(task.kind().to_string(), task);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AssetTask>> {
        self.tasks.get(name).cloned()
    }
}

/// Write an asset below `out_dir`, creating directories as needed.
pub fn write_asset(out_dir: &Path, asset: &Asset) -> Result<PathBuf> {
    let dest = out_dir.join(&asset.path);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&dest, &asset.contents).with_context(|| format!("writing {}", dest.display()))?;
    debug!(path = %dest.display(), bytes = asset.contents.len(), "wrote asset");
    Ok(dest)
}
