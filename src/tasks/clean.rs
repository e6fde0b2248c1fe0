// src/tasks/clean.rs

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::{AssetTask, TaskContext, TaskReport};
use crate::types::TaskKind;

/// Remove the whole output root. Missing directories are fine.
pub struct CleanTask {
    project_root: PathBuf,
    output_root: PathBuf,
}

impl CleanTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self {
            project_root: ctx.paths.project_root().to_path_buf(),
            output_root: ctx.paths.output_root().to_path_buf(),
        }
    }
}

impl AssetTask for CleanTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Clean
    }

    fn run(&self) -> Result<TaskReport> {
        if self.output_root == self.project_root || !self.output_root.starts_with(&self.project_root)
        {
            bail!(
                "refusing to delete {}: not inside the project directory",
                self.output_root.display()
            );
        }

        match fs::remove_dir_all(&self.output_root) {
            Ok(()) => info!(path = %self.output_root.display(), "removed output directory"),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.output_root.display(), "output directory already absent");
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("removing {}", self.output_root.display()));
            }
        }

        Ok(TaskReport::default())
    }
}
