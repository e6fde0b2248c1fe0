// src/tasks/otf2ttf.rs

use anyhow::{Result, ensure};
use tracing::info;

use super::{AssetTask, TaskContext, TaskReport};
use crate::exec::{render_command, run_shell};
use crate::types::TaskKind;

/// Convert `.otf` sources to `.ttf` with an external tool.
///
/// Output goes back into the source fonts directory, where the `fonts`
/// task picks it up on the next build.
pub struct Otf2TtfTask {
    ctx: TaskContext,
}

impl Otf2TtfTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

impl AssetTask for Otf2TtfTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Otf2Ttf
    }

    fn run(&self) -> Result<TaskReport> {
        let paths = &self.ctx.paths;
        let sources = paths.resolve_patterns(paths.otf_sources())?;
        let template = &self.ctx.config.fonts.otf2ttf_cmd;

        let mut written = Vec::with_capacity(sources.len());
        for source in sources {
            let Some(stem) = source.absolute.file_stem() else {
                continue;
            };
            let output = paths
                .otf_output()
                .join(format!("{}.ttf", stem.to_string_lossy()));
            let input = source.absolute.to_string_lossy();
            let out = output.to_string_lossy();
            let cmd = render_command(template, &[("input", input.as_ref()), ("output", out.as_ref())]);

            run_shell(&cmd, paths.project_root(), None)?;
            ensure!(
                output.is_file(),
                "`{cmd}` succeeded but did not write {}",
                output.display()
            );
            info!(font = %output.display(), "converted otf to ttf");
            written.push(output);
        }

        Ok(TaskReport { written })
    }
}
