// src/tasks/css.rs

use anyhow::Result;

use super::{AssetTask, TaskContext, TaskReport, write_asset};
use crate::paths::AssetClass;
use crate::transform::{
    Asset, Autoprefix, Chain, CompileScss, GroupMediaQueries, MinifyCss, Rename,
};
use crate::types::TaskKind;

/// Compile the entry stylesheet to `style.css` and `style.min.css`.
pub struct CssTask {
    ctx: TaskContext,
    prefix: Autoprefix,
}

impl CssTask {
    pub fn new(ctx: &TaskContext) -> Result<Self> {
        Ok(Self {
            prefix: Autoprefix::new(&ctx.config.css.browsers)?,
            ctx: ctx.clone(),
        })
    }
}

impl AssetTask for CssTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Css
    }

    fn run(&self) -> Result<TaskReport> {
        let entry = self.ctx.paths.resolve(AssetClass::Css);
        let sources = self.ctx.paths.resolve_sources(AssetClass::Css)?;

        let expanded = Chain::new()
            .then(CompileScss)
            .then(GroupMediaQueries)
            .then(self.prefix.clone());
        let minified = Chain::new().then(MinifyCss).then(Rename::suffix(".min.css"));

        let mut written = Vec::with_capacity(sources.len() * 2);
        for source in sources {
            let css = expanded.run(Asset::read(&source.absolute, &source.relative)?)?;
            let path = write_asset(&entry.output, &css)?;
            self.ctx.reload.notify(std::slice::from_ref(&path));
            written.push(path);

            let min = minified.run(css)?;
            let path = write_asset(&entry.output, &min)?;
            self.ctx.reload.notify(std::slice::from_ref(&path));
            written.push(path);
        }

        Ok(TaskReport { written })
    }
}
