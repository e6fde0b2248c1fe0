// src/tasks/html.rs

use anyhow::Result;

use super::{AssetTask, TaskContext, TaskReport, write_asset};
use crate::paths::AssetClass;
use crate::transform::{Asset, Chain, RenderTemplate, RewriteImageRefs};
use crate::types::TaskKind;

/// Render every page template and point images at their WebP copies.
pub struct HtmlTask {
    ctx: TaskContext,
}

impl HtmlTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    // Built per run: the template loader caches what it reads, and
    // partials may change between watch-triggered runs.
    fn chain(&self) -> Chain {
        Chain::new()
            .then(RenderTemplate::new(&self.ctx.paths.templates_root()))
            .then(RewriteImageRefs)
    }
}

impl AssetTask for HtmlTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Html
    }

    fn run(&self) -> Result<TaskReport> {
        let entry = self.ctx.paths.resolve(AssetClass::Html);
        let sources = self.ctx.paths.resolve_sources(AssetClass::Html)?;
        let chain = self.chain();

        let mut written = Vec::with_capacity(sources.len());
        for source in sources {
            let page = chain.run(Asset::read(&source.absolute, &source.relative)?)?;
            written.push(write_asset(&entry.output, &page)?);
        }

        self.ctx.reload.notify(&written);
        Ok(TaskReport { written })
    }
}
