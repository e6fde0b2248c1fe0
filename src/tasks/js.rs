// src/tasks/js.rs

use anyhow::Result;
use tracing::debug;

use super::{AssetTask, TaskContext, TaskReport, write_asset};
use crate::paths::AssetClass;
use crate::transform::{Asset, BundleCommand, Chain, FilterCommand, Rename};
use crate::types::TaskKind;

/// Bundle `src/js/index.js` and minify it to `script.min.js`.
pub struct JsTask {
    ctx: TaskContext,
}

impl JsTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn chain(&self) -> Chain {
        let js = &self.ctx.config.js;
        let cwd = self.ctx.paths.project_root();
        Chain::new()
            .then(BundleCommand::new(&js.bundle_cmd, cwd, &js.bundle_name))
            .then(FilterCommand::new("minify-js", &js.minify_cmd, cwd))
            .then(Rename::suffix(".min.js"))
    }
}

impl AssetTask for JsTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Js
    }

    fn run(&self) -> Result<TaskReport> {
        let entry = self.ctx.paths.resolve(AssetClass::Js);
        let sources = self.ctx.paths.resolve_sources(AssetClass::Js)?;
        if sources.is_empty() {
            debug!("no js entry point; nothing to bundle");
            return Ok(TaskReport::default());
        }

        let chain = self.chain();
        let mut written = Vec::with_capacity(sources.len());
        for source in sources {
            let bundle = chain.run(Asset::read(&source.absolute, &source.relative)?)?;
            written.push(write_asset(&entry.output, &bundle)?);
        }

        self.ctx.reload.notify(&written);
        Ok(TaskReport { written })
    }
}
