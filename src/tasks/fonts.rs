// src/tasks/fonts.rs

use anyhow::{Context, Result};

use super::{AssetTask, TaskContext, TaskReport, write_asset};
use crate::paths::AssetClass;
use crate::transform::{Asset, EncodeWoff, EncodeWoff2, Step};
use crate::types::TaskKind;

/// Convert every `.ttf` to `.woff` and `.woff2`.
pub struct FontsTask {
    ctx: TaskContext,
}

impl FontsTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

impl AssetTask for FontsTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Fonts
    }

    fn run(&self) -> Result<TaskReport> {
        let entry = self.ctx.paths.resolve(AssetClass::Fonts);
        let sources = self.ctx.paths.resolve_sources(AssetClass::Fonts)?;

        let mut written = Vec::with_capacity(sources.len() * 2);
        for source in sources {
            let font = Asset::read(&source.absolute, &source.relative)?;
            let woff = EncodeWoff
                .apply(font.clone())
                .with_context(|| format!("encoding {} as woff", source.absolute.display()))?;
            written.push(write_asset(&entry.output, &woff)?);
            let woff2 = EncodeWoff2
                .apply(font)
                .with_context(|| format!("encoding {} as woff2", source.absolute.display()))?;
            written.push(write_asset(&entry.output, &woff2)?);
        }

        self.ctx.reload.notify(&written);
        Ok(TaskReport { written })
    }
}
