// src/tasks/images.rs

use anyhow::Result;

use super::{AssetTask, TaskContext, TaskReport, write_asset};
use crate::paths::AssetClass;
use crate::transform::image::has_webp_variant;
use crate::transform::{Asset, EncodeWebp, OptimizeImage, Step};
use crate::types::TaskKind;

/// Emit a WebP copy of each raster image plus an optimized original.
pub struct ImagesTask {
    ctx: TaskContext,
}

impl ImagesTask {
    pub fn new(ctx: &TaskContext) -> Self {
        Self { ctx: ctx.clone() }
    }
}

impl AssetTask for ImagesTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Images
    }

    fn run(&self) -> Result<TaskReport> {
        let entry = self.ctx.paths.resolve(AssetClass::Images);
        let sources = self.ctx.paths.resolve_sources(AssetClass::Images)?;
        let settings = &self.ctx.config.images;
        let webp = EncodeWebp::new(settings.webp_quality);
        let optimize = OptimizeImage::new(settings.jpeg_quality);

        let mut written = Vec::with_capacity(sources.len() * 2);
        for source in sources {
            let asset = Asset::read(&source.absolute, &source.relative)?;
            if has_webp_variant(&asset) {
                written.push(write_asset(&entry.output, &webp.apply(asset.clone())?)?);
            }
            written.push(write_asset(&entry.output, &optimize.apply(asset)?)?);
        }

        self.ctx.reload.notify(&written);
        Ok(TaskReport { written })
    }
}
