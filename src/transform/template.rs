// src/transform/template.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context, path_loader};

use super::{Asset, Step};

/// Render a page template to HTML.
///
/// Includes, imports and `{% extends %}` resolve against the templates root.
/// Every page sees a `page` variable holding its file stem.
pub struct RenderTemplate {
    env: Environment<'static>,
    root: PathBuf,
}

impl RenderTemplate {
    pub fn new(templates_root: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(templates_root));
        env.set_keep_trailing_newline(true);
        Self {
            env,
            root: templates_root.to_path_buf(),
        }
    }

    fn template_name(&self, source: &Path) -> String {
        source
            .strip_prefix(&self.root)
            .unwrap_or(source)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Step for RenderTemplate {
    fn name(&self) -> &'static str {
        "render-template"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let name = self.template_name(&asset.source);
        let page = asset.stem();
        let html = self
            .env
            .render_named_str(&name, asset.text()?, context! { page => page })
            .map_err(|err| anyhow!("{err:#}"))
            .with_context(|| format!("rendering template {name}"))?;
        Ok(asset.with_extension("html").with_contents(html))
    }
}
