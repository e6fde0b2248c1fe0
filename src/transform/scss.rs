// src/transform/scss.rs

use anyhow::{Result, anyhow};
use grass::{Options, OutputStyle};

use super::{Asset, Step};

/// Compile SCSS to expanded CSS.
///
/// `@use` / `@import` resolve relative to the entry stylesheet's directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompileScss;

impl Step for CompileScss {
    fn name(&self) -> &'static str {
        "compile-scss"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let mut options = Options::default().style(OutputStyle::Expanded);
        if let Some(dir) = asset.source.parent() {
            options = options.load_path(dir);
        }

        let css = grass::from_string(asset.text()?.to_owned(), &options)
            .map_err(|err| anyhow!("{err}"))?;
        Ok(asset.with_extension("css").with_contents(css))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    #[test]
    fn compiles_partials_next_to_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_vars.scss"), "$accent: #c00;").unwrap();
        let entry = dir.path().join("style.scss");
        fs::write(&entry, "@import 'vars';\na { b { color: $accent; } }").unwrap();

        let out = CompileScss
            .apply(Asset::read(&entry, Path::new("style.scss")).unwrap())
            .unwrap();
        let css = out.text().unwrap();
        assert!(css.contains("a b {"), "{css}");
        assert!(css.contains("color: #c00;"), "{css}");
        assert_eq!(out.path, Path::new("style.css"));
    }

    #[test]
    fn syntax_errors_fail() {
        let asset = Asset::new("/p/style.scss", "style.scss", b"a { color: ".to_vec());
        assert!(CompileScss.apply(asset).is_err());
    }
}
