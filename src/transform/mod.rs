// src/transform/mod.rs

//! Transform steps.
//!
//! A step is a pure function from an [`Asset`] to an [`Asset`]: bytes plus
//! the metadata needed to name the output. Tasks thread assets through a
//! [`Chain`] of steps and write the results; steps never touch the output
//! directory themselves.
//!
//! - [`template`]: page templates to HTML.
//! - [`picture`]: `<img>` to `<picture>` with a WebP source.
//! - [`scss`]: SCSS compilation.
//! - [`css`]: media-query grouping, vendor prefixing, minification.
//! - [`image`]: WebP encoding and lossy optimization.
//! - [`font`]: TrueType to WOFF / WOFF2.
//! - [`command`]: steps backed by external tools.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod command;
pub mod css;
pub mod font;
pub mod image;
pub mod picture;
pub mod scss;
pub mod template;

pub use command::{BundleCommand, FilterCommand};
pub use css::{Autoprefix, GroupMediaQueries, MinifyCss};
pub use font::{EncodeWoff, EncodeWoff2};
pub use image::{EncodeWebp, OptimizeImage};
pub use picture::RewriteImageRefs;
pub use scss::CompileScss;
pub use template::RenderTemplate;

/// A file in flight through a chain of steps.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute path of the source file this asset was derived from.
    pub source: PathBuf,
    /// Output path relative to the class's output directory.
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    /// Read a source file. The output path starts out as `relative`.
    pub fn read(absolute: &Path, relative: &Path) -> Result<Self> {
        let contents =
            std::fs::read(absolute).with_context(|| format!("reading {}", absolute.display()))?;
        Ok(Self {
            source: absolute.to_path_buf(),
            path: relative.to_path_buf(),
            contents,
        })
    }

    pub fn new(source: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            contents,
        }
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .with_context(|| format!("{} is not valid UTF-8", self.source.display()))
    }

    /// Same asset with new contents.
    pub fn with_contents(self, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            ..self
        }
    }

    /// Same asset with its output extension replaced.
    pub fn with_extension(self, ext: &str) -> Self {
        let path = self.path.with_extension(ext);
        Self { path, ..self }
    }

    /// Output file stem, e.g. `index` for `pages/index.html`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("source", &self.source)
            .field("path", &self.path)
            .field("len", &self.contents.len())
            .finish()
    }
}

/// One transformation in a chain.
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, asset: Asset) -> Result<Asset>;
}

/// Ordered list of steps applied one after another.
///
/// Errors are annotated with the failing step and the source file.
#[derive(Default)]
pub struct Chain {
    steps: Vec<Box<dyn Step>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, asset: Asset) -> Result<Asset> {
        self.steps.iter().try_fold(asset, |asset, step| {
            let source = asset.source.clone();
            step.apply(asset)
                .with_context(|| format!("{} failed for {}", step.name(), source.display()))
        })
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Rewrite the output name's suffix, e.g. `style.css` → `style.min.css`.
#[derive(Debug, Clone)]
pub struct Rename {
    suffix: String,
}

impl Rename {
    /// `suffix` replaces the extension, dot included (`".min.css"`).
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Step for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let file_name = format!("{}{}", asset.stem(), self.suffix);
        let path = asset.path.with_file_name(file_name);
        Ok(Asset { path, ..asset })
    }
}
