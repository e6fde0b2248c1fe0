// src/paths.rs

//! The path table: the fixed project layout.
//!
//! Every asset class maps to source globs, watch globs and an output
//! directory. All output directories live under one output root named after
//! the project directory, so a single clean invalidates everything.
//!
//! Globs are evaluated relative to the project directory. `*` never crosses
//! a `/`, `**` does.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::types::TaskKind;

/// Directory (relative to the project) that holds every source file.
pub const SOURCE_DIR: &str = "src";

/// Root used by the template loader for `{% include %}` / `{% extends %}`.
pub const TEMPLATES_DIR: &str = "src/templates";

/// Fallback output directory name when the project directory has no usable
/// basename (e.g. `/`).
const FALLBACK_OUTPUT_DIR: &str = "dist";

/// A category of source files sharing one transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetClass {
    Html,
    Css,
    Js,
    Images,
    Fonts,
}

impl AssetClass {
    pub const ALL: [AssetClass; 5] = [
        AssetClass::Html,
        AssetClass::Css,
        AssetClass::Js,
        AssetClass::Images,
        AssetClass::Fonts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Html => "html",
            AssetClass::Css => "css",
            AssetClass::Js => "js",
            AssetClass::Images => "images",
            AssetClass::Fonts => "fonts",
        }
    }

    /// The transform task that consumes this asset class.
    pub fn task(self) -> TaskKind {
        match self {
            AssetClass::Html => TaskKind::Html,
            AssetClass::Css => TaskKind::Css,
            AssetClass::Js => TaskKind::Js,
            AssetClass::Images => TaskKind::Images,
            AssetClass::Fonts => TaskKind::Fonts,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the path table.
#[derive(Debug, Clone)]
pub struct PathEntry {
    pub class: AssetClass,
    /// Globs resolved at task invocation time.
    pub sources: Vec<String>,
    /// Globs the watcher binds to the class's task. Empty means unwatched.
    pub watch: Vec<String>,
    /// Absolute output directory, always under the output root.
    pub output: PathBuf,
}

/// A source file matched by a glob.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub absolute: PathBuf,
    /// Path relative to the glob base; used to mirror the layout in the
    /// output directory.
    pub relative: PathBuf,
}

/// Static mapping from asset class to sources, watch globs and outputs.
#[derive(Debug, Clone)]
pub struct PathTable {
    project_root: PathBuf,
    output_root: PathBuf,
    html: PathEntry,
    css: PathEntry,
    js: PathEntry,
    images: PathEntry,
    fonts: PathEntry,
    otf_sources: Vec<String>,
    otf_output: PathBuf,
}

impl PathTable {
    /// Build the table for a project directory.
    ///
    /// The directory is canonicalized when possible so that the output root
    /// can be named after it even when given as `.`.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let project_root = project_root.canonicalize().unwrap_or(project_root);

        let folder = project_root
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_OUTPUT_DIR)
            .to_string();
        let output_root = project_root.join(folder);

        let img_glob = "src/assets/img/**/*.{jpg,jpeg,png,svg,gif,ico,webp}".to_string();

        Self {
            html: PathEntry {
                class: AssetClass::Html,
                sources: vec!["src/templates/pages/*.html".to_string()],
                watch: vec!["src/templates/**/*.html".to_string()],
                output: output_root.clone(),
            },
            css: PathEntry {
                class: AssetClass::Css,
                sources: vec!["src/assets/scss/style.scss".to_string()],
                watch: vec!["src/assets/scss/**/*.scss".to_string()],
                output: output_root.join("css"),
            },
            js: PathEntry {
                class: AssetClass::Js,
                sources: vec!["src/js/index.js".to_string()],
                watch: vec!["src/js/**/*.js".to_string()],
                output: output_root.join("js"),
            },
            images: PathEntry {
                class: AssetClass::Images,
                sources: vec![img_glob.clone()],
                watch: vec![img_glob],
                output: output_root.join("img"),
            },
            fonts: PathEntry {
                class: AssetClass::Fonts,
                sources: vec!["src/assets/fonts/*.ttf".to_string()],
                watch: Vec::new(),
                output: output_root.join("fonts"),
            },
            otf_sources: vec!["src/assets/fonts/*.otf".to_string()],
            otf_output: project_root.join("src/assets/fonts"),
            project_root,
            output_root,
        }
    }

    /// Look up the entry for an asset class. Total over [`AssetClass`].
    pub fn resolve(&self, class: AssetClass) -> &PathEntry {
        match class {
            AssetClass::Html => &self.html,
            AssetClass::Css => &self.css,
            AssetClass::Js => &self.js,
            AssetClass::Images => &self.images,
            AssetClass::Fonts => &self.fonts,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> {
        AssetClass::ALL.into_iter().map(|c| self.resolve(c))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn source_root(&self) -> PathBuf {
        self.project_root.join(SOURCE_DIR)
    }

    pub fn templates_root(&self) -> PathBuf {
        self.project_root.join(TEMPLATES_DIR)
    }

    /// `.otf` sources consumed by the manual `otf2ttf` task.
    pub fn otf_sources(&self) -> &[String] {
        &self.otf_sources
    }

    /// Where `otf2ttf` writes its `.ttf` files (inside the source tree, next
    /// to the fonts the `fonts` task reads).
    pub fn otf_output(&self) -> &Path {
        &self.otf_output
    }

    /// Resolve the entry's source globs against the current disk state.
    pub fn resolve_sources(&self, class: AssetClass) -> Result<Vec<SourceFile>> {
        self.resolve_patterns(&self.resolve(class).sources)
    }

    /// Resolve arbitrary project-relative globs to a sorted, de-duplicated
    /// list of files. A missing base directory yields no files.
    pub fn resolve_patterns(&self, patterns: &[String]) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for pattern in patterns {
            let matcher = build_globset(std::slice::from_ref(pattern))?;
            let base_rel = glob_base(pattern);
            let base = self.project_root.join(&base_rel);
            if !base.is_dir() {
                continue;
            }

            for path in walk_files(&base)? {
                let Some(rel_str) = relative_to(&self.project_root, &path) else {
                    continue;
                };
                if !matcher.is_match(&rel_str) {
                    continue;
                }
                let relative = path
                    .strip_prefix(&base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
                files.push(SourceFile {
                    absolute: path,
                    relative,
                });
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Longest literal directory prefix of a glob pattern.
///
/// - `src/assets/img/**/*.png` → `src/assets/img`
/// - `src/assets/scss/style.scss` → `src/assets/scss` (a literal file's base
///   is its parent directory)
pub fn glob_base(pattern: &str) -> String {
    let components: Vec<&str> = pattern.split('/').collect();
    let first_glob = components
        .iter()
        .position(|c| c.contains(['*', '?', '[', '{']));

    let literal = match first_glob {
        Some(idx) => &components[..idx],
        None => &components[..components.len().saturating_sub(1)],
    };
    literal.join("/")
}

/// Build a `GlobSet` where `*` does not match across `/`.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Convert `path` to a `/`-separated string relative to `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Every regular file below `dir`, depth first. `dir` must exist.
pub fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("reading dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}
