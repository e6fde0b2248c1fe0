// src/transform/command.rs

//! Steps that shell out to external tools.

use std::path::PathBuf;

use anyhow::Result;

use super::{Asset, Step};
use crate::exec::{render_command, run_shell};

/// Bundle an entry module with an external bundler.
///
/// The command gets the entry path through `{entry}` and must write the
/// bundle to stdout. The output is renamed to `output_name`.
#[derive(Debug, Clone)]
pub struct BundleCommand {
    template: String,
    cwd: PathBuf,
    output_name: String,
}

impl BundleCommand {
    pub fn new(template: impl Into<String>, cwd: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            cwd: cwd.into(),
            output_name: output_name.into(),
        }
    }
}

impl Step for BundleCommand {
    fn name(&self) -> &'static str {
        "bundle"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let entry = asset.source.to_string_lossy().into_owned();
        let cmd = render_command(&self.template, &[("entry", entry.as_str())]);
        let bundle = run_shell(&cmd, &self.cwd, None)?;
        let path = asset.path.with_file_name(&self.output_name);
        Ok(Asset {
            path,
            contents: bundle,
            ..asset
        })
    }
}

/// Pipe the asset through an external filter (stdin to stdout).
#[derive(Debug, Clone)]
pub struct FilterCommand {
    name: &'static str,
    cmd: String,
    cwd: PathBuf,
}

impl FilterCommand {
    pub fn new(name: &'static str, cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            name,
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }
}

impl Step for FilterCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let filtered = run_shell(&self.cmd, &self.cwd, Some(&asset.contents))?;
        Ok(asset.with_contents(filtered))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn bundle_reads_entry_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("index.js");
        fs::write(&entry, "console.log(1);").unwrap();

        let step = BundleCommand::new("cat {entry}", dir.path(), "script.js");
        let out = step
            .apply(Asset::read(&entry, std::path::Path::new("index.js")).unwrap())
            .unwrap();
        assert_eq!(out.contents, b"console.log(1);");
        assert_eq!(out.path, PathBuf::from("script.js"));
    }

    #[test]
    fn filter_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let step = FilterCommand::new("minify-js", "echo 'SyntaxError' >&2; exit 1", dir.path());
        let err = step
            .apply(Asset::new("/p/index.js", "script.js", b"let".to_vec()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("SyntaxError"));
    }
}
