// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::engine::TaskName;
use crate::paths::{PathTable, build_globset, relative_to, walk_files};

/// Compiled watch globs for one task.
///
/// Patterns are relative to the project root; [`WatchBinding::matches`]
/// expects a project-relative, `/`-separated path.
#[derive(Clone)]
pub struct WatchBinding {
    task: TaskName,
    patterns: Vec<String>,
    watch_set: GlobSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(task: impl Into<TaskName>, patterns: Vec<String>) -> Result<Self> {
        let task = task.into();
        let watch_set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for task {task}"))?;
        Ok(Self {
            task,
            patterns,
            watch_set,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path)
    }
}

/// One binding per asset class with a non-empty watch list, in class order.
pub fn bindings_from_paths(paths: &PathTable) -> Result<Vec<WatchBinding>> {
    paths
        .entries()
        .filter(|entry| !entry.watch.is_empty())
        .map(|entry| WatchBinding::new(entry.class.task().to_string(), entry.watch.clone()))
        .collect()
}

/// Tasks whose bindings match `rel_path`.
pub fn tasks_for_path<'a>(bindings: &'a [WatchBinding], rel_path: &str) -> Vec<&'a str> {
    bindings
        .iter()
        .filter(|b| b.matches(rel_path))
        .map(WatchBinding::task)
        .collect()
}

/// Every file under `dir` matching the binding, sorted. Paths are matched
/// relative to `project_root`. A missing directory yields nothing.
pub fn collect_matching_files(
    project_root: &Path,
    dir: &Path,
    binding: &WatchBinding,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = walk_files(dir)?
        .into_iter()
        .filter(|path| relative_to(project_root, path).is_some_and(|rel| binding.matches(&rel)))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_bindings() -> Vec<WatchBinding> {
        bindings_from_paths(&PathTable::for_project("/tmp/site")).unwrap()
    }

    #[test]
    fn fonts_are_not_watched() {
        let tasks: Vec<_> = default_bindings().iter().map(|b| b.task().to_string()).collect();
        assert_eq!(tasks, vec!["html", "css", "js", "images"]);
    }

    #[test]
    fn nested_partials_route_to_their_task_only() {
        let bindings = default_bindings();
        assert_eq!(tasks_for_path(&bindings, "src/assets/scss/a/b.scss"), vec!["css"]);
        assert_eq!(tasks_for_path(&bindings, "src/templates/partials/nav.html"), vec!["html"]);
        assert_eq!(tasks_for_path(&bindings, "src/js/lib/util.js"), vec!["js"]);
        assert_eq!(tasks_for_path(&bindings, "src/assets/img/icons/a.png"), vec!["images"]);
    }

    #[test]
    fn unrelated_files_match_nothing() {
        let bindings = default_bindings();
        assert!(tasks_for_path(&bindings, "src/assets/fonts/a.ttf").is_empty());
        assert!(tasks_for_path(&bindings, "site/css/style.css").is_empty());
        assert!(tasks_for_path(&bindings, "src/assets/img/notes.txt").is_empty());
    }

    #[test]
    fn collects_only_files_bound_to_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in ["src/assets/scss/a.scss", "src/assets/scss/nested/b.scss", "src/js/x.js"] {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "x").unwrap();
        }

        let bindings = bindings_from_paths(&PathTable::for_project(root)).unwrap();
        let css = bindings.iter().find(|b| b.task() == "css").unwrap();

        let files = collect_matching_files(root, &root.join("src"), css).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("src/assets/scss/a.scss"),
                root.join("src/assets/scss/nested/b.scss"),
            ]
        );
        assert!(collect_matching_files(root, &root.join("missing"), css).unwrap().is_empty());
    }
}
