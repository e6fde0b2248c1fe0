// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a direct `strip_prefix` first, then canonicalizes both sides (for
/// platforms that report events under a different absolute prefix, e.g.
/// `/private/var` on macOS). Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) else {
        return None;
    };
    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn strips_root_prefix() {
        let root = PathBuf::from("/project");
        let path = root.join("src/assets/scss/a.scss");
        assert_eq!(
            relative_str(&root, &path).as_deref(),
            Some("src/assets/scss/a.scss")
        );
    }

    #[test]
    fn unrelated_paths_are_rejected() {
        assert_eq!(relative_str(Path::new("/project"), Path::new("/elsewhere/x")), None);
    }
}
