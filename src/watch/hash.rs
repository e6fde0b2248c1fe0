// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::engine::TaskName;

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {}", path.display()))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Deterministic hash over the names and contents of the given files.
///
/// Order of `paths` does not matter; they are sorted first. Files that no
/// longer exist are skipped, but their absence still changes the hash
/// because names are part of the input.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
    paths.sort();

    let mut hasher = Hasher::new();
    for path in paths {
        if path.is_file() {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update(compute_file_hash(&path)?.as_bytes());
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

/// Last known content hash per task, kept for the watcher's lifetime.
#[derive(Debug, Default)]
pub struct HashStore {
    map: HashMap<TaskName, String>,
}

impl HashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, task: &str) -> Option<&str> {
        self.map.get(task).map(String::as_str)
    }

    /// Record `hash` for `task`. Returns `true` if it differs from the
    /// previous value (or there was none).
    pub fn update(&mut self, task: &str, hash: String) -> bool {
        let changed = self.map.get(task) != Some(&hash);
        self.map.insert(task.to_string(), hash);
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn aggregate_hash_tracks_content_not_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.scss");
        let b = dir.path().join("b.scss");
        fs::write(&a, "a{}").unwrap();
        fs::write(&b, "b{}").unwrap();

        let h1 = compute_hash_for_paths([&a, &b]).unwrap();
        let h2 = compute_hash_for_paths([&b, &a]).unwrap();
        assert_eq!(h1, h2);

        fs::write(&b, "b{color:red}").unwrap();
        assert_ne!(h1, compute_hash_for_paths([&a, &b]).unwrap());
    }

    #[test]
    fn store_reports_changes() {
        let mut store = HashStore::new();
        assert!(store.update("css", "one".into()));
        assert!(!store.update("css", "one".into()));
        assert!(store.update("css", "two".into()));
        assert_eq!(store.load("css"), Some("two"));
    }
}
