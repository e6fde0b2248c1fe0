// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::watch::hash::{HashStore, compute_hash_for_paths};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{WatchBinding, collect_matching_files, tasks_for_path};

/// Tuning for the watch loop.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Quiet window after the last event before triggers are flushed.
    pub debounce: Duration,
    /// Skip triggers whose watched files hash to the same value as last time.
    pub use_hash: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            use_hash: false,
        }
    }
}

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher over `watch_root` that sends
/// `RuntimeEvent::TaskTriggered` for every task whose bindings match a
/// changed path.
///
/// - `project_root` is the directory glob patterns are evaluated against.
/// - `watch_root` is the directory actually observed (recursively).
/// - Events are batched: each task triggers at most once per burst.
pub fn spawn_watcher(
    project_root: impl Into<PathBuf>,
    watch_root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    options: WatchOptions,
) -> Result<WatcherHandle> {
    let project_root = project_root.into();
    let project_root = project_root.canonicalize().unwrap_or(project_root);
    let mut watch_root = watch_root.into();
    if !watch_root.is_dir() {
        warn!(
            "watch root {:?} does not exist, watching {:?} instead",
            watch_root, project_root
        );
        watch_root = project_root.clone();
    }

    let bindings = Arc::new(bindings);

    let mut hashes = HashStore::new();
    if options.use_hash {
        seed_hashes(&project_root, &watch_root, &bindings, &mut hashes)?;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("sitepipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("sitepipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&watch_root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", watch_root.display()))?;

    info!("file watcher started on {:?}", watch_root);

    tokio::spawn(async move {
        while let Some(first) = event_rx.recv().await {
            let mut pending = BTreeSet::new();
            collect_event(&project_root, &bindings, &first, &mut pending);

            // Drain the burst.
            loop {
                match tokio::time::timeout(options.debounce, event_rx.recv()).await {
                    Ok(Some(event)) => collect_event(&project_root, &bindings, &event, &mut pending),
                    Ok(None) | Err(_) => break,
                }
            }

            if options.use_hash {
                pending.retain(|task| {
                    content_changed(&project_root, &watch_root, &bindings, task, &mut hashes)
                });
            }

            for task in pending {
                debug!(task = %task, "watch match -> triggering task");
                if let Err(err) = runtime_tx
                    .send(RuntimeEvent::TaskTriggered {
                        task,
                        reason: TriggerReason::FileWatch,
                    })
                    .await
                {
                    warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Add the tasks matched by `event`'s paths to `pending`.
fn collect_event(
    project_root: &Path,
    bindings: &[WatchBinding],
    event: &Event,
    pending: &mut BTreeSet<TaskName>,
) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    debug!("received notify event: {:?}", event);
    pending.extend(route_paths(project_root, bindings, &event.paths));
}

/// Tasks triggered by a set of changed paths, de-duplicated and sorted.
pub fn route_paths(
    project_root: &Path,
    bindings: &[WatchBinding],
    paths: &[PathBuf],
) -> BTreeSet<TaskName> {
    let mut tasks = BTreeSet::new();
    for path in paths {
        match relative_str(project_root, path) {
            Some(rel) => {
                tasks.extend(tasks_for_path(bindings, &rel).into_iter().map(str::to_string));
            }
            None => debug!("ignoring path outside project: {:?}", path),
        }
    }
    tasks
}

fn seed_hashes(
    project_root: &Path,
    watch_root: &Path,
    bindings: &[WatchBinding],
    hashes: &mut HashStore,
) -> Result<()> {
    for binding in bindings {
        let files = collect_matching_files(project_root, watch_root, binding)?;
        hashes.update(binding.task(), compute_hash_for_paths(&files)?);
    }
    Ok(())
}

/// Recompute the task's hash. Errors count as "changed" so the task still runs.
fn content_changed(
    project_root: &Path,
    watch_root: &Path,
    bindings: &[WatchBinding],
    task: &str,
    hashes: &mut HashStore,
) -> bool {
    let Some(binding) = bindings.iter().find(|b| b.task() == task) else {
        return true;
    };
    let hash = collect_matching_files(project_root, watch_root, binding)
        .and_then(|files| compute_hash_for_paths(&files));
    match hash {
        Ok(hash) => {
            let changed = hashes.update(task, hash);
            if !changed {
                debug!(task, "content unchanged, skipping trigger");
            }
            changed
        }
        Err(err) => {
            warn!(task, "hashing watched files failed: {err:#}");
            true
        }
    }
}
