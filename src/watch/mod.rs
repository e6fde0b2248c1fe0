// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Binding each asset class's watch globs to its task.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Batching bursts of events so each task triggers once per burst.
//! - Optionally skipping triggers when the watched content hash is unchanged.
//!
//! It does not know about task dependencies; it only turns filesystem
//! changes into task-level triggers.

pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use hash::{HashStore, compute_hash_for_paths};
pub use patterns::{WatchBinding, bindings_from_paths, tasks_for_path};
pub use watcher::{WatchOptions, WatcherHandle, spawn_watcher};
