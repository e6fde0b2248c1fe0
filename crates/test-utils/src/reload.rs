use std::path::PathBuf;
use std::sync::Mutex;

use sitepipe::reload::ReloadNotifier;

/// Reload notifier that remembers every batch it was handed.
#[derive(Debug, Default)]
pub struct RecordingReload {
    batches: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<PathBuf>> {
        self.batches.lock().unwrap().clone()
    }

    /// Every notified path, flattened.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.batches().into_iter().flatten().collect()
    }
}

impl ReloadNotifier for RecordingReload {
    fn notify(&self, written: &[PathBuf]) {
        self.batches.lock().unwrap().push(written.to_vec());
    }
}
