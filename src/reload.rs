// src/reload.rs

//! Live-reload notification.
//!
//! Tasks receive a [`ReloadNotifier`] through their context and call it with
//! the files they wrote. Notification is fire-and-forget: it never fails a
//! task and never blocks it.

use std::path::PathBuf;

use tokio::sync::broadcast;
use tracing::debug;

/// What connected browsers should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Only stylesheets changed; the client can swap them in place.
    Css,
    /// Anything else: reload the page.
    Full,
}

impl ReloadEvent {
    /// Classify a batch of written paths.
    pub fn for_paths(paths: &[PathBuf]) -> Self {
        let css_only = !paths.is_empty()
            && paths
                .iter()
                .all(|p| p.extension().is_some_and(|ext| ext == "css"));
        if css_only {
            ReloadEvent::Css
        } else {
            ReloadEvent::Full
        }
    }

    /// Text frame sent over the live-reload socket.
    pub fn as_message(&self) -> &'static str {
        match self {
            ReloadEvent::Css => "css",
            ReloadEvent::Full => "reload",
        }
    }
}

pub trait ReloadNotifier: Send + Sync {
    fn notify(&self, written: &[PathBuf]);
}

/// Notifier used when no dev server is running.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReload;

impl ReloadNotifier for NoopReload {
    fn notify(&self, _written: &[PathBuf]) {}
}

/// Broadcast hub between tasks and connected live-reload clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadNotifier for ReloadHub {
    fn notify(&self, written: &[PathBuf]) {
        if written.is_empty() {
            return;
        }
        let event = ReloadEvent::for_paths(written);
        // Err only means nobody is connected.
        match self.tx.send(event.clone()) {
            Ok(clients) => debug!(?event, clients, "sent live-reload event"),
            Err(_) => debug!(?event, "no live-reload clients connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_only_batches_are_css_events() {
        let css = vec![PathBuf::from("out/css/style.css"), PathBuf::from("out/css/style.min.css")];
        assert_eq!(ReloadEvent::for_paths(&css), ReloadEvent::Css);

        let mixed = vec![PathBuf::from("out/css/style.css"), PathBuf::from("out/index.html")];
        assert_eq!(ReloadEvent::for_paths(&mixed), ReloadEvent::Full);
    }

    #[tokio::test]
    async fn hub_without_clients_is_a_no_op() {
        let hub = ReloadHub::new();
        hub.notify(&[PathBuf::from("index.html")]);
        assert_eq!(hub.receiver_count(), 0);
    }

    #[tokio::test]
    async fn hub_delivers_to_subscribers() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        hub.notify(&[PathBuf::from("index.html")]);
        assert_eq!(rx.recv().await.ok(), Some(ReloadEvent::Full));
    }
}
