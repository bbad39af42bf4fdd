//! File watching for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Content page was created or modified
    PageChanged(PathBuf),

    /// Any other input file was created or modified
    Changed(PathBuf),

    /// File was removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::PageChanged(path) | Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Changes below any of the `ignored` paths are dropped. Returns the
    /// watcher and a channel to receive events.
    pub fn new(
        paths: &[PathBuf],
        ignored: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                let mode = if path.is_dir() {
                    RecursiveMode::Recursive
                } else {
                    RecursiveMode::NonRecursive
                };
                watcher.watch(path, mode).map_err(std::io::Error::other)?;
                tracing::debug!("Watching {}", path.display());
            }
        }

        let ignored = ignored.to_vec();
        std::thread::spawn(move || forward_events(sync_rx, &ignored, async_tx, DEBOUNCE));

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Quiet period after the last change before a batch is forwarded.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Forward classified events once no new event has arrived for `quiet`.
///
/// Events inside a burst are held, not dropped; a path that changes several
/// times is forwarded once, with its latest kind.
fn forward_events(
    rx: mpsc::Receiver<notify::Event>,
    ignored: &[PathBuf],
    tx: async_mpsc::Sender<WatchEvent>,
    quiet: Duration,
) {
    let mut pending: Vec<WatchEvent> = Vec::new();

    loop {
        let received = if pending.is_empty() {
            rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(quiet)
        };

        match received {
            Ok(event) => {
                for path in &event.paths {
                    if ignored.iter().any(|i| path.starts_with(i)) {
                        continue;
                    }
                    if let Some(e) = classify_event(path, &event.kind) {
                        match pending.iter_mut().find(|p| p.path() == e.path()) {
                            Some(existing) => *existing = e,
                            None => pending.push(e),
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                for e in pending.drain(..) {
                    if tx.blocking_send(e).is_err() {
                        return;
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                for e in pending.drain(..) {
                    if tx.blocking_send(e).is_err() {
                        return;
                    }
                }
                return;
            }
        }
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let is_hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') || n.ends_with('~'));
    if is_hidden {
        return None;
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        EventKind::Create(_) | EventKind::Modify(_) => {
            if ext == "mdx" || ext == "md" {
                Some(WatchEvent::PageChanged(path.to_path_buf()))
            } else {
                Some(WatchEvent::Changed(path.to_path_buf()))
            }
        }
        _ => None,
    }
}
