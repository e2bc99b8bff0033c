//! Project file watching.
//!
//! Asset caches already revalidate lazily by modification stamp, so the
//! watcher only needs to tell the module resolver when a manifest changed.

#[cfg(feature = "hot-reload")]
use std::path::{Path, PathBuf};
#[cfg(feature = "hot-reload")]
use std::sync::mpsc::{Receiver, channel};

#[cfg(feature = "hot-reload")]
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

#[cfg(feature = "hot-reload")]
use crate::module::ModuleResolver;

/// Files that changed since the last poll.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectChanges {
    /// Every changed path, deduplicated and sorted.
    pub paths: Vec<std::path::PathBuf>,
    /// Whether any of them is a module manifest.
    pub manifests_changed: bool,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Watches a project directory and marks the module index stale when a
/// manifest is created, modified or removed.
#[cfg(feature = "hot-reload")]
pub struct ProjectWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    watched_dirs: Vec<PathBuf>,
}

#[cfg(feature = "hot-reload")]
impl ProjectWatcher {
    /// Create a new watcher.
    pub fn new() -> Result<Self, notify::Error> {
        let (sender, receiver) = channel();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = sender.send(res);
        })?;

        Ok(Self {
            watcher,
            receiver,
            watched_dirs: Vec::new(),
        })
    }

    /// Watch a directory recursively.
    pub fn watch_directory(&mut self, path: impl AsRef<Path>) -> Result<(), notify::Error> {
        let path = path.as_ref();

        if !self.watched_dirs.iter().any(|d| d == path) {
            self.watcher.watch(path, RecursiveMode::Recursive)?;
            self.watched_dirs.push(path.to_path_buf());
            tracing::debug!("Watching directory for changes: {}", path.display());
        }

        Ok(())
    }

    /// Drain pending events.
    pub fn poll_changes(&mut self, modules: &ModuleResolver) -> ProjectChanges {
        let mut changes = ProjectChanges::default();

        while let Ok(event) = self.receiver.try_recv() {
            match event {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) {
                        changes.paths.extend(event.paths);
                    }
                }
                Err(e) => {
                    tracing::error!("File watcher error: {}", e);
                }
            }
        }

        changes.paths.sort();
        changes.paths.dedup();
        changes.manifests_changed = changes.paths.iter().any(|p| modules.is_manifest(p));
        if changes.manifests_changed {
            tracing::debug!("Manifest changed, module index marked stale");
            modules.mark_stale();
        }

        changes
    }

    pub fn watched_directories(&self) -> &[PathBuf] {
        &self.watched_dirs
    }
}

#[cfg(not(feature = "hot-reload"))]
/// Dummy type when hot-reload feature is disabled.
pub struct ProjectWatcher;

#[cfg(not(feature = "hot-reload"))]
impl ProjectWatcher {
    pub fn new() -> Result<Self, String> {
        Err("Hot reload feature not enabled".to_string())
    }
}
