//! Project file access.
//!
//! Resolvers never touch the filesystem directly; they go through
//! [`ProjectFiles`], which has an on-disk implementation ([`DiskProject`]) and
//! an in-memory one for tests and embedded content ([`MemoryProject`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use parking_lot::RwLock;
use walkdir::WalkDir;

use crate::error::{AssetError, AssetResult};

/// Modification stamp of a project file.
///
/// Two stamps compare equal only if the file was not modified in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModificationStamp {
    /// Modification time in nanoseconds (or a version counter for memory files).
    pub modified: u64,
    /// File length in bytes.
    pub len: u64,
}

/// Capability to enumerate, read and stamp files of a project.
pub trait ProjectFiles: Send + Sync {
    /// Root directory of the project.
    fn root(&self) -> &Path;

    /// Every file under `scope`, recursively, without descending into
    /// directories for which `skip_dir` returns true. `scope` itself is never
    /// passed to `skip_dir`.
    fn walk_files(&self, scope: &Path, skip_dir: &dyn Fn(&Path) -> bool) -> Vec<PathBuf>;

    /// Every file under `scope`, recursively.
    fn files_under(&self, scope: &Path) -> Vec<PathBuf> {
        self.walk_files(scope, &|_| false)
    }

    /// Read all bytes of a file.
    fn read(&self, path: &Path) -> AssetResult<Vec<u8>>;

    /// Current modification stamp, or `None` if the file does not exist.
    fn stamp(&self, path: &Path) -> Option<ModificationStamp>;

    /// Files under `scope` whose file name equals `name`.
    fn find_by_name(&self, scope: &Path, name: &str, case_sensitive: bool) -> Vec<PathBuf> {
        let wanted = if case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };
        self.files_under(scope)
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        if case_sensitive {
                            n == wanted
                        } else {
                            n.to_lowercase() == wanted
                        }
                    })
            })
            .collect()
    }

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> AssetResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| AssetError::LoaderError {
            path: path.to_path_buf(),
            message: format!("invalid UTF-8: {}", e),
        })
    }
}

/// Project backed by a directory on disk.
pub struct DiskProject {
    root: PathBuf,
}

impl DiskProject {
    /// Create a project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ProjectFiles for DiskProject {
    fn root(&self) -> &Path {
        &self.root
    }

    fn walk_files(&self, scope: &Path, skip_dir: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
        let scope = self.resolve_path(scope);
        WalkDir::new(&scope)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_type().is_dir() || !skip_dir(entry.path())
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry under {}: {}", scope.display(), err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect()
    }

    fn read(&self, path: &Path) -> AssetResult<Vec<u8>> {
        let full_path = self.resolve_path(path);
        std::fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound {
                    urn: full_path.display().to_string(),
                }
            } else {
                AssetError::Io {
                    path: full_path.clone(),
                    source: e,
                }
            }
        })
    }

    fn stamp(&self, path: &Path) -> Option<ModificationStamp> {
        let metadata = std::fs::metadata(self.resolve_path(path)).ok()?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Some(ModificationStamp {
            modified,
            len: metadata.len(),
        })
    }
}

struct MemoryFile {
    bytes: Vec<u8>,
    version: u64,
}

/// In-memory project for testing or embedded content.
///
/// Every write bumps a global version counter that serves as the file's
/// modification time, so stamps change on each [`insert`](Self::insert) or
/// [`touch`](Self::touch).
pub struct MemoryProject {
    root: PathBuf,
    files: RwLock<BTreeMap<PathBuf, MemoryFile>>,
    version: AtomicU64,
}

impl MemoryProject {
    /// Create an empty project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            files: RwLock::new(BTreeMap::new()),
            version: AtomicU64::new(0),
        }
    }

    fn key(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        let version = self.next_version();
        self.files.write().insert(
            self.key(path.as_ref()),
            MemoryFile {
                bytes: bytes.into(),
                version,
            },
        );
    }

    /// Remove a file.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files
            .write()
            .remove(&self.key(path.as_ref()))
            .map(|f| f.bytes)
    }

    /// Bump a file's modification stamp without changing its contents.
    pub fn touch(&self, path: impl AsRef<Path>) -> bool {
        let version = self.next_version();
        match self.files.write().get_mut(&self.key(path.as_ref())) {
            Some(file) => {
                file.version = version;
                true
            }
            None => false,
        }
    }

    /// Check if a file exists.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.read().contains_key(&self.key(path.as_ref()))
    }
}

impl ProjectFiles for MemoryProject {
    fn root(&self) -> &Path {
        &self.root
    }

    fn walk_files(&self, scope: &Path, skip_dir: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
        let scope = self.key(scope);
        let files = self.files.read();
        let mut skipped: Vec<PathBuf> = Vec::new();
        let mut entered: Vec<PathBuf> = Vec::new();

        files
            .keys()
            .filter(|path| {
                let Ok(relative) = path.strip_prefix(&scope) else {
                    return false;
                };
                // Directories are checked top-down, once each, like a real walk.
                let mut dir = scope.clone();
                let Some(parent) = relative.parent() else {
                    return true;
                };
                for component in parent.components() {
                    dir.push(component);
                    if skipped.contains(&dir) {
                        return false;
                    }
                    if entered.contains(&dir) {
                        continue;
                    }
                    if skip_dir(&dir) {
                        skipped.push(dir);
                        return false;
                    }
                    entered.push(dir.clone());
                }
                true
            })
            .cloned()
            .collect()
    }

    fn read(&self, path: &Path) -> AssetResult<Vec<u8>> {
        let key = self.key(path);
        self.files
            .read()
            .get(&key)
            .map(|f| f.bytes.clone())
            .ok_or(AssetError::NotFound {
                urn: key.display().to_string(),
            })
    }

    fn stamp(&self, path: &Path) -> Option<ModificationStamp> {
        self.files
            .read()
            .get(&self.key(path))
            .map(|f| ModificationStamp {
                modified: f.version,
                len: f.bytes.len() as u64,
            })
    }
}
