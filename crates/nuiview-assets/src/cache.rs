//! Stamp-checked cache of loaded assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nuiview_core::alloc::HashMap;
use parking_lot::RwLock;

use crate::io::{ModificationStamp, ProjectFiles};

struct CacheEntry<T> {
    path: PathBuf,
    stamp: ModificationStamp,
    value: Arc<T>,
}

/// Loaded assets keyed by the URN they were requested with.
///
/// Invalidation is lazy: an entry is only checked against the file's current
/// stamp when it is read, and a mismatch (or a deleted file) makes it a miss.
pub struct AssetCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::default()),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key`, if the file behind it is unchanged.
    pub fn get_fresh(&self, key: &str, project: &dyn ProjectFiles) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if project.stamp(&entry.path) == Some(entry.stamp) {
            Some(entry.value.clone())
        } else {
            tracing::debug!("Cached asset '{}' is stale", key);
            None
        }
    }

    /// Store a freshly loaded value.
    pub fn insert(&self, key: impl Into<String>, path: &Path, stamp: ModificationStamp, value: Arc<T>) {
        self.entries.write().insert(
            key.into(),
            CacheEntry {
                path: path.to_path_buf(),
                stamp,
                value,
            },
        );
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryProject;

    #[test]
    fn test_fresh_until_touched() {
        let project = MemoryProject::new("/p");
        project.insert("a.txt", "a");
        let path = Path::new("/p/a.txt");
        let cache = AssetCache::new();

        let stamp = project.stamp(path).unwrap();
        cache.insert("m:a", path, stamp, Arc::new(1));
        assert_eq!(cache.get_fresh("m:a", &project).as_deref(), Some(&1));

        project.touch(path);
        assert!(cache.get_fresh("m:a", &project).is_none());
    }

    #[test]
    fn test_deleted_file_is_a_miss() {
        let project = MemoryProject::new("/p");
        project.insert("a.txt", "a");
        let path = Path::new("/p/a.txt");
        let cache = AssetCache::new();
        cache.insert("m:a", path, project.stamp(path).unwrap(), Arc::new("a"));

        project.remove(path);
        assert!(cache.get_fresh("m:a", &project).is_none());
        assert!(cache.invalidate("m:a"));
        assert!(cache.is_empty());
    }
}
