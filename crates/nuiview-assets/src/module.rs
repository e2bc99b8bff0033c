//! Module discovery: maps project files to the named content package owning them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nuiview_core::alloc::HashMap;
use nuiview_core::profiling::profile_function;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::io::ProjectFiles;

/// Manifest file names that mark a module root. All three are equivalent.
pub const MANIFEST_NAMES: [&str; 3] = ["module.txt", "module.json", "module.info"];

/// Directories whose contents are never scanned for manifests.
pub const DEFAULT_EXCLUDE_DIRS: [&str; 4] = ["build", "out", ".gradle", "target"];

/// What to look for while scanning a project for modules.
#[derive(Debug, Clone)]
pub struct ModuleScanOptions {
    pub manifest_names: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

impl Default for ModuleScanOptions {
    fn default() -> Self {
        Self {
            manifest_names: MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Deserialize)]
struct Manifest {
    id: String,
}

/// A discovered module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module id as declared (or derived from the directory name).
    pub id: String,
    /// Directory containing the manifest.
    pub root: PathBuf,
    /// The manifest file itself.
    pub manifest: PathBuf,
}

/// Immutable name→root mapping produced by one project scan.
#[derive(Debug, Default)]
pub struct ModuleIndex {
    modules: HashMap<String, ModuleInfo>,
}

impl ModuleIndex {
    /// Scan `project` for manifests and build the mapping.
    ///
    /// Module ids are case-insensitive. When two manifests declare the same id
    /// the one visited last wins; manifests are visited in path order.
    pub fn scan(project: &dyn ProjectFiles, options: &ModuleScanOptions) -> Self {
        profile_function!();

        let root = project.root();
        let mut manifests: Vec<PathBuf> = project
            .walk_files(root, &|dir| is_excluded_dir(dir, &options.exclude_dirs))
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| options.manifest_names.iter().any(|m| m == n))
            })
            .collect();
        manifests.sort();

        let mut modules = HashMap::default();
        for manifest in manifests {
            let Some(module_root) = manifest.parent().map(Path::to_path_buf) else {
                continue;
            };
            let Some(id) = read_module_id(project, &manifest) else {
                continue;
            };

            let info = ModuleInfo {
                id: id.clone(),
                root: module_root,
                manifest,
            };
            if let Some(previous) = modules.insert(id.to_lowercase(), info) {
                tracing::warn!(
                    "Module '{}' declared more than once, {} is shadowed",
                    id,
                    previous.manifest.display()
                );
            }
        }

        tracing::debug!("Module index rebuilt: {} modules", modules.len());
        Self { modules }
    }

    /// Look up a module by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(&id.to_lowercase())
    }

    /// Root directory of a module.
    pub fn root(&self, id: &str) -> Option<&Path> {
        self.get(id).map(|m| m.root.as_path())
    }

    /// The most specific module whose root is a prefix of `path`.
    pub fn module_for_path(&self, path: &Path) -> Option<&ModuleInfo> {
        self.modules
            .values()
            .filter(|m| path.starts_with(&m.root))
            .max_by_key(|m| m.root.components().count())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }
}

fn is_excluded_dir(dir: &Path, exclude_dirs: &[String]) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| exclude_dirs.iter().any(|d| d == name))
}

fn read_module_id(project: &dyn ProjectFiles, manifest: &Path) -> Option<String> {
    let parsed = project
        .read_to_string(manifest)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Manifest>(&text).map_err(|e| e.to_string()));

    match parsed {
        Ok(m) if !m.id.trim().is_empty() => Some(m.id.trim().to_string()),
        Ok(_) => fallback_id(manifest, "empty id"),
        Err(err) => fallback_id(manifest, &err),
    }
}

fn fallback_id(manifest: &Path, reason: &str) -> Option<String> {
    let id = manifest
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .map(str::to_string)?;
    tracing::warn!(
        "Could not read module id from {} ({}), using directory name '{}'",
        manifest.display(),
        reason,
        id
    );
    Some(id)
}

/// Project-wide module resolver.
///
/// Readers always see a complete [`ModuleIndex`] snapshot. A rebuild scans
/// without holding the lock and swaps the new snapshot in when done, so
/// lookups during a rebuild see the previous mapping.
pub struct ModuleResolver {
    project: Arc<dyn ProjectFiles>,
    options: ModuleScanOptions,
    index: RwLock<Arc<ModuleIndex>>,
    stale: AtomicBool,
}

impl ModuleResolver {
    /// Create a resolver with an empty, stale index.
    pub fn new(project: Arc<dyn ProjectFiles>, options: ModuleScanOptions) -> Self {
        Self {
            project,
            options,
            index: RwLock::new(Arc::new(ModuleIndex::default())),
            stale: AtomicBool::new(true),
        }
    }

    /// Create a resolver and scan the project right away.
    pub fn scanned(project: Arc<dyn ProjectFiles>, options: ModuleScanOptions) -> Self {
        let resolver = Self::new(project, options);
        resolver.rebuild();
        resolver
    }

    pub fn project(&self) -> &Arc<dyn ProjectFiles> {
        &self.project
    }

    /// Current snapshot of the index.
    pub fn snapshot(&self) -> Arc<ModuleIndex> {
        self.index.read().clone()
    }

    /// Rescan the project and publish the new index.
    pub fn rebuild(&self) -> Arc<ModuleIndex> {
        // Cleared first so a change during the scan leaves the index stale.
        self.stale.store(false, Ordering::Release);
        let index = Arc::new(ModuleIndex::scan(self.project.as_ref(), &self.options));
        *self.index.write() = index.clone();
        index
    }

    /// Rebuild only if the index was marked stale. Returns whether it ran.
    pub fn rebuild_if_stale(&self) -> bool {
        if self.is_stale() {
            self.rebuild();
            true
        } else {
            false
        }
    }

    /// Flag the index as out of date, e.g. after a build or manifest edit.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Id of the most specific module containing `path`.
    pub fn resolve_module(&self, path: &Path) -> Option<String> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project.root().join(path)
        };
        self.snapshot().module_for_path(&path).map(|m| m.id.clone())
    }

    /// Root directory of module `id`.
    pub fn module_root(&self, id: &str) -> Option<PathBuf> {
        self.snapshot().root(id).map(Path::to_path_buf)
    }

    /// Whether `path` is a manifest file by name.
    pub fn is_manifest(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.options.manifest_names.iter().any(|m| m == n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetResult;
    use crate::io::{MemoryProject, ModificationStamp};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn project() -> Arc<MemoryProject> {
        let project = MemoryProject::new("/project");
        project.insert("engine/module.txt", r#"{"id": "engine"}"#);
        project.insert("modules/Core/module.json", r#"{"id": "Core"}"#);
        project.insert("modules/Core/nested/module.info", r#"{"id": "nested"}"#);
        project.insert("modules/broken/module.txt", "not json");
        project.insert("build/copied/module.txt", r#"{"id": "copied"}"#);
        Arc::new(project)
    }

    #[test]
    fn test_scan_reads_ids_and_excludes_build_dirs() {
        let project = project();
        let index = ModuleIndex::scan(project.as_ref(), &ModuleScanOptions::default());

        assert_eq!(index.len(), 4);
        assert_eq!(index.root("engine"), Some(Path::new("/project/engine")));
        assert_eq!(index.root("CORE"), Some(Path::new("/project/modules/Core")));
        assert_eq!(index.get("core").unwrap().id, "Core");
        assert!(index.get("copied").is_none());
    }

    /// Records every walk and every directory the walk asks about.
    struct CountingProject {
        inner: MemoryProject,
        walks: AtomicUsize,
        dirs: Mutex<Vec<PathBuf>>,
    }

    impl ProjectFiles for CountingProject {
        fn root(&self) -> &Path {
            self.inner.root()
        }

        fn walk_files(&self, scope: &Path, skip_dir: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
            self.walks.fetch_add(1, Ordering::Relaxed);
            self.inner.walk_files(scope, &|dir| {
                self.dirs.lock().push(dir.to_path_buf());
                skip_dir(dir)
            })
        }

        fn read(&self, path: &Path) -> AssetResult<Vec<u8>> {
            self.inner.read(path)
        }

        fn stamp(&self, path: &Path) -> Option<ModificationStamp> {
            self.inner.stamp(path)
        }
    }

    #[test]
    fn test_scan_walks_once_and_never_enters_excluded_dirs() {
        let inner = MemoryProject::new("/project");
        inner.insert("engine/module.txt", r#"{"id": "engine"}"#);
        inner.insert("engine/module.json", r#"{"id": "engine"}"#);
        inner.insert("engine/build/copied/module.txt", r#"{"id": "copied"}"#);
        inner.insert("engine/build/copied/deep/module.info", r#"{"id": "deep"}"#);
        let project = CountingProject {
            inner,
            walks: AtomicUsize::new(0),
            dirs: Mutex::new(Vec::new()),
        };

        let index = ModuleIndex::scan(&project, &ModuleScanOptions::default());

        assert_eq!(index.len(), 1);
        assert_eq!(project.walks.load(Ordering::Relaxed), 1);
        let dirs = project.dirs.lock();
        assert!(dirs.contains(&PathBuf::from("/project/engine/build")));
        assert!(dirs.iter().all(|dir| !dir.starts_with("/project/engine/build/copied")));
    }

    #[test]
    fn test_parse_failure_falls_back_to_directory_name() {
        let project = project();
        let index = ModuleIndex::scan(project.as_ref(), &ModuleScanOptions::default());
        assert_eq!(index.root("broken"), Some(Path::new("/project/modules/broken")));
    }

    #[test]
    fn test_resolve_most_specific_module() {
        let resolver = ModuleResolver::scanned(project(), ModuleScanOptions::default());

        assert_eq!(
            resolver.resolve_module(Path::new("modules/Core/ui/menu.ui")),
            Some("Core".to_string())
        );
        assert_eq!(
            resolver.resolve_module(Path::new("/project/modules/Core/nested/a.ui")),
            Some("nested".to_string())
        );
        assert_eq!(resolver.resolve_module(Path::new("/elsewhere/a.ui")), None);
        // Prefix match is per path component.
        assert_eq!(resolver.resolve_module(Path::new("modules/CoreExtra/a.ui")), None);
    }

    #[test]
    fn test_stale_rebuild_picks_up_new_modules() {
        let project = project();
        let resolver = ModuleResolver::scanned(project.clone(), ModuleScanOptions::default());
        assert!(!resolver.is_stale());

        project.insert("modules/extra/module.txt", r#"{"id": "extra"}"#);
        assert_eq!(resolver.module_root("extra"), None);

        resolver.mark_stale();
        assert!(resolver.rebuild_if_stale());
        assert!(!resolver.rebuild_if_stale());
        assert_eq!(
            resolver.module_root("extra"),
            Some(PathBuf::from("/project/modules/extra"))
        );
    }

    #[test]
    fn test_old_snapshot_survives_rebuild() {
        let project = project();
        let resolver = ModuleResolver::scanned(project.clone(), ModuleScanOptions::default());
        let before = resolver.snapshot();

        project.remove("engine/module.txt");
        resolver.rebuild();

        assert!(before.get("engine").is_some());
        assert!(resolver.snapshot().get("engine").is_none());
    }
}
