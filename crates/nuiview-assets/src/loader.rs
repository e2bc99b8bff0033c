//! Asset loader trait and typed, cached loading on top of the resolver.

use std::path::Path;
use std::sync::Arc;

use nuiview_core::profiling::profile_function;

use crate::cache::AssetCache;
use crate::error::{AssetError, AssetResult};
use crate::io::ProjectFiles;
use crate::resolver::AssetResolver;
use crate::urn::Urn;

/// Context provided to asset loaders during loading.
pub struct LoadContext<'a> {
    /// The URN the asset was resolved from.
    pub urn: &'a Urn,
    /// Path of the resolved file.
    pub path: &'a Path,
    /// The raw bytes of the asset.
    pub bytes: &'a [u8],
    /// Project the asset lives in, for loaders that read companion files.
    pub project: &'a dyn ProjectFiles,
    /// Module context the request was made with.
    pub module_context: &'a str,
}

impl<'a> LoadContext<'a> {
    /// The loaded file's directory.
    pub fn directory(&self) -> &'a Path {
        self.path.parent().unwrap_or(self.path)
    }

    /// Build a loader error for this asset.
    pub fn error(&self, message: impl Into<String>) -> AssetError {
        AssetError::LoaderError {
            path: self.path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Trait for loading assets from bytes.
///
/// # Example
///
/// ```ignore
/// struct SkinLoader;
///
/// impl AssetLoader for SkinLoader {
///     type Asset = UiSkin;
///     type Env = SkinEnv;
///
///     fn extensions(&self) -> &[&str] {
///         &["skin"]
///     }
///
///     fn load(&self, ctx: LoadContext<'_>, env: &SkinEnv) -> AssetResult<UiSkin> {
///         // Parse skin JSON...
///     }
/// }
/// ```
pub trait AssetLoader: Send + Sync + 'static {
    /// The asset type this loader produces.
    type Asset: Send + Sync + 'static;

    /// Extra state the loader needs at load time (e.g. a class registry).
    type Env: ?Sized;

    /// File extensions (without dots), tried in order until one resolves.
    fn extensions(&self) -> &[&str];

    /// Load an asset from the provided context.
    fn load(&self, ctx: LoadContext<'_>, env: &Self::Env) -> AssetResult<Self::Asset>;

    /// Human-readable loader name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One typed asset namespace: a loader, the shared resolver, and a cache of
/// its own so assets of different types never collide on a URN.
pub struct TypedAssets<L: AssetLoader> {
    resolver: Arc<AssetResolver>,
    loader: L,
    cache: AssetCache<L::Asset>,
}

impl<L: AssetLoader> TypedAssets<L> {
    pub fn new(resolver: Arc<AssetResolver>, loader: L) -> Self {
        Self {
            resolver,
            loader,
            cache: AssetCache::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn resolver(&self) -> &Arc<AssetResolver> {
        &self.resolver
    }

    /// Load `urn` (qualified by `module_context` if bare).
    ///
    /// Returns the cached instance while the underlying file is unchanged.
    /// Otherwise each extension of the loader is tried in order until one
    /// loads. If none does, the first load failure is returned, or the first
    /// miss when no file was found at all.
    pub fn get(&self, env: &L::Env, module_context: &str, urn: &str) -> AssetResult<Arc<L::Asset>> {
        profile_function!();

        let key = Urn::qualify(module_context, urn);
        let project = self.resolver.project();
        if let Some(cached) = self.cache.get_fresh(&key, project.as_ref()) {
            return Ok(cached);
        }

        let mut first_miss = None;
        let mut first_failure = None;
        for extension in self.loader.extensions() {
            let resolved = match self.resolver.resolve(module_context, urn, extension) {
                Ok(resolved) => resolved,
                Err(err) if err.is_not_found() => {
                    first_miss.get_or_insert(err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let loaded = project.read(&resolved.path).and_then(|bytes| {
                self.loader.load(
                    LoadContext {
                        urn: &resolved.urn,
                        path: &resolved.path,
                        bytes: &bytes,
                        project: project.as_ref(),
                        module_context,
                    },
                    env,
                )
            });
            let asset = match loaded {
                Ok(asset) => Arc::new(asset),
                Err(err) => {
                    tracing::debug!("Failed to load {}, trying next extension: {}", resolved.path.display(), err);
                    first_failure.get_or_insert(err);
                    continue;
                }
            };

            if let Some(stamp) = resolved.stamp {
                self.cache.insert(key.clone(), &resolved.path, stamp, asset.clone());
            }
            tracing::debug!("Loaded {} from {}", key, resolved.path.display());
            return Ok(asset);
        }

        Err(first_failure.or(first_miss).unwrap_or(AssetError::NoExtension {
            loader: self.loader.name(),
        }))
    }

    /// Drop the cached asset under a qualified `key`.
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Drop every cached asset of this type.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::io::MemoryProject;
    use crate::module::{ModuleResolver, ModuleScanOptions};

    struct TextLoader {
        loads: AtomicUsize,
    }

    impl AssetLoader for TextLoader {
        type Asset = String;
        type Env = ();

        fn extensions(&self) -> &[&str] {
            &["txt", "text"]
        }

        fn load(&self, ctx: LoadContext<'_>, _env: &()) -> AssetResult<String> {
            self.loads.fetch_add(1, Ordering::Relaxed);
            String::from_utf8(ctx.bytes.to_vec()).map_err(|e| ctx.error(e.to_string()))
        }
    }

    fn assets() -> (Arc<MemoryProject>, TypedAssets<TextLoader>) {
        let project = Arc::new(MemoryProject::new("/p"));
        project.insert("engine/module.json", r#"{"id": "engine"}"#);
        project.insert("engine/hello.txt", "hello");
        project.insert("engine/alt.text", "alternate");
        project.insert("engine/both.txt", vec![0xffu8, 0xfe]);
        project.insert("engine/both.text", "fallback");
        project.insert("engine/corrupt.txt", vec![0xffu8]);
        project.insert("engine/corrupt.text", vec![0xfeu8]);
        let modules = Arc::new(ModuleResolver::scanned(project.clone(), ModuleScanOptions::default()));
        let resolver = Arc::new(AssetResolver::new(modules));
        let loader = TextLoader {
            loads: AtomicUsize::new(0),
        };
        (project, TypedAssets::new(resolver, loader))
    }

    #[test]
    fn test_cached_instance_until_modified() {
        let (project, assets) = assets();

        let first = assets.get(&(), "engine", "hello").unwrap();
        let second = assets.get(&(), "engine", "hello").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(assets.loader().loads.load(Ordering::Relaxed), 1);

        project.insert("engine/hello.txt", "changed");
        let third = assets.get(&(), "engine", "engine:hello").unwrap();
        assert_eq!(third.as_str(), "changed");
        assert_eq!(assets.loader().loads.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_alternate_extension() {
        let (_, assets) = assets();
        assert_eq!(assets.get(&(), "engine", "alt").unwrap().as_str(), "alternate");
    }

    #[test]
    fn test_miss_reports_first_extension() {
        let (_, assets) = assets();
        match assets.get(&(), "engine", "nothing") {
            Err(AssetError::NotFound { urn }) => assert_eq!(urn, "engine:nothing.txt"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unloadable_file_falls_back_to_next_extension() {
        let (_, assets) = assets();
        assert_eq!(assets.get(&(), "engine", "both").unwrap().as_str(), "fallback");
        assert_eq!(assets.cached_len(), 1);
    }

    #[test]
    fn test_every_extension_failing_reports_first_failure() {
        let (_, assets) = assets();
        match assets.get(&(), "engine", "corrupt") {
            Err(AssetError::LoaderError { path, .. }) => {
                assert_eq!(path.as_path(), Path::new("/p/engine/corrupt.txt"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(assets.loader().loads.load(Ordering::Relaxed), 2);
    }
}
