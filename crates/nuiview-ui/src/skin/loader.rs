//! Loading `.skin` files through the asset resolver.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use nuiview_assets::{AssetError, AssetLoader, AssetResolver, AssetResult, LoadContext, TypedAssets, Urn};
use nuiview_core::alloc::HashMap;
use parking_lot::Mutex;

use crate::convert::AssetContext;
use crate::skin::{SkinDeserializer, UiSkin};

/// Asset loader for `.skin` documents.
///
/// Element names and `inherit` resolve in the skin's own module.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkinLoader;

impl AssetLoader for SkinLoader {
    type Asset = UiSkin;
    type Env = dyn AssetContext;

    fn extensions(&self) -> &[&str] {
        &["skin"]
    }

    fn load(&self, ctx: LoadContext<'_>, env: &Self::Env) -> AssetResult<UiSkin> {
        let text = std::str::from_utf8(ctx.bytes).map_err(|e| ctx.error(e.to_string()))?;
        let origin = ctx.path.display().to_string();

        let load = SkinDeserializer::new(env)
            .with_module_context(ctx.urn.module())
            .with_name(ctx.urn.to_string())
            .load_str(text, &origin)
            .map_err(|e| ctx.error(e.to_string()))?;

        if !load.diagnostics.is_empty() {
            tracing::warn!("Skin {} loaded with {} problems", ctx.urn, load.diagnostics.len());
        }
        Ok(load.skin)
    }

    fn name(&self) -> &'static str {
        "skin"
    }
}

/// A skin being loaded on some thread.
struct LoadFrame {
    key: String,
    /// Set when a nested load hit the cycle guard, so the result is partial.
    cut_by_cycle: bool,
    /// Skins requested while loading, with the instances handed out.
    uses: Vec<(String, Arc<UiSkin>)>,
}

/// Skins a cached skin was built from.
struct SkinDependencies {
    skin: Arc<UiSkin>,
    uses: Vec<(String, Arc<UiSkin>)>,
}

/// Cached skins, dropped wholesale whenever the class registry changes.
///
/// A cached skin is also reloaded when a skin it inherits from was reloaded
/// since, so edits to a base show up in every skin built on it.
pub struct SkinAssets {
    assets: TypedAssets<SkinLoader>,
    registry_generation: AtomicU64,
    /// Skins being loaded, per thread, innermost last. Stops `inherit` cycles.
    loading: Mutex<HashMap<ThreadId, Vec<LoadFrame>>>,
    dependencies: Mutex<HashMap<String, SkinDependencies>>,
}

impl SkinAssets {
    pub fn new(resolver: Arc<AssetResolver>) -> Self {
        Self {
            assets: TypedAssets::new(resolver, SkinLoader),
            registry_generation: AtomicU64::new(0),
            loading: Mutex::new(HashMap::default()),
            dependencies: Mutex::new(HashMap::default()),
        }
    }

    /// Load a skin, resolving a bare name in `module_context`.
    pub fn get(&self, env: &(dyn AssetContext + 'static), module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>> {
        let generation = env.registry().generation();
        if self.registry_generation.swap(generation, Ordering::AcqRel) != generation {
            tracing::debug!("Widget classes changed, dropping {} cached skins", self.assets.cached_len());
            self.invalidate_all();
        }

        let key = Urn::qualify(module_context, urn);
        let mut skin = self.load(env, &key)?;
        if !self.dependencies_current(env, &key) {
            tracing::debug!("Skin {} inherits from a changed skin, reloading", key);
            self.assets.invalidate(&key);
            skin = self.load(env, &key)?;
        }

        if let Some(frame) = self.loading.lock().get_mut(&thread::current().id()).and_then(|s| s.last_mut()) {
            frame.uses.push((key, skin.clone()));
        }
        Ok(skin)
    }

    fn load(&self, env: &(dyn AssetContext + 'static), key: &str) -> AssetResult<Arc<UiSkin>> {
        let thread = thread::current().id();
        {
            let mut loading = self.loading.lock();
            let stack = loading.entry(thread).or_default();
            if stack.iter().any(|frame| frame.key == key) {
                // Everything on the stack now depends on a cut-short skin.
                for frame in stack.iter_mut() {
                    frame.cut_by_cycle = true;
                }
                return Err(AssetError::Cycle { urn: key.to_string() });
            }
            stack.push(LoadFrame {
                key: key.to_string(),
                cut_by_cycle: false,
                uses: Vec::new(),
            });
        }

        let result = self.assets.get(env, "", key);

        let frame = {
            let mut loading = self.loading.lock();
            let frame = loading.get_mut(&thread).and_then(Vec::pop);
            if loading.get(&thread).is_some_and(Vec::is_empty) {
                loading.remove(&thread);
            }
            frame
        };
        let Some(frame) = frame else {
            return result;
        };
        if let Ok(skin) = &result {
            let mut dependencies = self.dependencies.lock();
            if frame.cut_by_cycle {
                tracing::debug!("Not caching {}, its inherit chain loops", key);
                self.assets.invalidate(key);
                dependencies.remove(key);
            } else if dependencies.get(key).is_none_or(|deps| !Arc::ptr_eq(&deps.skin, skin)) {
                // Freshly loaded rather than served from the cache.
                dependencies.insert(
                    key.to_string(),
                    SkinDependencies {
                        skin: skin.clone(),
                        uses: frame.uses,
                    },
                );
            }
        }
        result
    }

    /// Whether every skin `key` was built from is still the cached one.
    fn dependencies_current(&self, env: &(dyn AssetContext + 'static), key: &str) -> bool {
        let uses = match self.dependencies.lock().get(key) {
            Some(deps) => deps.uses.clone(),
            None => return true,
        };
        uses.iter().all(|(dep, used)| {
            self.get(env, "", dep)
                .is_ok_and(|current| Arc::ptr_eq(used, &current))
        })
    }

    pub fn invalidate_all(&self) {
        self.assets.invalidate_all();
        self.dependencies.lock().clear();
    }

    pub fn cached_len(&self) -> usize {
        self.assets.cached_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::CorePlugin;
    use crate::registry::{SharedRegistry, WidgetClassRegistry};
    use nuiview_assets::{BitmapFont, MemoryProject, ModuleResolver, ModuleScanOptions, TextureRegion};
    use nuiview_core::Color;

    struct Env {
        registry: SharedRegistry,
        skins: SkinAssets,
    }

    impl AssetContext for Env {
        fn registry(&self) -> Arc<WidgetClassRegistry> {
            self.registry.snapshot()
        }

        fn texture(&self, urn: &str) -> AssetResult<Arc<TextureRegion>> {
            Err(AssetError::NotFound { urn: urn.to_string() })
        }

        fn font(&self, urn: &str) -> AssetResult<Arc<BitmapFont>> {
            Err(AssetError::NotFound { urn: urn.to_string() })
        }

        fn skin(&self, module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>> {
            self.skins.get(self, module_context, urn)
        }
    }

    fn env() -> (Arc<MemoryProject>, Env) {
        let project = Arc::new(MemoryProject::new("/p"));
        project.insert("engine/module.json", r#"{"id": "engine"}"#);
        project.insert("engine/skins/base.skin", r#"{"textColor": "FF0000FF", "minWidth": 4}"#);
        project.insert("engine/skins/child.skin", r#"{"inherit": "base", "textColor": "00FF00FF"}"#);
        project.insert("engine/skins/loop.skin", r#"{"inherit": "loop", "minWidth": 1}"#);
        project.insert("engine/skins/ping.skin", r#"{"inherit": "pong", "minWidth": 2}"#);
        project.insert("engine/skins/pong.skin", r#"{"inherit": "ping", "minHeight": 3}"#);
        let modules = Arc::new(ModuleResolver::scanned(project.clone(), ModuleScanOptions::default()));
        let resolver = Arc::new(AssetResolver::new(modules));

        let mut registry = WidgetClassRegistry::new();
        registry.add_plugin(&CorePlugin);
        let env = Env {
            registry: SharedRegistry::new(registry),
            skins: SkinAssets::new(resolver),
        };
        (project, env)
    }

    #[test]
    fn test_inherit_resolves_in_skin_module() {
        let (_, env) = env();
        let skin = env.skin("", "engine:child").unwrap();
        assert_eq!(skin.name(), "engine:child");
        let style = skin.style("", None, "", "");
        assert_eq!(style.text_color, Color::GREEN);
        assert_eq!(style.min_width, 4);
    }

    #[test]
    fn test_cached_until_registry_changes() {
        let (_, env) = env();
        let first = env.skin("engine", "base").unwrap();
        let second = env.skin("engine", "base").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        env.registry.update(|_| {});
        let third = env.skin("engine", "base").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_reload_after_edit() {
        let (project, env) = env();
        let first = env.skin("engine", "base").unwrap();
        project.insert("engine/skins/base.skin", r#"{"textColor": "0000FFFF"}"#);
        let second = env.skin("engine", "base").unwrap();
        assert_eq!(first.style("", None, "", "").text_color, Color::RED);
        assert_eq!(second.style("", None, "", "").text_color, Color::BLUE);
    }

    #[test]
    fn test_self_inherit_stops() {
        let (_, env) = env();
        let skin = env.skin("engine", "loop").unwrap();
        assert!(skin.base().is_none());
        assert_eq!(skin.style("", None, "", "").min_width, 1);
    }

    #[test]
    fn test_child_reloads_after_base_edit() {
        let (project, env) = env();
        let first = env.skin("engine", "child").unwrap();
        assert!(Arc::ptr_eq(&first, &env.skin("engine", "child").unwrap()));
        assert_eq!(first.style("", None, "", "").min_width, 4);

        project.insert("engine/skins/base.skin", r#"{"textColor": "FF0000FF", "minWidth": 9}"#);
        let second = env.skin("engine", "child").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.style("", None, "", "").min_width, 9);
        assert_eq!(second.style("", None, "", "").text_color, Color::GREEN);
        assert!(Arc::ptr_eq(&second, &env.skin("engine", "child").unwrap()));
    }

    #[test]
    fn test_skins_cut_by_a_loop_are_not_cached() {
        let (_, env) = env();
        let ping = env.skin("engine", "ping").unwrap();
        assert_eq!(ping.base().unwrap().name(), "engine:pong");
        assert!(ping.base().unwrap().base().is_none());

        // Loaded on its own, pong still gets ping as its base.
        let pong = env.skin("engine", "pong").unwrap();
        assert_eq!(pong.base().unwrap().name(), "engine:ping");
        let style = pong.style("", None, "", "");
        assert_eq!(style.min_width, 2);
        assert_eq!(style.min_height, 3);
        assert_eq!(env.skins.cached_len(), 0);
    }

    #[test]
    fn test_missing_skin() {
        let (_, env) = env();
        assert!(env.skin("engine", "absent").unwrap_err().is_not_found());
    }
}
