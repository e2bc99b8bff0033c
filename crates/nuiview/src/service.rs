//! The preview service: one per open project.
//!
//! Owns the module resolver, the typed asset caches and the widget class
//! registry, and hands them to deserializers through [`AssetContext`].
//! Everything here is safe to share between the host thread and background
//! tasks; readers always see a complete registry or module index snapshot.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_executor::Task;
use nuiview_assets::{
    AssetResolver, AssetResult, BitmapFont, DiskProject, FontLoader, ImageLoader, ModuleResolver,
    ProjectFiles, TextureRegion, TypedAssets,
};
use nuiview_core::profiling::profile_function;
use nuiview_ui::{
    AssetContext, ClassSource, CorePlugin, LayoutLoader, SharedRegistry, SkinAssets, SkinDeserializer,
    UiSkin, WidgetClassRegistry, WidgetPlugin,
};
use parking_lot::RwLock;

use crate::config::PreviewConfig;
use crate::task_pool::TaskPool;

/// Shared state for previewing the files of one project.
pub struct PreviewService {
    config: PreviewConfig,
    modules: Arc<ModuleResolver>,
    registry: SharedRegistry,
    images: TypedAssets<ImageLoader>,
    fonts: TypedAssets<FontLoader>,
    skins: SkinAssets,
    class_sources: RwLock<Vec<Arc<dyn ClassSource>>>,
}

impl PreviewService {
    /// Service over `project`, with its modules scanned and the core widget
    /// classes registered.
    pub fn new(project: Arc<dyn ProjectFiles>, config: PreviewConfig) -> Self {
        let modules = Arc::new(ModuleResolver::scanned(project, config.scan_options()));
        let resolver =
            Arc::new(AssetResolver::new(modules.clone()).with_case_sensitive(config.case_sensitive_assets));

        let mut registry = WidgetClassRegistry::new();
        registry.add_plugin(&CorePlugin);

        tracing::info!(
            "Preview service ready: {} modules, {} widget classes",
            modules.snapshot().len(),
            registry.len()
        );

        Self {
            config,
            modules,
            registry: SharedRegistry::new(registry),
            images: TypedAssets::new(resolver.clone(), ImageLoader),
            fonts: TypedAssets::new(resolver.clone(), FontLoader),
            skins: SkinAssets::new(resolver),
            class_sources: RwLock::new(Vec::new()),
        }
    }

    /// Service over a project directory on disk.
    pub fn open(root: impl AsRef<Path>, config: PreviewConfig) -> Self {
        Self::new(Arc::new(DiskProject::new(root)), config)
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn modules(&self) -> &Arc<ModuleResolver> {
        &self.modules
    }

    pub fn shared_registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Module owning `path`, or the default module.
    pub fn module_for(&self, path: &Path) -> String {
        self.modules
            .resolve_module(path)
            .unwrap_or_else(|| self.config.default_module.clone())
    }

    /// Register the classes of a plugin.
    ///
    /// Cached skins are rebuilt on next use since they name classes.
    pub fn add_plugin(&self, plugin: &dyn WidgetPlugin) {
        self.registry.update(|registry| registry.add_plugin(plugin));
    }

    /// Add a source of project classes and register what it provides.
    pub fn add_class_source(&self, source: Arc<dyn ClassSource>) -> usize {
        self.class_sources.write().push(source.clone());
        self.register_from(source.as_ref())
    }

    /// Discover classes from every source again, e.g. after a build.
    pub fn refresh_classes(&self) -> usize {
        profile_function!();

        let sources = self.class_sources.read().clone();
        sources.iter().map(|source| self.register_from(source.as_ref())).sum()
    }

    /// Register every class of `source` under `module:Name`.
    fn register_from(&self, source: &dyn ClassSource) -> usize {
        let count = self.registry.update(|registry| {
            let discovered = source.discover(registry);
            for entry in &discovered {
                let module = entry
                    .source_path
                    .as_deref()
                    .and_then(|path| self.modules.resolve_module(path))
                    .unwrap_or_else(|| self.config.default_module.clone());
                let key = format!("{}:{}", module, entry.class.name());
                tracing::debug!("Registering widget class {}", key);
                registry.register_alias(&key, entry.class.clone());
            }
            discovered.len()
        });
        self.skins.invalidate_all();
        count
    }

    /// Modules containing a declaration of a class named `name`, for
    /// prompting the user to build them.
    pub fn modules_declaring(&self, name: &str) -> Vec<String> {
        let sources = self.class_sources.read();
        let modules: BTreeSet<String> = sources
            .iter()
            .flat_map(|source| source.declaring_files(name))
            .filter_map(|path| self.modules.resolve_module(&path))
            .collect();
        modules.into_iter().collect()
    }

    /// The configured default skin, if it resolves.
    pub fn default_skin(&self) -> Option<Arc<UiSkin>> {
        match self.skin("", &self.config.default_skin) {
            Ok(skin) => Some(skin),
            Err(err) => {
                tracing::debug!("No default skin '{}': {}", self.config.default_skin, err);
                None
            }
        }
    }

    /// Layout loader for documents of `module_context`.
    pub fn layout_loader(&self, module_context: &str) -> LayoutLoader<'_> {
        LayoutLoader::new(self).with_module_context(module_context)
    }

    /// Skin deserializer for documents of `module_context`.
    pub fn skin_deserializer(&self, module_context: &str) -> SkinDeserializer<'_> {
        SkinDeserializer::new(self).with_module_context(module_context)
    }

    /// Flag the module index as out of date.
    pub fn mark_modules_stale(&self) {
        self.modules.mark_stale();
    }

    /// Rescan the modules on `pool` if the index is stale, then rediscover
    /// classes. Lookups keep using the previous index until the scan is done.
    ///
    /// Resolves to whether a rescan happened.
    pub fn refresh_modules(self: &Arc<Self>, pool: &TaskPool) -> Task<bool> {
        let service = self.clone();
        pool.spawn_blocking(move || {
            if !service.modules.rebuild_if_stale() {
                return false;
            }
            let classes = service.refresh_classes();
            tracing::info!(
                "Modules rescanned: {} modules, {} project classes",
                service.modules.snapshot().len(),
                classes
            );
            true
        })
    }

    /// Apply pending file watcher events, marking modules stale when a
    /// manifest changed.
    #[cfg(feature = "hot-reload")]
    pub fn poll_changes(&self, watcher: &mut nuiview_assets::ProjectWatcher) -> nuiview_assets::ProjectChanges {
        watcher.poll_changes(&self.modules)
    }
}

impl AssetContext for PreviewService {
    fn registry(&self) -> Arc<WidgetClassRegistry> {
        self.registry.snapshot()
    }

    fn texture(&self, urn: &str) -> AssetResult<Arc<TextureRegion>> {
        self.images.get(&(), &self.config.default_module, urn)
    }

    fn font(&self, urn: &str) -> AssetResult<Arc<BitmapFont>> {
        self.fonts.get(&(), &self.config.default_module, urn)
    }

    fn skin(&self, module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>> {
        self.skins.get(self, module_context, urn)
    }

    fn default_module(&self) -> &str {
        &self.config.default_module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuiview_assets::MemoryProject;
    use nuiview_ui::{StaticClassSource, WidgetClass, widgets::UiLabel};

    fn project() -> Arc<MemoryProject> {
        let project = Arc::new(MemoryProject::new("/project"));
        project.insert("engine/module.json", r#"{"id": "engine"}"#);
        project.insert("engine/skins/default.skin", r#"{"textColor": "00FF00FF"}"#);
        project.insert("menu/module.json", r#"{"id": "menu"}"#);
        project.insert("menu/build/module.json", r#"{"id": "ignored"}"#);
        project
    }

    fn fancy_source() -> StaticClassSource {
        StaticClassSource::new()
            .with_class("FancyLabel", "/project/menu/src/FancyLabel.java", |registry| {
                let label = registry.lookup("UILabel")?.clone();
                Some(
                    WidgetClass::builder("FancyLabel")
                        .extends(&label)
                        .constructor::<UiLabel>()
                        .build(),
                )
            })
            .with_class("Stray", "/elsewhere/Stray.java", |_| {
                Some(WidgetClass::builder("Stray").constructor::<UiLabel>().build())
            })
            .with_declaration("Pending", "/project/menu/src/Pending.java")
    }

    #[test]
    fn test_modules_and_default_skin() {
        let service = PreviewService::new(project(), PreviewConfig::default());
        assert_eq!(service.modules().snapshot().len(), 2);
        assert_eq!(service.module_for(Path::new("menu/ui/main.ui")), "menu");
        assert_eq!(service.module_for(Path::new("/other/file.ui")), "engine");

        let skin = service.default_skin().unwrap();
        assert_eq!(skin.name(), "engine:default");
    }

    #[test]
    fn test_class_source_registration() {
        let service = PreviewService::new(project(), PreviewConfig::default());
        assert_eq!(service.add_class_source(Arc::new(fancy_source())), 2);

        let registry = service.registry();
        assert!(registry.lookup("menu:FancyLabel").is_some());
        assert!(registry.lookup("engine:Stray").is_some());
        assert!(registry.lookup("FancyLabel").is_none());

        let load = service
            .layout_loader("menu")
            .load_value(&serde_json::json!({"type": "FancyLabel", "text": "hi"}));
        assert!(load.root.is_some());

        assert_eq!(service.modules_declaring("pending"), ["menu"]);
        assert!(service.modules_declaring("Unknown").is_empty());
    }

    #[test]
    fn test_refresh_modules_on_pool() {
        let project = project();
        let service = Arc::new(PreviewService::new(project.clone(), PreviewConfig::default()));
        let pool = TaskPool::new(1).unwrap();

        assert!(!pollster::block_on(service.refresh_modules(&pool)));

        project.insert("tools/module.json", r#"{"id": "tools"}"#);
        service.mark_modules_stale();
        assert!(pollster::block_on(service.refresh_modules(&pool)));
        assert!(service.modules().module_root("tools").is_some());
    }
}
