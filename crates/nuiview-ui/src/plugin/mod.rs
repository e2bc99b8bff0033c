//! Plugins contributing widget classes.
//!
//! - [`WidgetPlugin`]: registers a fixed set of classes (the core library is
//!   [`CorePlugin`])
//! - [`ClassSource`]: discovers classes compiled into project modules, which
//!   the preview service registers under `module:Name` keys
//!
//! # Example
//!
//! ```ignore
//! let mut registry = WidgetClassRegistry::new();
//! registry.add_plugin(&CorePlugin);
//! let label = registry.lookup("UILabel").unwrap();
//! ```

pub mod core_widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::class::WidgetClass;
use crate::registry::WidgetClassRegistry;

pub use core_widgets::CorePlugin;

/// A bundle of widget classes.
pub trait WidgetPlugin: Send + Sync {
    /// Plugin name for debugging and logging.
    fn name(&self) -> &str;

    /// Register the classes this plugin provides.
    fn register_classes(&self, registry: &mut WidgetClassRegistry);
}

impl WidgetClassRegistry {
    /// Register every class of `plugin`.
    pub fn add_plugin(&mut self, plugin: &dyn WidgetPlugin) {
        let before = self.len();
        plugin.register_classes(self);
        tracing::debug!(
            "Plugin '{}' registered {} widget classes",
            plugin.name(),
            self.len().saturating_sub(before)
        );
    }
}

/// A widget class found in the project, with the file declaring it.
#[derive(Debug, Clone)]
pub struct DiscoveredClass {
    pub class: Arc<WidgetClass>,
    /// Used to attribute the class to a module.
    pub source_path: Option<PathBuf>,
}

/// Capability to enumerate widget classes compiled in the project.
pub trait ClassSource: Send + Sync {
    /// Every widget class currently available. `registry` holds the classes
    /// discovered classes may extend.
    fn discover(&self, registry: &WidgetClassRegistry) -> Vec<DiscoveredClass>;

    /// Files declaring a class with this simple name (case-insensitive),
    /// whether or not it is compiled yet.
    fn declaring_files(&self, name: &str) -> Vec<PathBuf>;
}

type ClassFactory = Box<dyn Fn(&WidgetClassRegistry) -> Option<Arc<WidgetClass>> + Send + Sync>;

struct StaticEntry {
    name: String,
    path: PathBuf,
    /// `None` for declarations that are not compiled.
    factory: Option<ClassFactory>,
}

/// A [`ClassSource`] over a fixed list of classes.
#[derive(Default)]
pub struct StaticClassSource {
    entries: Vec<StaticEntry>,
}

impl StaticClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled class declared in `path`.
    ///
    /// `factory` receives the registry so the class can extend registered
    /// classes; returning `None` skips it.
    pub fn with_class(
        mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        factory: impl Fn(&WidgetClassRegistry) -> Option<Arc<WidgetClass>> + Send + Sync + 'static,
    ) -> Self {
        self.entries.push(StaticEntry {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            factory: Some(Box::new(factory)),
        });
        self
    }

    /// Add a declaration that has no compiled class yet.
    pub fn with_declaration(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.entries.push(StaticEntry {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            factory: None,
        });
        self
    }
}

impl ClassSource for StaticClassSource {
    fn discover(&self, registry: &WidgetClassRegistry) -> Vec<DiscoveredClass> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let class = (entry.factory.as_ref()?)(registry)?;
                Some(DiscoveredClass {
                    class,
                    source_path: Some(entry.path.clone()),
                })
            })
            .collect()
    }

    fn declaring_files(&self, name: &str) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.path.clone())
            .collect()
    }
}
