//! Widget class registry.
//!
//! Maps case-insensitive type names to [`WidgetClass`] descriptors. Names may
//! be plain (`UILabel`) or module-qualified (`menu:FancyButton`). Later
//! registrations under an existing key silently shadow earlier ones.
//!
//! [`SharedRegistry`] wraps a registry for the background-writer,
//! many-reader pattern: readers take an `Arc` snapshot and never block on
//! registration work in progress.

use std::any::{Any, TypeId};
use std::sync::Arc;

use nuiview_core::alloc::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::class::WidgetClass;
use crate::widget::Widget;

/// Registry mapping lower-cased names to widget classes.
#[derive(Clone, Default)]
pub struct WidgetClassRegistry {
    classes: HashMap<String, Arc<WidgetClass>>,
    /// Keys each concrete type was registered under, oldest first.
    keys_by_type: HashMap<TypeId, Vec<String>>,
    generation: u64,
}

impl WidgetClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` under its simple name.
    pub fn register(&mut self, class: Arc<WidgetClass>) {
        let key = class.name().to_string();
        self.register_alias(&key, class);
    }

    /// Register `class` under an explicit key.
    pub fn register_alias(&mut self, key: &str, class: Arc<WidgetClass>) {
        let key = key.to_lowercase();
        if let Some(type_id) = WidgetClass::type_id(&class) {
            let keys = self.keys_by_type.entry(type_id).or_default();
            if !keys.contains(&key) {
                keys.push(key.clone());
            }
        }
        if self.classes.insert(key.clone(), class).is_some() {
            tracing::debug!("Widget class '{}' shadowed by a later registration", key);
        }
    }

    /// Exact (case-insensitive) lookup.
    pub fn lookup(&self, name: &str) -> Option<&Arc<WidgetClass>> {
        self.classes.get(&name.to_lowercase())
    }

    /// Exact lookup, then `module_context:name`.
    pub fn lookup_in(&self, module_context: &str, name: &str) -> Option<&Arc<WidgetClass>> {
        self.entry_in(module_context, name).map(|(_, class)| class)
    }

    /// Like [`lookup`](Self::lookup), also returning the key that matched.
    pub fn entry(&self, name: &str) -> Option<(&str, &Arc<WidgetClass>)> {
        self.classes
            .get_key_value(&name.to_lowercase())
            .map(|(key, class)| (key.as_str(), class))
    }

    /// Like [`lookup_in`](Self::lookup_in), also returning the key that matched.
    pub fn entry_in(&self, module_context: &str, name: &str) -> Option<(&str, &Arc<WidgetClass>)> {
        self.entry(name).or_else(|| {
            if module_context.is_empty() {
                None
            } else {
                self.entry(&format!("{}:{}", module_context, name))
            }
        })
    }

    /// Class that constructs widgets of `widget`'s concrete type.
    pub fn class_of(&self, widget: &dyn Widget) -> Option<&Arc<WidgetClass>> {
        self.key_of(widget).and_then(|key| self.classes.get(key))
    }

    /// Key `widget`'s class is registered under.
    ///
    /// Widgets built by the layout loader remember the key they were created
    /// from. Other widgets are matched by concrete type, preferring the
    /// earliest unqualified key, so a project class reusing a core widget
    /// type never claims plain instances of that type.
    pub fn key_of(&self, widget: &dyn Widget) -> Option<&str> {
        let type_id = (widget as &dyn Any).type_id();
        if let Some(recorded) = widget.base().and_then(|base| base.class_key.as_deref())
            && let Some((key, class)) = self.classes.get_key_value(recorded)
            && WidgetClass::type_id(class) == Some(type_id)
        {
            return Some(key.as_str());
        }
        self.key_by_type(type_id)
    }

    fn key_by_type(&self, type_id: TypeId) -> Option<&str> {
        let mut live = self.keys_by_type.get(&type_id)?.iter().filter(|key| {
            self.classes
                .get(key.as_str())
                .is_some_and(|class| WidgetClass::type_id(class) == Some(type_id))
        });
        let first = live.next()?;
        if !first.contains(':') {
            return Some(first.as_str());
        }
        Some(live.find(|key| !key.contains(':')).unwrap_or(first).as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered keys and classes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<WidgetClass>)> {
        self.classes.iter().map(|(key, class)| (key.as_str(), class))
    }

    /// Incremented by every [`SharedRegistry::update`].
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for WidgetClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.classes.keys().collect();
        keys.sort();
        f.debug_struct("WidgetClassRegistry")
            .field("classes", &keys)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Copy-on-write handle to a registry shared between threads.
#[derive(Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<WidgetClassRegistry>>,
    /// Serializes writers so concurrent updates never lose registrations.
    writer: Mutex<()>,
}

impl SharedRegistry {
    pub fn new(registry: WidgetClassRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
            writer: Mutex::new(()),
        }
    }

    /// Current registry. Never blocks on an update in progress.
    pub fn snapshot(&self) -> Arc<WidgetClassRegistry> {
        self.current.read().clone()
    }

    /// Apply `f` to a copy of the registry and publish it.
    pub fn update<R>(&self, f: impl FnOnce(&mut WidgetClassRegistry) -> R) -> R {
        let _writer = self.writer.lock();
        let mut next = (*self.snapshot()).clone();
        let result = f(&mut next);
        next.generation += 1;
        *self.current.write() = Arc::new(next);
        result
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}
