//! Layout deserialization: JSON widget trees to live widgets.
//!
//! Loading is best-effort. Only malformed JSON fails the whole load; every
//! per-node problem (unknown type, unknown key, bad value) is logged, recorded
//! in [`Diagnostics`] and skipped, so the rest of the tree still builds.

use std::sync::Arc;

use nuiview_core::profiling::profile_function;
use serde_json::{Map, Value};

use crate::class::{HintSchema, WidgetClass};
use crate::convert::{AssetContext, ValueConverter};
use crate::diagnostics::{DiagnosticKind, Diagnostics, LayoutLoad, child_path, index_path};
use crate::error::{LayoutError, PropertyError, json_kind};
use crate::registry::WidgetClassRegistry;
use crate::schema::FieldDescriptor;
use crate::widget::{LayoutHint, Widget};
use crate::widgets::UiLabel;

/// Keys handled by the deserializer itself rather than by class fields.
pub const RESERVED_KEYS: [&str; 4] = ["type", "id", "contents", "layoutInfo"];

/// Loads layout documents against a registry snapshot.
pub struct LayoutLoader<'a> {
    assets: &'a dyn AssetContext,
    registry: Arc<WidgetClassRegistry>,
    module_context: String,
}

impl<'a> LayoutLoader<'a> {
    /// Loader using the asset context's current registry.
    pub fn new(assets: &'a dyn AssetContext) -> Self {
        Self {
            registry: assets.registry(),
            assets,
            module_context: String::new(),
        }
    }

    /// Module unqualified type names and skins are resolved in.
    pub fn with_module_context(mut self, module_context: impl Into<String>) -> Self {
        self.module_context = module_context.into();
        self
    }

    pub fn with_registry(mut self, registry: Arc<WidgetClassRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<WidgetClassRegistry> {
        &self.registry
    }

    pub fn module_context(&self) -> &str {
        &self.module_context
    }

    /// Parse and load a layout document.
    ///
    /// `origin` names the source in errors and logs.
    pub fn load_str(&self, text: &str, origin: &str) -> Result<LayoutLoad, LayoutError> {
        profile_function!();

        let value: Value = serde_json::from_str(text).map_err(|e| LayoutError::from_json(&e, origin))?;
        Ok(self.load_value_from(&value, origin))
    }

    /// Load an already parsed layout.
    pub fn load_value(&self, value: &Value) -> LayoutLoad {
        self.load_value_from(value, "<value>")
    }

    fn load_value_from(&self, value: &Value, origin: &str) -> LayoutLoad {
        profile_function!();

        let mut state = LoadState {
            loader: self,
            origin,
            diagnostics: Diagnostics::new(),
        };
        let root = state.node(value, "");

        if !state.diagnostics.is_empty() {
            tracing::debug!(
                "Loaded {} with {} diagnostics ({} missing types)",
                origin,
                state.diagnostics.len(),
                state.diagnostics.missing_types.len()
            );
        }

        LayoutLoad {
            root,
            diagnostics: state.diagnostics,
        }
    }

    /// Exact lookup, then qualified with the module context if unqualified.
    /// Registry key and class for `type_name`.
    fn resolve_class(&self, type_name: &str) -> Option<(String, Arc<WidgetClass>)> {
        let (key, class) = if type_name.contains(':') {
            self.registry.entry(type_name)?
        } else {
            self.registry.entry_in(&self.module_context, type_name)?
        };
        Some((key.to_string(), class.clone()))
    }
}

struct LoadState<'l, 'a> {
    loader: &'l LayoutLoader<'a>,
    origin: &'l str,
    diagnostics: Diagnostics,
}

impl LoadState<'_, '_> {
    /// Build one node: a bare string is a label, an object a typed widget.
    fn node(&mut self, value: &Value, path: &str) -> Option<Box<dyn Widget>> {
        match value {
            Value::String(text) => Some(Box::new(UiLabel::new(text.as_str()))),
            Value::Object(object) => self.object_node(object, path),
            other => {
                self.report(
                    DiagnosticKind::InvalidNode,
                    path,
                    format!("expected a widget object or string, found {}", json_kind(other)),
                );
                None
            }
        }
    }

    fn object_node(&mut self, object: &Map<String, Value>, path: &str) -> Option<Box<dyn Widget>> {
        let Some(type_name) = object.get("type").and_then(Value::as_str) else {
            self.report(DiagnosticKind::InvalidNode, path, "widget has no 'type'");
            return None;
        };

        let Some((key, class)) = self.loader.resolve_class(type_name) else {
            if self.diagnostics.missing_type(type_name, path) {
                tracing::warn!("{}: unknown widget type '{}'", self.origin, type_name);
            }
            return None;
        };

        let Some(mut widget) = class.instantiate() else {
            self.report(
                DiagnosticKind::InvalidNode,
                path,
                format!("'{}' is abstract and cannot be constructed", class.name()),
            );
            return None;
        };
        if let Some(base) = widget.base_mut() {
            base.class_key = Some(key);
        }

        if let Some(id) = object.get("id") {
            self.assign_id(&class, widget.as_mut(), id, path);
        }

        for (key, json) in object {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let field_path = child_path(path, key);
            match class.field(key) {
                Some(field) => self.assign(widget.as_mut(), field, json, &field_path),
                None => self.report(
                    DiagnosticKind::UnknownField,
                    &field_path,
                    format!("'{}' has no configurable field '{}'", class.name(), key),
                ),
            }
        }

        match class.layout_hint() {
            Some(hint) => self.contents(&class, hint, widget.as_mut(), object, path),
            None if object.contains_key("contents") => self.report(
                DiagnosticKind::UnknownField,
                &child_path(path, "contents"),
                format!("'{}' is not a layout, contents ignored", class.name()),
            ),
            None => {}
        }

        Some(widget)
    }

    fn assign_id(&mut self, class: &WidgetClass, widget: &mut dyn Widget, id: &Value, path: &str) {
        let id_path = child_path(path, "id");
        let Some(assign) = class.id_field() else {
            self.report(
                DiagnosticKind::MissingIdField,
                &id_path,
                format!("'{}' has no id attribute", class.name()),
            );
            return;
        };

        let result = match id.as_str() {
            Some(id) => assign(widget, id.to_string()),
            None => Err(PropertyError::mismatch("string", id)),
        };
        if let Err(err) = result {
            self.property_failed(&id_path, err);
        }
    }

    /// Convert `json` and write it into `target` through `field`.
    fn assign<T: ?Sized>(&mut self, target: &mut T, field: &FieldDescriptor<T>, json: &Value, path: &str) {
        let Some((value_type, apply)) = field.write_target() else {
            self.property_failed(path, PropertyError::ReadOnly(field.name));
            return;
        };

        let loader = self.loader;
        let converter = ValueConverter::new(loader.assets, &loader.module_context);
        let converted = {
            let mut nested = |value: &Value| self.node(value, path);
            converter.convert(value_type, json, Some(&mut nested))
        };

        if let Err(err) = converted.and_then(|value| apply(target, value)) {
            self.property_failed(path, err);
        }
    }

    /// Deserialize `contents` in document order, with each child's hint.
    fn contents(
        &mut self,
        class: &WidgetClass,
        hint: &HintSchema,
        widget: &mut dyn Widget,
        object: &Map<String, Value>,
        path: &str,
    ) {
        let Some(contents) = object.get("contents") else {
            return;
        };
        let Some(items) = contents.as_array() else {
            self.report(
                DiagnosticKind::InvalidNode,
                &child_path(path, "contents"),
                format!("'contents' must be an array, found {}", json_kind(contents)),
            );
            return;
        };

        if widget.as_layout_mut().is_none() {
            self.report(
                DiagnosticKind::InvalidNode,
                path,
                format!("'{}' is declared as a layout but cannot hold children", class.name()),
            );
            return;
        }

        for (index, item) in items.iter().enumerate() {
            let item_path = index_path(path, "contents", index);
            let Some(child) = self.node(item, &item_path) else {
                continue;
            };
            let child_hint = self.hint(hint, item, &item_path);
            if let Some(layout) = widget.as_layout_mut() {
                layout.add_widget(child, child_hint);
            }
        }
    }

    /// A child's `layoutInfo`, if present and the hint type is concrete.
    fn hint(&mut self, schema: &HintSchema, item: &Value, path: &str) -> Option<Box<dyn LayoutHint>> {
        let info = item.as_object()?.get("layoutInfo")?;
        let info_path = child_path(path, "layoutInfo");

        if !schema.is_concrete() {
            tracing::debug!("{}: ignoring layoutInfo for abstract hint {}", self.origin, schema.name());
            return None;
        }
        let Some(object) = info.as_object() else {
            self.report(
                DiagnosticKind::InvalidHint,
                &info_path,
                format!("'layoutInfo' must be an object, found {}", json_kind(info)),
            );
            return None;
        };

        let mut hint = schema.instantiate()?;
        for (key, json) in object {
            let field_path = child_path(&info_path, key);
            match schema.field(key) {
                Some(field) => self.assign(hint.as_mut(), field, json, &field_path),
                None => self.report(
                    DiagnosticKind::UnknownField,
                    &field_path,
                    format!("'{}' has no field '{}'", schema.name(), key),
                ),
            }
        }
        Some(hint)
    }

    fn property_failed(&mut self, path: &str, err: PropertyError) {
        tracing::error!("{}: failed to set {}: {}", self.origin, path, err);
        self.diagnostics
            .push(DiagnosticKind::PropertyFailed, path, err.to_string());
    }

    fn report(&mut self, kind: DiagnosticKind, path: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}: {}: {}", self.origin, path, message);
        self.diagnostics.push(kind, path, message);
    }
}
