//! Layout serialization: live widget trees back to JSON.
//!
//! Only fields with a getter are written, and only where they differ from a
//! freshly constructed widget of the same class, so output stays close to
//! what a person would write by hand.

use serde_json::{Map, Value};

use crate::class::{HintSchema, WidgetClass};
use crate::convert::to_json;
use crate::registry::WidgetClassRegistry;
use crate::schema::{FieldDescriptor, Getter};
use crate::widget::{LayoutHint, Widget};

/// Writes widget trees using the classes of a registry.
pub struct LayoutWriter<'a> {
    registry: &'a WidgetClassRegistry,
}

impl<'a> LayoutWriter<'a> {
    pub fn new(registry: &'a WidgetClassRegistry) -> Self {
        Self { registry }
    }

    /// JSON for `widget`, or `None` if its class is not registered.
    pub fn to_value(&self, widget: &dyn Widget) -> Option<Value> {
        let Some(class) = self.registry.class_of(widget) else {
            tracing::warn!("Cannot write {}: class not registered", widget.debug_name());
            return None;
        };

        let mut object = Map::new();
        object.insert("type".to_string(), Value::from(self.type_name(widget, class)));
        if let Some(id) = widget.id() {
            object.insert("id".to_string(), Value::from(id));
        }

        let defaults = class.instantiate();
        self.write_fields(&mut object, class.fields(), widget, defaults.as_deref());

        if let Some(layout) = widget.as_layout() {
            let schema = class.layout_hint();
            let contents: Vec<Value> = layout
                .children()
                .iter()
                .filter_map(|child| {
                    let mut value = self.to_value(child.widget.as_ref())?;
                    let info = match (schema, child.hint.as_deref()) {
                        (Some(schema), Some(hint)) => self.hint_value(schema, hint),
                        _ => None,
                    };
                    if let (Some(info), Some(object)) = (info, value.as_object_mut()) {
                        object.insert("layoutInfo".to_string(), info);
                    }
                    Some(value)
                })
                .collect();
            if !contents.is_empty() {
                object.insert("contents".to_string(), Value::Array(contents));
            }
        }

        Some(Value::Object(object))
    }

    /// Pretty-printed JSON for `widget`.
    pub fn to_string_pretty(&self, widget: &dyn Widget) -> Option<String> {
        let value = self.to_value(widget)?;
        serde_json::to_string_pretty(&value).ok()
    }

    /// The name the class is registered under, in its declared case.
    fn type_name(&self, widget: &dyn Widget, class: &WidgetClass) -> String {
        match self.registry.key_of(widget).and_then(|key| key.split_once(':')) {
            Some((module, _)) => format!("{}:{}", module, class.name()),
            None => class.name().to_string(),
        }
    }

    fn hint_value(&self, schema: &HintSchema, hint: &dyn LayoutHint) -> Option<Value> {
        let mut object = Map::new();
        let defaults = schema.instantiate();
        self.write_fields(&mut object, schema.fields(), hint, defaults.as_deref());
        (!object.is_empty()).then_some(Value::Object(object))
    }

    fn write_fields<T: ?Sized>(
        &self,
        object: &mut Map<String, Value>,
        fields: &[FieldDescriptor<T>],
        target: &T,
        defaults: Option<&T>,
    ) {
        // Declared order is most-derived first; write base fields first.
        for field in fields.iter().rev() {
            let Some(getter) = field.getter else {
                continue;
            };
            let value = match getter {
                Getter::Value(get) => {
                    let Some(value) = get(target).as_ref().and_then(to_json) else {
                        continue;
                    };
                    let default = defaults.and_then(get).as_ref().and_then(to_json);
                    if default.as_ref() == Some(&value) {
                        continue;
                    }
                    value
                }
                Getter::Widget(get) => {
                    let Some(nested) = get(target) else {
                        continue;
                    };
                    match self.to_value(nested) {
                        Some(value) => value,
                        None => continue,
                    }
                }
            };
            object.insert(field.key().to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::CorePlugin;
    use crate::widget::LayoutWidget;
    use crate::widgets::{ColumnLayout, RowLayout, RowLayoutHint, UiBox, UiButton, UiLabel};
    use serde_json::json;

    fn registry() -> WidgetClassRegistry {
        let mut registry = WidgetClassRegistry::new();
        registry.add_plugin(&CorePlugin);
        registry
    }

    #[test]
    fn test_writes_non_default_fields() {
        let registry = registry();
        let mut label = UiLabel::new("Hello");
        label.base.id = Some("title".into());

        let value = LayoutWriter::new(&registry).to_value(&label).unwrap();
        assert_eq!(value, json!({"type": "UILabel", "id": "title", "text": "Hello"}));
    }

    #[test]
    fn test_module_subclass_does_not_rename_base_type() {
        let mut registry = registry();
        let label = registry.lookup("UILabel").unwrap().clone();
        registry.register_alias(
            "menu:FancyLabel",
            WidgetClass::builder("FancyLabel")
                .extends(&label)
                .constructor::<UiLabel>()
                .build(),
        );
        let writer = LayoutWriter::new(&registry);

        let plain = UiLabel::new("hi");
        assert_eq!(writer.to_value(&plain).unwrap(), json!({"type": "UILabel", "text": "hi"}));

        let mut fancy = UiLabel::new("hi");
        fancy.base.class_key = Some("menu:fancylabel".into());
        assert_eq!(
            writer.to_value(&fancy).unwrap(),
            json!({"type": "menu:FancyLabel", "text": "hi"})
        );

        // A recorded key that no longer names this type is ignored.
        let mut stale = UiLabel::new("hi");
        stale.base.class_key = Some("uibutton".into());
        assert_eq!(writer.to_value(&stale).unwrap()["type"], "UILabel");
    }

    #[test]
    fn test_writes_children_and_hints() {
        let registry = registry();
        let mut row = RowLayout::default();
        row.horizontal_spacing = 4;
        row.add_widget(
            Box::new(UiButton::new("ok")),
            Some(Box::new(RowLayoutHint {
                relative_width: Some(0.5),
                use_content_width: false,
            })),
        );
        row.add_widget(Box::new(UiLabel::new("plain")), None);

        let value = LayoutWriter::new(&registry).to_value(&row).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "RowLayout",
                "horizontalSpacing": 4,
                "contents": [
                    {"type": "UIButton", "text": "ok", "layoutInfo": {"relativeWidth": 0.5}},
                    {"type": "UILabel", "text": "plain"}
                ]
            })
        );
    }

    #[test]
    fn test_nested_widget_field() {
        let registry = registry();
        let boxed = UiBox {
            content: Some(Box::new(UiLabel::new("inner"))),
            ..Default::default()
        };
        let value = LayoutWriter::new(&registry).to_value(&boxed).unwrap();
        assert_eq!(value["content"], json!({"type": "UILabel", "text": "inner"}));
    }

    #[test]
    fn test_empty_layout_has_no_contents() {
        let registry = registry();
        let value = LayoutWriter::new(&registry).to_value(&ColumnLayout::default()).unwrap();
        assert_eq!(value, json!({"type": "ColumnLayout"}));
    }

    #[test]
    fn test_unregistered_widget() {
        let registry = WidgetClassRegistry::new();
        assert!(LayoutWriter::new(&registry).to_value(&UiLabel::new("x")).is_none());
    }
}
