//! Class descriptors for the built-in widgets.
//!
//! The hierarchy matches the widget library layouts are written against:
//!
//! ```text
//! UIWidget
//! └── CoreWidget            id, skin, family, tooltip, tooltipDelay
//!     ├── UILabel, UIText, UIButton, UIImage, UICheckbox,
//!     │   UISpace, UIBox, UIDropdown, UISlider
//!     └── CoreLayout
//!         ├── ColumnLayout  (abstract hint)
//!         ├── RowLayout     RowLayoutHint
//!         └── FlowLayout    (abstract hint)
//! ```

use std::sync::Arc;

use crate::class::{HintField, HintSchema, WidgetClass, WidgetField};
use crate::error::PropertyError;
use crate::plugin::WidgetPlugin;
use crate::registry::WidgetClassRegistry;
use crate::schema::{FieldType, PropertyValue};
use crate::widget::{LayoutHint, Widget, base_mut, hint_mut, widget_mut};
use crate::widgets::{
    ColumnLayout, FlowLayout, RowLayout, RowLayoutHint, UiBox, UiButton, UiCheckbox, UiDropdown,
    UiImage, UiLabel, UiSlider, UiSpace, UiText,
};

/// Setter closure for a field of widget type `$ty`.
macro_rules! set {
    ($ty:ty, |$w:ident, $v:ident| $body:expr) => {
        |widget: &mut dyn Widget, value: PropertyValue| -> Result<(), PropertyError> {
            let $w = widget_mut::<$ty>(widget)?;
            let $v = value;
            $body;
            Ok(())
        }
    };
}

/// Getter closure for a field of widget type `$ty`.
macro_rules! get {
    ($ty:ty, |$w:ident| $body:expr) => {
        |widget: &dyn Widget| -> Option<PropertyValue> {
            let $w = widget.downcast_ref::<$ty>()?;
            $body
        }
    };
}

fn set_id(widget: &mut dyn Widget, id: String) -> Result<(), PropertyError> {
    base_mut(widget)?.id = Some(id);
    Ok(())
}

fn box_content(widget: &dyn Widget) -> Option<&dyn Widget> {
    widget.downcast_ref::<UiBox>()?.content.as_deref()
}

fn string_list(items: &[String]) -> PropertyValue {
    PropertyValue::List(items.iter().cloned().map(PropertyValue::String).collect())
}

fn core_widget_class(root: &Arc<WidgetClass>) -> Arc<WidgetClass> {
    WidgetClass::builder("CoreWidget")
        .extends(root)
        .id_field(set_id)
        .field(
            WidgetField::new("skin", FieldType::Skin)
                .with_setter(|widget, value| {
                    base_mut(widget)?.skin = Some(value.into_skin()?);
                    Ok(())
                })
                .with_getter(|widget| Some(PropertyValue::Skin(widget.base()?.skin.clone()?))),
        )
        .field(
            WidgetField::new("family", FieldType::String)
                .with_setter(|widget, value| {
                    base_mut(widget)?.family = Some(value.into_string()?);
                    Ok(())
                })
                .with_getter(|widget| widget.family().map(|f| PropertyValue::String(f.to_string()))),
        )
        .field(
            WidgetField::new("tooltip", FieldType::String)
                .with_assign(|widget, value| {
                    base_mut(widget)?.tooltip = Some(value.into_string()?);
                    Ok(())
                })
                .with_getter(|widget| {
                    widget.base()?.tooltip.clone().map(PropertyValue::String)
                }),
        )
        .field(
            WidgetField::new("tooltipDelay", FieldType::Float)
                .with_assign(|widget, value| {
                    base_mut(widget)?.tooltip_delay = value.into_float()?;
                    Ok(())
                })
                .with_getter(|widget| Some(PropertyValue::Float(widget.base()?.tooltip_delay))),
        )
        .build()
}

fn leaf_classes(core: &Arc<WidgetClass>) -> Vec<Arc<WidgetClass>> {
    vec![
        WidgetClass::builder("UILabel")
            .extends(core)
            .constructor::<UiLabel>()
            .field(
                WidgetField::new("text", FieldType::String)
                    .with_setter(set!(UiLabel, |w, v| w.set_text(v.into_string()?)))
                    .with_getter(get!(UiLabel, |w| Some(PropertyValue::String(w.text.clone())))),
            )
            .build(),
        WidgetClass::builder("UIText")
            .extends(core)
            .constructor::<UiText>()
            .field(
                WidgetField::new("text", FieldType::String)
                    .with_assign(set!(UiText, |w, v| w.text = v.into_string()?))
                    .with_getter(get!(UiText, |w| Some(PropertyValue::String(w.text.clone())))),
            )
            .field(
                WidgetField::new("hintText", FieldType::String)
                    .with_assign(set!(UiText, |w, v| w.hint_text = v.into_string()?))
                    .with_getter(get!(UiText, |w| Some(PropertyValue::String(w.hint_text.clone())))),
            )
            .field(
                WidgetField::new("multiline", FieldType::Bool)
                    .with_assign(set!(UiText, |w, v| w.multiline = v.into_bool()?))
                    .with_getter(get!(UiText, |w| Some(PropertyValue::Bool(w.multiline)))),
            )
            .field(
                WidgetField::new("readOnly", FieldType::Bool)
                    .with_assign(set!(UiText, |w, v| w.read_only = v.into_bool()?))
                    .with_getter(get!(UiText, |w| Some(PropertyValue::Bool(w.read_only)))),
            )
            .build(),
        WidgetClass::builder("UIButton")
            .extends(core)
            .constructor::<UiButton>()
            .field(
                WidgetField::new("text", FieldType::String)
                    .with_assign(set!(UiButton, |w, v| w.text = v.into_string()?))
                    .with_getter(get!(UiButton, |w| Some(PropertyValue::String(w.text.clone())))),
            )
            .field(
                WidgetField::new("image", FieldType::OptionalTexture)
                    .with_assign(set!(UiButton, |w, v| w.image = v.into_optional_texture()?))
                    .with_getter(get!(UiButton, |w| {
                        Some(PropertyValue::OptionalTexture(w.image.clone()))
                    })),
            )
            .build(),
        // The setter takes a texture, not an optional one, so "" is rejected.
        WidgetClass::builder("UIImage")
            .extends(core)
            .constructor::<UiImage>()
            .field(
                WidgetField::new("image", FieldType::OptionalTexture)
                    .with_typed_setter(
                        FieldType::Texture,
                        set!(UiImage, |w, v| w.set_image(v.into_texture()?)),
                    )
                    .with_getter(get!(UiImage, |w| w.image.clone().map(PropertyValue::Texture))),
            )
            .field(
                WidgetField::new("tint", FieldType::Color)
                    .with_assign(set!(UiImage, |w, v| w.tint = v.into_color()?))
                    .with_getter(get!(UiImage, |w| Some(PropertyValue::Color(w.tint)))),
            )
            .field(
                WidgetField::new("ignoreAspectRatio", FieldType::Bool)
                    .with_assign(set!(UiImage, |w, v| w.ignore_aspect_ratio = v.into_bool()?))
                    .with_getter(get!(UiImage, |w| Some(PropertyValue::Bool(w.ignore_aspect_ratio)))),
            )
            .build(),
        WidgetClass::builder("UICheckbox")
            .extends(core)
            .constructor::<UiCheckbox>()
            .field(
                WidgetField::new("checked", FieldType::Bool)
                    .with_assign(set!(UiCheckbox, |w, v| w.checked = v.into_bool()?))
                    .with_getter(get!(UiCheckbox, |w| Some(PropertyValue::Bool(w.checked)))),
            )
            .build(),
        WidgetClass::builder("UISpace")
            .extends(core)
            .constructor::<UiSpace>()
            .field(
                WidgetField::new("size", FieldType::Vec2i)
                    .with_assign(set!(UiSpace, |w, v| w.size = v.into_vec2i()?))
                    .with_getter(get!(UiSpace, |w| Some(PropertyValue::Vec2i(w.size)))),
            )
            .build(),
        WidgetClass::builder("UIBox")
            .extends(core)
            .constructor::<UiBox>()
            .field(
                WidgetField::new("content", FieldType::Widget)
                    .with_assign(set!(UiBox, |w, v| w.content = Some(v.into_widget()?)))
                    .with_widget_getter(box_content),
            )
            .build(),
        WidgetClass::builder("UIDropdown")
            .extends(core)
            .constructor::<UiDropdown>()
            .field(
                WidgetField::new("options", FieldType::List(&FieldType::String))
                    .with_assign(set!(UiDropdown, |w, v| {
                        w.options = v.into_list_of(PropertyValue::into_string)?
                    }))
                    .with_getter(get!(UiDropdown, |w| Some(string_list(&w.options)))),
            )
            .field(
                WidgetField::new("visibleOptions", FieldType::Int)
                    .with_assign(set!(UiDropdown, |w, v| w.visible_options = v.into_int()?))
                    .with_getter(get!(UiDropdown, |w| Some(PropertyValue::Int(w.visible_options)))),
            )
            .build(),
        WidgetClass::builder("UISlider")
            .extends(core)
            .constructor::<UiSlider>()
            .field(
                WidgetField::new("minimum", FieldType::Float)
                    .with_assign(set!(UiSlider, |w, v| w.minimum = v.into_float()?))
                    .with_getter(get!(UiSlider, |w| Some(PropertyValue::Float(w.minimum)))),
            )
            .field(
                WidgetField::new("range", FieldType::Float)
                    .with_assign(set!(UiSlider, |w, v| w.range = v.into_float()?))
                    .with_getter(get!(UiSlider, |w| Some(PropertyValue::Float(w.range)))),
            )
            .field(
                WidgetField::new("increment", FieldType::Float)
                    .with_assign(set!(UiSlider, |w, v| w.increment = v.into_float()?))
                    .with_getter(get!(UiSlider, |w| Some(PropertyValue::Float(w.increment)))),
            )
            .field(
                WidgetField::new("precision", FieldType::Int)
                    .with_assign(set!(UiSlider, |w, v| w.precision = v.into_int()?))
                    .with_getter(get!(UiSlider, |w| Some(PropertyValue::Int(w.precision)))),
            )
            .build(),
    ]
}

fn layout_classes(core: &Arc<WidgetClass>) -> Vec<Arc<WidgetClass>> {
    let core_layout = WidgetClass::builder("CoreLayout")
        .extends(core)
        .layout(HintSchema::new("LayoutHint"))
        .build();

    let column = WidgetClass::builder("ColumnLayout")
        .extends(&core_layout)
        .constructor::<ColumnLayout>()
        .field(
            WidgetField::new("columns", FieldType::Int)
                .with_setter(set!(ColumnLayout, |w, v| w.columns = v.into_int()?.max(1)))
                .with_getter(get!(ColumnLayout, |w| Some(PropertyValue::Int(w.columns)))),
        )
        .field(
            WidgetField::new("verticalSpacing", FieldType::Int)
                .with_assign(set!(ColumnLayout, |w, v| w.vertical_spacing = v.into_int()?))
                .with_getter(get!(ColumnLayout, |w| Some(PropertyValue::Int(w.vertical_spacing)))),
        )
        .field(
            WidgetField::new("horizontalSpacing", FieldType::Int)
                .with_assign(set!(ColumnLayout, |w, v| w.horizontal_spacing = v.into_int()?))
                .with_getter(get!(ColumnLayout, |w| Some(PropertyValue::Int(w.horizontal_spacing)))),
        )
        .field(
            WidgetField::new("autoSizeColumns", FieldType::Bool)
                .with_assign(set!(ColumnLayout, |w, v| w.auto_size_columns = v.into_bool()?))
                .with_getter(get!(ColumnLayout, |w| Some(PropertyValue::Bool(w.auto_size_columns)))),
        )
        .field(
            WidgetField::new("columnWidths", FieldType::List(&FieldType::Float))
                .with_setter(set!(ColumnLayout, |w, v| {
                    w.column_widths = v.into_list_of(PropertyValue::into_float)?
                }))
                .with_getter(get!(ColumnLayout, |w| {
                    Some(PropertyValue::List(
                        w.column_widths.iter().copied().map(PropertyValue::Float).collect(),
                    ))
                })),
        )
        .build();

    let row_hint = HintSchema::concrete::<RowLayoutHint>("RowLayoutHint")
        .with_field(
            HintField::new("relativeWidth", FieldType::Float)
                .with_setter(|hint: &mut dyn LayoutHint, value| {
                    hint_mut::<RowLayoutHint>(hint)?.relative_width = Some(value.into_float()?);
                    Ok(())
                })
                .with_getter(|hint: &dyn LayoutHint| {
                    hint.downcast_ref::<RowLayoutHint>()?
                        .relative_width
                        .map(PropertyValue::Float)
                }),
        )
        .with_field(
            HintField::new("useContentWidth", FieldType::Bool)
                .with_assign(|hint: &mut dyn LayoutHint, value| {
                    hint_mut::<RowLayoutHint>(hint)?.use_content_width = value.into_bool()?;
                    Ok(())
                })
                .with_getter(|hint: &dyn LayoutHint| {
                    let hint = hint.downcast_ref::<RowLayoutHint>()?;
                    Some(PropertyValue::Bool(hint.use_content_width))
                }),
        );

    let row = WidgetClass::builder("RowLayout")
        .extends(&core_layout)
        .constructor::<RowLayout>()
        .layout(row_hint)
        .field(
            WidgetField::new("horizontalSpacing", FieldType::Int)
                .with_assign(set!(RowLayout, |w, v| w.horizontal_spacing = v.into_int()?))
                .with_getter(get!(RowLayout, |w| Some(PropertyValue::Int(w.horizontal_spacing)))),
        )
        .field(
            WidgetField::new("verticalSpacing", FieldType::Int)
                .with_assign(set!(RowLayout, |w, v| w.vertical_spacing = v.into_int()?))
                .with_getter(get!(RowLayout, |w| Some(PropertyValue::Int(w.vertical_spacing)))),
        )
        .build();

    let flow = WidgetClass::builder("FlowLayout")
        .extends(&core_layout)
        .constructor::<FlowLayout>()
        .field(
            WidgetField::new("horizontalSpacing", FieldType::Int)
                .with_assign(set!(FlowLayout, |w, v| w.horizontal_spacing = v.into_int()?))
                .with_getter(get!(FlowLayout, |w| Some(PropertyValue::Int(w.horizontal_spacing)))),
        )
        .field(
            WidgetField::new("verticalSpacing", FieldType::Int)
                .with_assign(set!(FlowLayout, |w, v| w.vertical_spacing = v.into_int()?))
                .with_getter(get!(FlowLayout, |w| Some(PropertyValue::Int(w.vertical_spacing)))),
        )
        .build();

    vec![core_layout, column, row, flow]
}

/// Every built-in class, base classes first.
pub fn core_classes() -> Vec<Arc<WidgetClass>> {
    let root = WidgetClass::builder("UIWidget").build();
    let core = core_widget_class(&root);

    let mut classes = vec![root, core.clone()];
    classes.extend(leaf_classes(&core));
    classes.extend(layout_classes(&core));
    classes
}

/// Registers the built-in widget library.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorePlugin;

impl WidgetPlugin for CorePlugin {
    fn name(&self) -> &str {
        "core"
    }

    fn register_classes(&self, registry: &mut WidgetClassRegistry) {
        for class in core_classes() {
            registry.register(class);
        }
    }
}
