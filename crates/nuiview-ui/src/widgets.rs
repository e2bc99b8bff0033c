//! Built-in widgets and layouts.
//!
//! These mirror the core widget library of the UI toolkit the previewed
//! layouts are written for. Their classes are registered by
//! [`CorePlugin`](crate::plugin::CorePlugin).

use std::sync::Arc;

use nuiview_assets::TextureRegion;
use nuiview_core::Color;
use nuiview_core::math::IVec2;

use crate::core_widget;
use crate::widget::{LayoutChild, LayoutChildren, LayoutHint, LayoutWidget, Widget, WidgetBase};

/// Single line of static text.
///
/// A bare string in a layout is shorthand for a label with that text.
#[derive(Debug, Default)]
pub struct UiLabel {
    pub base: WidgetBase,
    pub text: String,
}

impl UiLabel {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::default(),
            text: text.into(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

core_widget!(UiLabel, "UILabel");

/// Editable text box.
#[derive(Debug, Default)]
pub struct UiText {
    pub base: WidgetBase,
    pub text: String,
    /// Shown greyed out while the box is empty.
    pub hint_text: String,
    pub multiline: bool,
    pub read_only: bool,
}

core_widget!(UiText, "UIText");

#[derive(Debug, Default)]
pub struct UiButton {
    pub base: WidgetBase,
    pub text: String,
    pub image: Option<Arc<TextureRegion>>,
}

impl UiButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

core_widget!(UiButton, "UIButton");

#[derive(Debug)]
pub struct UiImage {
    pub base: WidgetBase,
    pub image: Option<Arc<TextureRegion>>,
    pub tint: Color,
    pub ignore_aspect_ratio: bool,
}

impl Default for UiImage {
    fn default() -> Self {
        Self {
            base: WidgetBase::default(),
            image: None,
            tint: Color::WHITE,
            ignore_aspect_ratio: false,
        }
    }
}

impl UiImage {
    pub fn set_image(&mut self, image: Arc<TextureRegion>) {
        self.image = Some(image);
    }
}

core_widget!(UiImage, "UIImage");

#[derive(Debug, Default)]
pub struct UiCheckbox {
    pub base: WidgetBase,
    pub checked: bool,
}

core_widget!(UiCheckbox, "UICheckbox");

/// Empty area of a fixed size.
#[derive(Debug, Default)]
pub struct UiSpace {
    pub base: WidgetBase,
    pub size: IVec2,
}

core_widget!(UiSpace, "UISpace");

/// Frame around a single content widget.
#[derive(Debug, Default)]
pub struct UiBox {
    pub base: WidgetBase,
    pub content: Option<Box<dyn Widget>>,
}

core_widget!(UiBox, "UIBox");

#[derive(Debug)]
pub struct UiDropdown {
    pub base: WidgetBase,
    pub options: Vec<String>,
    /// Options visible at once when opened.
    pub visible_options: i32,
}

impl Default for UiDropdown {
    fn default() -> Self {
        Self {
            base: WidgetBase::default(),
            options: Vec::new(),
            visible_options: 5,
        }
    }
}

core_widget!(UiDropdown, "UIDropdown");

#[derive(Debug)]
pub struct UiSlider {
    pub base: WidgetBase,
    pub minimum: f32,
    pub range: f32,
    pub increment: f32,
    /// Decimal places shown.
    pub precision: i32,
    pub value: f32,
}

impl Default for UiSlider {
    fn default() -> Self {
        Self {
            base: WidgetBase::default(),
            minimum: 0.0,
            range: 1.0,
            increment: 0.1,
            precision: 1,
            value: 0.0,
        }
    }
}

core_widget!(UiSlider, "UISlider");

/// Grid of children filled row by row.
#[derive(Debug)]
pub struct ColumnLayout {
    pub base: WidgetBase,
    pub columns: i32,
    pub vertical_spacing: i32,
    pub horizontal_spacing: i32,
    pub auto_size_columns: bool,
    /// Relative widths, one per column.
    pub column_widths: Vec<f32>,
    children: LayoutChildren,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            base: WidgetBase::default(),
            columns: 1,
            vertical_spacing: 0,
            horizontal_spacing: 0,
            auto_size_columns: false,
            column_widths: Vec::new(),
            children: LayoutChildren::new(),
        }
    }
}

impl LayoutWidget for ColumnLayout {
    fn add_widget(&mut self, child: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>) {
        self.children.push_any(child, hint);
    }

    fn children(&self) -> &[LayoutChild] {
        self.children.as_slice()
    }
}

core_widget!(ColumnLayout, "ColumnLayout", layout);

/// Per-child settings of a [`RowLayout`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RowLayoutHint {
    /// Share of the row's width, `None` to split the remainder evenly.
    pub relative_width: Option<f32>,
    pub use_content_width: bool,
}

impl LayoutHint for RowLayoutHint {}

/// Single row of children.
#[derive(Debug, Default)]
pub struct RowLayout {
    pub base: WidgetBase,
    pub horizontal_spacing: i32,
    pub vertical_spacing: i32,
    children: LayoutChildren,
}

impl RowLayout {
    /// Hint of the child at `index`, if it has one.
    pub fn hint(&self, index: usize) -> Option<&RowLayoutHint> {
        self.children
            .as_slice()
            .get(index)?
            .hint
            .as_deref()?
            .downcast_ref::<RowLayoutHint>()
    }
}

impl LayoutWidget for RowLayout {
    fn add_widget(&mut self, child: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>) {
        self.children.push::<RowLayoutHint>(child, hint);
    }

    fn children(&self) -> &[LayoutChild] {
        self.children.as_slice()
    }
}

core_widget!(RowLayout, "RowLayout", layout);

/// Children placed left to right, wrapping onto new lines.
#[derive(Debug, Default)]
pub struct FlowLayout {
    pub base: WidgetBase,
    pub horizontal_spacing: i32,
    pub vertical_spacing: i32,
    children: LayoutChildren,
}

impl LayoutWidget for FlowLayout {
    fn add_widget(&mut self, child: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>) {
        self.children.push_any(child, hint);
    }

    fn children(&self) -> &[LayoutChild] {
        self.children.as_slice()
    }
}

core_widget!(FlowLayout, "FlowLayout", layout);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_capability() {
        let mut layout: Box<dyn Widget> = Box::new(RowLayout::default());
        let rows = layout.as_layout_mut().unwrap();
        rows.add_widget(Box::new(UiLabel::new("a")), Some(Box::new(RowLayoutHint::default())));
        rows.add_widget(Box::new(UiLabel::new("b")), None);

        assert_eq!(layout.as_layout().unwrap().child_count(), 2);
        let rows = layout.downcast_ref::<RowLayout>().unwrap();
        assert!(rows.hint(0).is_some());
        assert!(rows.hint(1).is_none());

        let label: Box<dyn Widget> = Box::new(UiLabel::new("x"));
        assert!(label.as_layout().is_none());
        assert_eq!(label.debug_name(), "UILabel");
    }

    #[test]
    fn test_find_by_id_nested() {
        let mut inner = ColumnLayout::default();
        let mut label = UiLabel::new("deep");
        label.base.id = Some("target".into());
        inner.add_widget(Box::new(label), None);

        let mut outer = FlowLayout::default();
        outer.add_widget(Box::new(inner), None);

        let found = outer.find_by_id("target").unwrap();
        assert_eq!(found.downcast_ref::<UiLabel>().unwrap().text, "deep");
        assert!(outer.find_by_id("missing").is_none());
    }
}
