//! Widget model: the capability traits and the state shared by core widgets.

pub mod capability;

use std::sync::Arc;

use crate::error::PropertyError;
use crate::skin::UiSkin;

pub use capability::{
    LayoutChild, LayoutChildren, LayoutHint, LayoutWidget, Widget, hint_mut, widget_mut,
};

/// State every core widget carries.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    pub id: Option<String>,
    pub family: Option<String>,
    /// Skin overriding the one inherited from the parent.
    pub skin: Option<Arc<UiSkin>>,
    pub tooltip: Option<String>,
    /// Seconds before the tooltip shows.
    pub tooltip_delay: f32,
    /// Registry key of the class this widget was built from.
    pub class_key: Option<String>,
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self {
            id: None,
            family: None,
            skin: None,
            tooltip: None,
            tooltip_delay: 0.5,
            class_key: None,
        }
    }
}

/// Shared state of `widget`, for setters declared on the core base class.
pub fn base_mut(widget: &mut dyn Widget) -> Result<&mut WidgetBase, PropertyError> {
    widget.base_mut().ok_or(PropertyError::WrongWidget {
        expected: "core widget",
    })
}

/// Implement [`Widget`] for a type with a `base: WidgetBase` field.
///
/// The `layout` form also requires the type to implement [`LayoutWidget`].
#[macro_export]
macro_rules! core_widget {
    ($ty:ty, $name:literal) => {
        impl $crate::widget::Widget for $ty {
            fn base(&self) -> Option<&$crate::widget::WidgetBase> {
                Some(&self.base)
            }

            fn base_mut(&mut self) -> Option<&mut $crate::widget::WidgetBase> {
                Some(&mut self.base)
            }

            fn debug_name(&self) -> &str {
                $name
            }
        }
    };
    ($ty:ty, $name:literal, layout) => {
        impl $crate::widget::Widget for $ty {
            fn base(&self) -> Option<&$crate::widget::WidgetBase> {
                Some(&self.base)
            }

            fn base_mut(&mut self) -> Option<&mut $crate::widget::WidgetBase> {
                Some(&mut self.base)
            }

            fn debug_name(&self) -> &str {
                $name
            }

            fn as_layout(&self) -> Option<&dyn $crate::widget::LayoutWidget> {
                Some(self)
            }

            fn as_layout_mut(&mut self) -> Option<&mut dyn $crate::widget::LayoutWidget> {
                Some(self)
            }
        }
    };
}
