//! Widget capability traits.
//!
//! Widgets expose optional capabilities through query methods instead of
//! requiring callers to know the concrete type.
//!
//! ```rust,ignore
//! fn append(widget: &mut dyn Widget, child: Box<dyn Widget>) {
//!     if let Some(layout) = widget.as_layout_mut() {
//!         layout.add_widget(child, None);
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;

use crate::error::PropertyError;
use crate::widget::WidgetBase;

/// Base trait for all widgets.
pub trait Widget: Any + Send + Sync + fmt::Debug {
    /// State shared by every core widget, if this widget carries it.
    fn base(&self) -> Option<&WidgetBase> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut WidgetBase> {
        None
    }

    /// Identifier assigned from the layout's `id` key.
    fn id(&self) -> Option<&str> {
        self.base().and_then(|base| base.id.as_deref())
    }

    /// Skin family this widget is styled with.
    fn family(&self) -> Option<&str> {
        self.base().and_then(|base| base.family.as_deref())
    }

    /// Get the widget's name for debugging.
    fn debug_name(&self) -> &str {
        "Widget"
    }

    // Capability query methods

    /// Query if this widget lays out children.
    fn as_layout(&self) -> Option<&dyn LayoutWidget> {
        None
    }

    /// Query if this widget lays out children (mutable).
    fn as_layout_mut(&mut self) -> Option<&mut dyn LayoutWidget> {
        None
    }
}

impl dyn Widget {
    pub fn is<W: Widget>(&self) -> bool {
        (self as &dyn Any).is::<W>()
    }

    pub fn downcast_ref<W: Widget>(&self) -> Option<&W> {
        (self as &dyn Any).downcast_ref::<W>()
    }

    pub fn downcast_mut<W: Widget>(&mut self) -> Option<&mut W> {
        (self as &mut dyn Any).downcast_mut::<W>()
    }
}

/// Downcast a widget for a property setter.
pub fn widget_mut<W: Widget>(widget: &mut dyn Widget) -> Result<&mut W, PropertyError> {
    widget.downcast_mut::<W>().ok_or(PropertyError::WrongWidget {
        expected: std::any::type_name::<W>(),
    })
}

/// Per-child data a layout uses to place one child.
pub trait LayoutHint: Any + Send + Sync + fmt::Debug {}

impl dyn LayoutHint {
    pub fn is<H: LayoutHint>(&self) -> bool {
        (self as &dyn Any).is::<H>()
    }

    pub fn downcast_ref<H: LayoutHint>(&self) -> Option<&H> {
        (self as &dyn Any).downcast_ref::<H>()
    }

    pub fn downcast_mut<H: LayoutHint>(&mut self) -> Option<&mut H> {
        (self as &mut dyn Any).downcast_mut::<H>()
    }
}

/// Downcast a layout hint for a property setter.
pub fn hint_mut<H: LayoutHint>(hint: &mut dyn LayoutHint) -> Result<&mut H, PropertyError> {
    hint.downcast_mut::<H>().ok_or(PropertyError::WrongWidget {
        expected: std::any::type_name::<H>(),
    })
}

/// One child of a layout together with its hint.
#[derive(Debug)]
pub struct LayoutChild {
    pub widget: Box<dyn Widget>,
    pub hint: Option<Box<dyn LayoutHint>>,
}

/// Capability: widget that arranges an ordered list of children.
pub trait LayoutWidget {
    /// Append a child. Hints of the wrong type for this layout are dropped.
    fn add_widget(&mut self, child: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>);

    /// Children in insertion order.
    fn children(&self) -> &[LayoutChild];

    fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Find a direct or nested child by id.
    fn find_by_id(&self, id: &str) -> Option<&dyn Widget> {
        for child in self.children() {
            if child.widget.id() == Some(id) {
                return Some(child.widget.as_ref());
            }
            if let Some(found) = child.widget.as_layout().and_then(|l| l.find_by_id(id)) {
                return Some(found);
            }
        }
        None
    }
}

/// Child storage shared by the built-in layouts.
#[derive(Debug, Default)]
pub struct LayoutChildren {
    children: Vec<LayoutChild>,
}

impl LayoutChildren {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child, keeping the hint only if it is an `H`.
    pub fn push<H: LayoutHint>(&mut self, widget: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>) {
        let hint = match hint {
            Some(hint) if hint.is::<H>() => Some(hint),
            Some(hint) => {
                tracing::warn!(
                    "Dropping layout hint {:?} for {}, expected {}",
                    hint,
                    widget.debug_name(),
                    std::any::type_name::<H>()
                );
                None
            }
            None => None,
        };
        self.children.push(LayoutChild { widget, hint });
    }

    /// Append a child with whatever hint it comes with.
    pub fn push_any(&mut self, widget: Box<dyn Widget>, hint: Option<Box<dyn LayoutHint>>) {
        self.children.push(LayoutChild { widget, hint });
    }

    pub fn as_slice(&self) -> &[LayoutChild] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf(&'static str);

    impl Widget for Leaf {
        fn id(&self) -> Option<&str> {
            Some(self.0)
        }
    }

    #[derive(Debug)]
    struct GoodHint;
    impl LayoutHint for GoodHint {}

    #[derive(Debug)]
    struct OtherHint;
    impl LayoutHint for OtherHint {}

    #[test]
    fn test_downcast() {
        let mut widget: Box<dyn Widget> = Box::new(Leaf("a"));
        assert!(widget.is::<Leaf>());
        assert_eq!(widget.downcast_ref::<Leaf>().unwrap().0, "a");
        assert!(widget_mut::<Leaf>(widget.as_mut()).is_ok());
    }

    #[test]
    fn test_wrong_hint_dropped() {
        let mut children = LayoutChildren::new();
        children.push::<GoodHint>(Box::new(Leaf("a")), Some(Box::new(GoodHint)));
        children.push::<GoodHint>(Box::new(Leaf("b")), Some(Box::new(OtherHint)));

        assert_eq!(children.len(), 2);
        assert!(children.as_slice()[0].hint.is_some());
        assert!(children.as_slice()[1].hint.is_none());
    }
}
