//! Widget class descriptors.
//!
//! A [`WidgetClass`] is built once per widget type and cached in the
//! registry. It carries everything the layout deserializer needs: how to
//! construct an instance, the configurable fields of the whole class
//! hierarchy (most-derived first), where the `id` goes and, for layouts, the
//! schema of the per-child hint.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::PropertyError;
use crate::schema::FieldDescriptor;
use crate::widget::{LayoutHint, Widget};

/// Configurable field of a widget class.
pub type WidgetField = FieldDescriptor<dyn Widget>;

/// Configurable field of a layout hint.
pub type HintField = FieldDescriptor<dyn LayoutHint>;

/// Direct assignment of a widget's `id`.
pub type IdAssign = fn(&mut dyn Widget, String) -> Result<(), PropertyError>;

bitflags! {
    /// What a widget class supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassCapabilities: u8 {
        /// Has a default constructor.
        const CONSTRUCTIBLE = 1 << 0;
        /// Declares configurable fields somewhere in its hierarchy.
        const CONFIGURABLE = 1 << 1;
        /// Lays out children with per-child hints.
        const LAYOUT = 1 << 2;
    }
}

fn construct_widget<W: Widget + Default>() -> Box<dyn Widget> {
    Box::new(W::default())
}

fn construct_hint<H: LayoutHint + Default>() -> Box<dyn LayoutHint> {
    Box::new(H::default())
}

/// Schema of the hint type a layout class accepts for its children.
pub struct HintSchema {
    name: &'static str,
    construct: Option<fn() -> Box<dyn LayoutHint>>,
    fields: Vec<HintField>,
}

impl HintSchema {
    /// An abstract hint type: `layoutInfo` is never deserialized for it.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            construct: None,
            fields: Vec::new(),
        }
    }

    /// A concrete hint type constructed with `H::default()`.
    pub fn concrete<H: LayoutHint + Default>(name: &'static str) -> Self {
        Self {
            name,
            construct: Some(construct_hint::<H>),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: HintField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_concrete(&self) -> bool {
        self.construct.is_some()
    }

    pub fn instantiate(&self) -> Option<Box<dyn LayoutHint>> {
        self.construct.map(|construct| construct())
    }

    pub fn fields(&self) -> &[HintField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&HintField> {
        self.fields.iter().find(|f| f.key() == key)
    }
}

impl fmt::Debug for HintSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintSchema")
            .field("name", &self.name)
            .field("concrete", &self.is_concrete())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Descriptor of one widget class.
pub struct WidgetClass {
    name: &'static str,
    parent: Option<Arc<WidgetClass>>,
    construct: Option<fn() -> Box<dyn Widget>>,
    type_id: Option<TypeId>,
    fields: Vec<WidgetField>,
    id_field: Option<IdAssign>,
    layout_hint: Option<Arc<HintSchema>>,
}

impl WidgetClass {
    pub fn builder(name: &'static str) -> WidgetClassBuilder {
        WidgetClassBuilder {
            class: WidgetClass {
                name,
                parent: None,
                construct: None,
                type_id: None,
                fields: Vec::new(),
                id_field: None,
                layout_hint: None,
            },
        }
    }

    /// Simple class name, as written in layouts.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&Arc<WidgetClass>> {
        self.parent.as_ref()
    }

    /// This class followed by its ancestors, most-derived first.
    pub fn lineage(&self) -> impl Iterator<Item = &WidgetClass> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Whether this class is `name` or derives from it (case-insensitive).
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage().any(|class| class.name.eq_ignore_ascii_case(name))
    }

    /// Concrete type constructed by this class.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn capabilities(&self) -> ClassCapabilities {
        let mut caps = ClassCapabilities::empty();
        caps.set(ClassCapabilities::CONSTRUCTIBLE, self.construct.is_some());
        caps.set(ClassCapabilities::CONFIGURABLE, !self.fields.is_empty());
        caps.set(ClassCapabilities::LAYOUT, self.layout_hint.is_some());
        caps
    }

    pub fn is_layout(&self) -> bool {
        self.layout_hint.is_some()
    }

    /// Construct a fresh instance. `None` for abstract classes.
    pub fn instantiate(&self) -> Option<Box<dyn Widget>> {
        self.construct.map(|construct| construct())
    }

    /// Every configurable field of the hierarchy, most-derived first.
    pub fn fields(&self) -> &[WidgetField] {
        &self.fields
    }

    /// Field by JSON key.
    pub fn field(&self, key: &str) -> Option<&WidgetField> {
        self.fields.iter().find(|f| f.key() == key)
    }

    /// Nearest `id` attribute in the hierarchy.
    pub fn id_field(&self) -> Option<IdAssign> {
        self.id_field
    }

    /// Hint schema for layout classes.
    pub fn layout_hint(&self) -> Option<&Arc<HintSchema>> {
        self.layout_hint.as_ref()
    }
}

impl fmt::Debug for WidgetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetClass")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .field("capabilities", &self.capabilities())
            .field("fields", &self.fields.iter().map(|f| f.key()).collect::<Vec<_>>())
            .field("layout_hint", &self.layout_hint)
            .finish()
    }
}

/// Builder for [`WidgetClass`].
pub struct WidgetClassBuilder {
    class: WidgetClass,
}

impl WidgetClassBuilder {
    /// Inherit fields, the `id` attribute and the hint schema from `parent`.
    pub fn extends(mut self, parent: &Arc<WidgetClass>) -> Self {
        self.class.parent = Some(parent.clone());
        self
    }

    /// Make the class constructible with `W::default()`.
    pub fn constructor<W: Widget + Default>(mut self) -> Self {
        self.class.construct = Some(construct_widget::<W>);
        self.class.type_id = Some(TypeId::of::<W>());
        self
    }

    /// Declare a field on this class.
    pub fn field(mut self, field: WidgetField) -> Self {
        self.class.fields.push(field);
        self
    }

    pub fn id_field(mut self, assign: IdAssign) -> Self {
        self.class.id_field = Some(assign);
        self
    }

    /// Mark the class as a layout accepting `hint` for its children.
    pub fn layout(mut self, hint: HintSchema) -> Self {
        self.class.layout_hint = Some(Arc::new(hint));
        self
    }

    pub fn build(self) -> Arc<WidgetClass> {
        let mut class = self.class;
        if let Some(parent) = class.parent.clone() {
            // Fields declared here shadow inherited ones with the same key.
            for field in parent.fields() {
                if class.fields.iter().all(|own| own.key() != field.key()) {
                    class.fields.push(field.clone());
                }
            }
            if class.id_field.is_none() {
                class.id_field = parent.id_field;
            }
            if class.layout_hint.is_none() {
                class.layout_hint = parent.layout_hint.clone();
            }
        }
        Arc::new(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, PropertyValue};
    use crate::widget::widget_mut;

    #[derive(Debug, Default)]
    struct Plain {
        value: i32,
    }

    impl Widget for Plain {}

    #[derive(Debug, Default)]
    struct PlainHint;
    impl LayoutHint for PlainHint {}

    fn set_value(widget: &mut dyn Widget, value: PropertyValue) -> Result<(), PropertyError> {
        widget_mut::<Plain>(widget)?.value = value.into_int()?;
        Ok(())
    }

    fn set_double(widget: &mut dyn Widget, value: PropertyValue) -> Result<(), PropertyError> {
        widget_mut::<Plain>(widget)?.value = value.into_int()? * 2;
        Ok(())
    }

    #[test]
    fn test_fields_most_derived_first() {
        let base = WidgetClass::builder("Base")
            .field(WidgetField::new("value", FieldType::Int).with_setter(set_value))
            .field(WidgetField::new("other", FieldType::Int).with_setter(set_value))
            .build();
        let derived = WidgetClass::builder("Derived")
            .extends(&base)
            .constructor::<Plain>()
            .field(WidgetField::new("value", FieldType::Int).with_setter(set_double))
            .build();

        let keys: Vec<_> = derived.fields().iter().map(|f| f.key()).collect();
        assert_eq!(keys, vec!["value", "other"]);

        let mut widget = derived.instantiate().unwrap();
        let (_, apply) = derived.field("value").unwrap().write_target().unwrap();
        apply(widget.as_mut(), PropertyValue::Int(4)).unwrap();
        assert_eq!(widget.downcast_ref::<Plain>().unwrap().value, 8);
    }

    #[test]
    fn test_capabilities_and_lineage() {
        let root = WidgetClass::builder("Root").build();
        assert!(root.capabilities().is_empty());
        assert!(root.instantiate().is_none());

        let layout = WidgetClass::builder("Layout")
            .extends(&root)
            .constructor::<Plain>()
            .layout(HintSchema::concrete::<PlainHint>("PlainHint"))
            .build();
        let caps = layout.capabilities();
        assert!(caps.contains(ClassCapabilities::CONSTRUCTIBLE | ClassCapabilities::LAYOUT));
        assert!(!caps.contains(ClassCapabilities::CONFIGURABLE));
        assert!(layout.is_a("root"));
        assert!(!root.is_a("layout"));
        assert_eq!(layout.lineage().map(|c| c.name()).collect::<Vec<_>>(), vec!["Layout", "Root"]);

        let hint = layout.layout_hint().unwrap();
        assert!(hint.is_concrete());
        assert!(hint.instantiate().unwrap().is::<PlainHint>());
    }
}
