//! Configurable property schema.
//!
//! Every widget class (and every concrete layout hint type) describes its
//! configurable fields once, as a list of [`FieldDescriptor`]s. The layout
//! deserializer and writer only ever go through these descriptors.

use std::fmt;
use std::sync::Arc;

use nuiview_assets::{BitmapFont, TextureRegion};
use nuiview_core::Color;
use nuiview_core::math::{Border, IVec2};

use crate::error::PropertyError;
use crate::skin::UiSkin;
use crate::widget::Widget;

/// An enum whose variants are written by (case-insensitive) name.
pub trait NamedEnum: Sized + Copy + PartialEq + 'static {
    /// Canonical variant names, in declaration order.
    const NAMES: &'static [&'static str];
    /// Variants, parallel to [`NAMES`](Self::NAMES).
    const VARIANTS: &'static [Self];

    fn name(self) -> &'static str {
        Self::VARIANTS
            .iter()
            .position(|v| *v == self)
            .map(|i| Self::NAMES[i])
            .unwrap_or("")
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| Self::VARIANTS[i])
    }
}

/// Declare a [`NamedEnum`] together with its canonical names.
#[macro_export]
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::schema::NamedEnum for $name {
            const NAMES: &'static [&'static str] = &[$($text),+];
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];
        }
    };
}

/// Static type of a configurable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    Color,
    /// Integer vector written as `[x, y]`.
    Vec2i,
    Border,
    /// One of the listed names, matched case-insensitively.
    Enum(&'static [&'static str]),
    Texture,
    /// A texture where `""` means "no texture".
    OptionalTexture,
    Font,
    Skin,
    /// A nested widget, deserialized like a `contents` entry.
    Widget,
    List(&'static FieldType),
}

impl FieldType {
    pub const fn enumeration<E: NamedEnum>() -> Self {
        FieldType::Enum(E::NAMES)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int => f.write_str("int"),
            FieldType::Float => f.write_str("float"),
            FieldType::String => f.write_str("string"),
            FieldType::Color => f.write_str("color"),
            FieldType::Vec2i => f.write_str("[x, y]"),
            FieldType::Border => f.write_str("border"),
            FieldType::Enum(names) => write!(f, "one of {}", names.join("|")),
            FieldType::Texture => f.write_str("texture"),
            FieldType::OptionalTexture => f.write_str("optional texture"),
            FieldType::Font => f.write_str("font"),
            FieldType::Skin => f.write_str("skin"),
            FieldType::Widget => f.write_str("widget"),
            FieldType::List(inner) => write!(f, "list of {}", inner),
        }
    }
}

/// A converted property value, ready to be handed to a setter.
#[derive(Debug)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Color(Color),
    Vec2i(IVec2),
    Border(Border),
    Enum(&'static str),
    Texture(Arc<TextureRegion>),
    OptionalTexture(Option<Arc<TextureRegion>>),
    Font(Arc<BitmapFont>),
    Skin(Arc<UiSkin>),
    Widget(Box<dyn Widget>),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::Color(_) => "color",
            PropertyValue::Vec2i(_) => "vec2i",
            PropertyValue::Border(_) => "border",
            PropertyValue::Enum(_) => "enum",
            PropertyValue::Texture(_) => "texture",
            PropertyValue::OptionalTexture(_) => "optional texture",
            PropertyValue::Font(_) => "font",
            PropertyValue::Skin(_) => "skin",
            PropertyValue::Widget(_) => "widget",
            PropertyValue::List(_) => "list",
        }
    }

    fn mismatch(&self, expected: &str) -> PropertyError {
        PropertyError::TypeMismatch {
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
    }

    pub fn into_bool(self) -> Result<bool, PropertyError> {
        match self {
            PropertyValue::Bool(v) => Ok(v),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn into_int(self) -> Result<i32, PropertyError> {
        match self {
            PropertyValue::Int(v) => Ok(v),
            other => Err(other.mismatch("int")),
        }
    }

    /// Floats accept ints as well.
    pub fn into_float(self) -> Result<f32, PropertyError> {
        match self {
            PropertyValue::Float(v) => Ok(v),
            PropertyValue::Int(v) => Ok(v as f32),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn into_string(self) -> Result<String, PropertyError> {
        match self {
            PropertyValue::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_color(self) -> Result<Color, PropertyError> {
        match self {
            PropertyValue::Color(v) => Ok(v),
            other => Err(other.mismatch("color")),
        }
    }

    pub fn into_vec2i(self) -> Result<IVec2, PropertyError> {
        match self {
            PropertyValue::Vec2i(v) => Ok(v),
            other => Err(other.mismatch("vec2i")),
        }
    }

    pub fn into_border(self) -> Result<Border, PropertyError> {
        match self {
            PropertyValue::Border(v) => Ok(v),
            other => Err(other.mismatch("border")),
        }
    }

    pub fn into_enum<E: NamedEnum>(self) -> Result<E, PropertyError> {
        match self {
            PropertyValue::Enum(name) => E::from_name(name).ok_or_else(|| {
                PropertyError::InvalidValue(format!("'{}' is not one of {}", name, E::NAMES.join("|")))
            }),
            other => Err(other.mismatch("enum")),
        }
    }

    pub fn into_texture(self) -> Result<Arc<TextureRegion>, PropertyError> {
        match self {
            PropertyValue::Texture(v) => Ok(v),
            PropertyValue::OptionalTexture(Some(v)) => Ok(v),
            other => Err(other.mismatch("texture")),
        }
    }

    pub fn into_optional_texture(self) -> Result<Option<Arc<TextureRegion>>, PropertyError> {
        match self {
            PropertyValue::OptionalTexture(v) => Ok(v),
            PropertyValue::Texture(v) => Ok(Some(v)),
            other => Err(other.mismatch("optional texture")),
        }
    }

    pub fn into_font(self) -> Result<Arc<BitmapFont>, PropertyError> {
        match self {
            PropertyValue::Font(v) => Ok(v),
            other => Err(other.mismatch("font")),
        }
    }

    pub fn into_skin(self) -> Result<Arc<UiSkin>, PropertyError> {
        match self {
            PropertyValue::Skin(v) => Ok(v),
            other => Err(other.mismatch("skin")),
        }
    }

    pub fn into_widget(self) -> Result<Box<dyn Widget>, PropertyError> {
        match self {
            PropertyValue::Widget(v) => Ok(v),
            other => Err(other.mismatch("widget")),
        }
    }

    pub fn into_list(self) -> Result<Vec<PropertyValue>, PropertyError> {
        match self {
            PropertyValue::List(v) => Ok(v),
            other => Err(other.mismatch("list")),
        }
    }

    /// Convert every element of a list with `f`.
    pub fn into_list_of<T>(
        self,
        f: impl Fn(PropertyValue) -> Result<T, PropertyError>,
    ) -> Result<Vec<T>, PropertyError> {
        self.into_list()?.into_iter().map(f).collect()
    }
}

/// Writes a converted value into a target object.
pub type ApplyFn<T> = fn(&mut T, PropertyValue) -> Result<(), PropertyError>;

/// A setter, with the type it accepts.
///
/// The accepted type may differ from the field's declared type.
pub struct Setter<T: ?Sized> {
    pub value_type: FieldType,
    pub apply: ApplyFn<T>,
}

impl<T: ?Sized> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Setter<T> {}

/// Reads a property back out (used by the layout writer).
pub enum Getter<T: ?Sized> {
    Value(fn(&T) -> Option<PropertyValue>),
    Widget(fn(&T) -> Option<&dyn Widget>),
}

impl<T: ?Sized> Clone for Getter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Getter<T> {}

/// One configurable field of a widget class or layout hint.
pub struct FieldDescriptor<T: ?Sized> {
    /// Field name.
    pub name: &'static str,
    /// Explicit JSON key, overriding `name`.
    pub serialized_name: Option<&'static str>,
    /// Declared type of the field.
    pub field_type: FieldType,
    pub setter: Option<Setter<T>>,
    /// Direct field assignment, used when there is no setter.
    pub assign: Option<ApplyFn<T>>,
    pub getter: Option<Getter<T>>,
}

impl<T: ?Sized> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            serialized_name: self.serialized_name,
            field_type: self.field_type,
            setter: self.setter,
            assign: self.assign,
            getter: self.getter,
        }
    }
}

impl<T: ?Sized> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("key", &self.key())
            .field("field_type", &self.field_type)
            .field("setter", &self.setter.map(|s| s.value_type))
            .field("assign", &self.assign.is_some())
            .finish()
    }
}

impl<T: ?Sized> FieldDescriptor<T> {
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            serialized_name: None,
            field_type,
            setter: None,
            assign: None,
            getter: None,
        }
    }

    /// Use a different JSON key than the field name.
    pub fn serialized_as(mut self, key: &'static str) -> Self {
        self.serialized_name = Some(key);
        self
    }

    /// Setter accepting the field's declared type.
    pub fn with_setter(mut self, apply: ApplyFn<T>) -> Self {
        self.setter = Some(Setter {
            value_type: self.field_type,
            apply,
        });
        self
    }

    /// Setter accepting a type other than the declared one.
    pub fn with_typed_setter(mut self, value_type: FieldType, apply: ApplyFn<T>) -> Self {
        self.setter = Some(Setter { value_type, apply });
        self
    }

    pub fn with_assign(mut self, assign: ApplyFn<T>) -> Self {
        self.assign = Some(assign);
        self
    }

    pub fn with_getter(mut self, get: fn(&T) -> Option<PropertyValue>) -> Self {
        self.getter = Some(Getter::Value(get));
        self
    }

    pub fn with_widget_getter(mut self, get: fn(&T) -> Option<&dyn Widget>) -> Self {
        self.getter = Some(Getter::Widget(get));
        self
    }

    /// JSON key of this field.
    pub fn key(&self) -> &'static str {
        self.serialized_name.unwrap_or(self.name)
    }

    /// How a JSON value gets into this field: through the setter if there is
    /// one, otherwise by direct assignment.
    pub fn write_target(&self) -> Option<(FieldType, ApplyFn<T>)> {
        match (self.setter, self.assign) {
            (Some(setter), _) => Some((setter.value_type, setter.apply)),
            (None, Some(assign)) => Some((self.field_type, assign)),
            (None, None) => None,
        }
    }
}
