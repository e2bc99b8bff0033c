//! JSON value conversion for configurable properties.
//!
//! Both the layout and the skin deserializer turn JSON values into
//! [`PropertyValue`]s here, driven by the [`FieldType`] of the target.

use std::sync::Arc;

use nuiview_assets::{AssetResult, BitmapFont, TextureRegion, Urn};
use nuiview_core::Color;
use nuiview_core::math::{Border, IVec2};
use serde_json::{Map, Value};

use crate::error::PropertyError;
use crate::registry::WidgetClassRegistry;
use crate::schema::{FieldType, PropertyValue};
use crate::skin::UiSkin;
use crate::widget::Widget;

/// Module textures and fonts are assumed to live in when unqualified.
pub const DEFAULT_ASSET_MODULE: &str = "engine";

/// Everything the deserializers need from the surrounding project.
pub trait AssetContext: Send + Sync {
    /// Current class registry snapshot.
    fn registry(&self) -> Arc<WidgetClassRegistry>;

    /// Load a texture by qualified URN.
    fn texture(&self, urn: &str) -> AssetResult<Arc<TextureRegion>>;

    /// Load a font by qualified URN.
    fn font(&self, urn: &str) -> AssetResult<Arc<BitmapFont>>;

    /// Load a skin, qualifying `urn` with `module_context` if bare.
    fn skin(&self, module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>>;

    /// Module used to qualify bare texture and font names.
    fn default_module(&self) -> &str {
        DEFAULT_ASSET_MODULE
    }
}

/// Builds a nested widget from a JSON value (a `contents`-style entry).
pub type NestedWidget<'a> = dyn FnMut(&Value) -> Option<Box<dyn Widget>> + 'a;

/// Converts JSON values for one document.
pub struct ValueConverter<'a> {
    assets: &'a dyn AssetContext,
    module_context: &'a str,
}

impl<'a> ValueConverter<'a> {
    pub fn new(assets: &'a dyn AssetContext, module_context: &'a str) -> Self {
        Self {
            assets,
            module_context,
        }
    }

    /// Convert `value` to `ty`.
    ///
    /// `nested` builds widget-typed values; converters without one reject
    /// widget fields.
    pub fn convert(
        &self,
        ty: FieldType,
        value: &Value,
        nested: Option<&mut NestedWidget<'_>>,
    ) -> Result<PropertyValue, PropertyError> {
        match ty {
            FieldType::Bool => value
                .as_bool()
                .map(PropertyValue::Bool)
                .ok_or_else(|| PropertyError::mismatch(ty, value)),
            FieldType::Int => int(value).map(PropertyValue::Int),
            FieldType::Float => value
                .as_f64()
                .map(|v| PropertyValue::Float(v as f32))
                .ok_or_else(|| PropertyError::mismatch(ty, value)),
            FieldType::String => string(value).map(|s| PropertyValue::String(s.to_string())),
            FieldType::Color => color(value).map(PropertyValue::Color),
            FieldType::Vec2i => vec2i(value).map(PropertyValue::Vec2i),
            FieldType::Border => border(value).map(PropertyValue::Border),
            FieldType::Enum(names) => {
                let text = string(value)?;
                names
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(text))
                    .copied()
                    .map(PropertyValue::Enum)
                    .ok_or_else(|| {
                        PropertyError::InvalidValue(format!("'{}' is not one of {}", text, names.join("|")))
                    })
            }
            FieldType::Texture => self.texture(string(value)?).map(PropertyValue::Texture),
            FieldType::OptionalTexture => {
                let name = string(value)?;
                if name.is_empty() {
                    Ok(PropertyValue::OptionalTexture(None))
                } else {
                    self.texture(name).map(|t| PropertyValue::OptionalTexture(Some(t)))
                }
            }
            FieldType::Font => {
                let urn = Urn::qualify(self.assets.default_module(), string(value)?);
                self.assets
                    .font(&urn)
                    .map(PropertyValue::Font)
                    .map_err(|source| PropertyError::UnresolvedAsset { urn, source })
            }
            FieldType::Skin => {
                let name = string(value)?;
                self.assets
                    .skin(self.module_context, name)
                    .map(PropertyValue::Skin)
                    .map_err(|source| PropertyError::UnresolvedAsset {
                        urn: Urn::qualify(self.module_context, name),
                        source,
                    })
            }
            FieldType::Widget => match nested {
                Some(nested) => nested(value).map(PropertyValue::Widget).ok_or_else(|| {
                    PropertyError::InvalidValue("nested widget could not be built".to_string())
                }),
                None => Err(PropertyError::InvalidValue(
                    "widgets are not allowed here".to_string(),
                )),
            },
            FieldType::List(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| PropertyError::mismatch(ty, value))?;
                let mut nested = nested;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.convert(*element, item, nested.as_deref_mut())?);
                }
                Ok(PropertyValue::List(out))
            }
        }
    }

    fn texture(&self, name: &str) -> Result<Arc<TextureRegion>, PropertyError> {
        let urn = Urn::qualify(self.assets.default_module(), name);
        self.assets
            .texture(&urn)
            .map_err(|source| PropertyError::UnresolvedAsset { urn, source })
    }
}

fn string(value: &Value) -> Result<&str, PropertyError> {
    value
        .as_str()
        .ok_or_else(|| PropertyError::mismatch(FieldType::String, value))
}

fn int(value: &Value) -> Result<i32, PropertyError> {
    let number = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| PropertyError::mismatch(FieldType::Int, value))?;
    i32::try_from(number).map_err(|_| PropertyError::InvalidValue(format!("{} is out of range", number)))
}

/// `[r, g, b, a]` floats or an `RRGGBBAA` hex string.
fn color(value: &Value) -> Result<Color, PropertyError> {
    match value {
        Value::Array(items) if items.len() == 4 => {
            let mut channels = [0.0f32; 4];
            for (channel, item) in channels.iter_mut().zip(items) {
                *channel = item
                    .as_f64()
                    .ok_or_else(|| PropertyError::mismatch(FieldType::Float, item))?
                    as f32;
            }
            Ok(Color::from(channels))
        }
        Value::String(text) => Color::parse_hex(text)
            .ok_or_else(|| PropertyError::InvalidValue(format!("'{}' is not a hex color", text))),
        other => Err(PropertyError::mismatch(FieldType::Color, other)),
    }
}

fn vec2i(value: &Value) -> Result<IVec2, PropertyError> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y]) => Ok(IVec2::new(int(x)?, int(y)?)),
        _ => Err(PropertyError::mismatch(FieldType::Vec2i, value)),
    }
}

/// `{"left": .., "right": .., "top": .., "bottom": ..}`, missing sides are 0.
fn border(value: &Value) -> Result<Border, PropertyError> {
    let object: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| PropertyError::mismatch(FieldType::Border, value))?;
    let side = |name: &str| object.get(name).map(int).transpose().map(|v| v.unwrap_or(0));
    Ok(Border::new(side("left")?, side("right")?, side("top")?, side("bottom")?))
}

/// Convert a property value back to JSON, as the layout writer emits it.
pub fn to_json(value: &PropertyValue) -> Option<Value> {
    Some(match value {
        PropertyValue::Bool(v) => Value::from(*v),
        PropertyValue::Int(v) => Value::from(*v),
        PropertyValue::Float(v) => Value::from(*v as f64),
        PropertyValue::String(v) => Value::from(v.as_str()),
        PropertyValue::Color(c) => Value::from(c.to_hex_string()),
        PropertyValue::Vec2i(v) => Value::from(vec![v.x, v.y]),
        PropertyValue::Border(b) => serde_json::json!({
            "left": b.left,
            "right": b.right,
            "top": b.top,
            "bottom": b.bottom,
        }),
        PropertyValue::Enum(name) => Value::from(*name),
        PropertyValue::Texture(t) => Value::from(t.urn().to_string()),
        PropertyValue::OptionalTexture(t) => {
            Value::from(t.as_ref().map(|t| t.urn().to_string()).unwrap_or_default())
        }
        PropertyValue::Font(f) => Value::from(f.urn().to_string()),
        PropertyValue::Skin(s) => Value::from(s.name()),
        PropertyValue::List(items) => Value::Array(items.iter().filter_map(to_json).collect()),
        // Nested widgets are written by the layout writer itself.
        PropertyValue::Widget(_) => return None,
    })
}
