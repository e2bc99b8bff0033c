//! Style fragments and resolved styles.

use std::sync::{Arc, LazyLock};

use nuiview_assets::{BitmapFont, TextureRegion};
use nuiview_core::Color;
use nuiview_core::math::Border;

use crate::error::PropertyError;
use crate::named_enum;
use crate::schema::{FieldDescriptor, FieldType, PropertyValue};

named_enum! {
    /// Horizontal alignment.
    pub enum HorizontalAlign {
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

named_enum! {
    /// Vertical alignment.
    pub enum VerticalAlign {
        Top => "top",
        Middle => "middle",
        Bottom => "bottom",
    }
}

named_enum! {
    /// How a texture fills the area it is drawn into.
    pub enum ScaleMode {
        Stretch => "stretch",
        ScaleFit => "scale_fit",
        ScaleFill => "scale_fill",
        Tiled => "tiled",
    }
}

/// Style properties set at one cascade level. `None` means "inherit".
#[derive(Debug, Clone, Default)]
pub struct StyleFragment {
    /// `Some(None)` explicitly clears the background.
    pub background: Option<Option<Arc<TextureRegion>>>,
    pub background_border: Option<Border>,
    pub background_scale_mode: Option<ScaleMode>,
    pub margin: Option<Border>,
    pub fixed_width: Option<i32>,
    pub fixed_height: Option<i32>,
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub align_horizontal: Option<HorizontalAlign>,
    pub align_vertical: Option<VerticalAlign>,
    pub texture_scale_mode: Option<ScaleMode>,
    pub font: Option<Arc<BitmapFont>>,
    pub text_color: Option<Color>,
    pub text_shadow_color: Option<Color>,
    pub hint_text_color: Option<Color>,
    pub text_align_horizontal: Option<HorizontalAlign>,
    pub text_align_vertical: Option<VerticalAlign>,
    pub text_shadowed: Option<bool>,
    pub text_underlined: Option<bool>,
}

macro_rules! merge_fields {
    ($target:ident, $other:ident; $($field:ident),+ $(,)?) => {
        $(
            if $other.$field.is_some() {
                $target.$field = $other.$field.clone();
            }
        )+
    };
}

macro_rules! apply_fields {
    ($style:ident, $fragment:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$fragment.$field {
                $style.$field = value.clone();
            }
        )+
    };
}

impl StyleFragment {
    pub fn is_empty(&self) -> bool {
        self.background.is_none()
            && self.background_border.is_none()
            && self.background_scale_mode.is_none()
            && self.margin.is_none()
            && self.fixed_width.is_none()
            && self.fixed_height.is_none()
            && self.min_width.is_none()
            && self.min_height.is_none()
            && self.max_width.is_none()
            && self.max_height.is_none()
            && self.align_horizontal.is_none()
            && self.align_vertical.is_none()
            && self.texture_scale_mode.is_none()
            && self.font.is_none()
            && self.text_color.is_none()
            && self.text_shadow_color.is_none()
            && self.hint_text_color.is_none()
            && self.text_align_horizontal.is_none()
            && self.text_align_vertical.is_none()
            && self.text_shadowed.is_none()
            && self.text_underlined.is_none()
    }

    /// Overwrite every property `other` sets.
    pub fn merge(&mut self, other: &StyleFragment) {
        merge_fields!(self, other;
            background, background_border, background_scale_mode, margin,
            fixed_width, fixed_height, min_width, min_height, max_width, max_height,
            align_horizontal, align_vertical, texture_scale_mode, font,
            text_color, text_shadow_color, hint_text_color,
            text_align_horizontal, text_align_vertical, text_shadowed, text_underlined,
        );
    }

    /// Apply the set properties on top of a resolved style.
    pub fn apply_to(&self, style: &mut UiStyle) {
        apply_fields!(style, self;
            background, background_border, background_scale_mode, margin,
            fixed_width, fixed_height, min_width, min_height, max_width, max_height,
            align_horizontal, align_vertical, texture_scale_mode,
            text_color, text_shadow_color, hint_text_color,
            text_align_horizontal, text_align_vertical, text_shadowed, text_underlined,
        );
        if let Some(font) = &self.font {
            style.font = Some(font.clone());
        }
    }
}

/// A fully resolved style: every property has a value.
#[derive(Debug, Clone)]
pub struct UiStyle {
    pub background: Option<Arc<TextureRegion>>,
    pub background_border: Border,
    pub background_scale_mode: ScaleMode,
    pub margin: Border,
    /// `0` means "not fixed".
    pub fixed_width: i32,
    pub fixed_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub align_horizontal: HorizontalAlign,
    pub align_vertical: VerticalAlign,
    pub texture_scale_mode: ScaleMode,
    /// `None` until a skin provides one.
    pub font: Option<Arc<BitmapFont>>,
    pub text_color: Color,
    pub text_shadow_color: Color,
    pub hint_text_color: Color,
    pub text_align_horizontal: HorizontalAlign,
    pub text_align_vertical: VerticalAlign,
    pub text_shadowed: bool,
    pub text_underlined: bool,
}

impl Default for UiStyle {
    fn default() -> Self {
        Self {
            background: None,
            background_border: Border::ZERO,
            background_scale_mode: ScaleMode::Stretch,
            margin: Border::ZERO,
            fixed_width: 0,
            fixed_height: 0,
            min_width: 0,
            min_height: 0,
            max_width: i32::MAX,
            max_height: i32::MAX,
            align_horizontal: HorizontalAlign::Center,
            align_vertical: VerticalAlign::Middle,
            texture_scale_mode: ScaleMode::Stretch,
            font: None,
            text_color: Color::WHITE,
            text_shadow_color: Color::BLACK,
            hint_text_color: Color::rgba(0.5, 0.5, 0.5, 1.0),
            text_align_horizontal: HorizontalAlign::Center,
            text_align_vertical: VerticalAlign::Middle,
            text_shadowed: false,
            text_underlined: false,
        }
    }
}

/// A style property as written in skin files.
///
/// `name` is the camelCase key, `serialized_name` the kebab-case spelling;
/// both are accepted.
pub type StyleField = FieldDescriptor<StyleFragment>;

macro_rules! style_field {
    ($name:literal, $kebab:literal, $ty:expr, |$fragment:ident, $value:ident| $body:expr) => {
        StyleField::new($name, $ty).serialized_as($kebab).with_assign(
            |$fragment: &mut StyleFragment, $value: PropertyValue| -> Result<(), PropertyError> {
                $body;
                Ok(())
            },
        )
    };
}

static STYLE_FIELDS: LazyLock<Vec<StyleField>> = LazyLock::new(|| {
    vec![
        style_field!("background", "background", FieldType::OptionalTexture, |f, v| {
            f.background = Some(v.into_optional_texture()?)
        }),
        style_field!("backgroundBorder", "background-border", FieldType::Border, |f, v| {
            f.background_border = Some(v.into_border()?)
        }),
        style_field!(
            "backgroundScaleMode",
            "background-scale-mode",
            FieldType::enumeration::<ScaleMode>(),
            |f, v| f.background_scale_mode = Some(v.into_enum()?)
        ),
        style_field!("margin", "margin", FieldType::Border, |f, v| {
            f.margin = Some(v.into_border()?)
        }),
        style_field!("fixedWidth", "fixed-width", FieldType::Int, |f, v| {
            f.fixed_width = Some(v.into_int()?)
        }),
        style_field!("fixedHeight", "fixed-height", FieldType::Int, |f, v| {
            f.fixed_height = Some(v.into_int()?)
        }),
        style_field!("minWidth", "min-width", FieldType::Int, |f, v| {
            f.min_width = Some(v.into_int()?)
        }),
        style_field!("minHeight", "min-height", FieldType::Int, |f, v| {
            f.min_height = Some(v.into_int()?)
        }),
        style_field!("maxWidth", "max-width", FieldType::Int, |f, v| {
            f.max_width = Some(v.into_int()?)
        }),
        style_field!("maxHeight", "max-height", FieldType::Int, |f, v| {
            f.max_height = Some(v.into_int()?)
        }),
        style_field!(
            "alignHorizontal",
            "align-horizontal",
            FieldType::enumeration::<HorizontalAlign>(),
            |f, v| f.align_horizontal = Some(v.into_enum()?)
        ),
        style_field!(
            "alignVertical",
            "align-vertical",
            FieldType::enumeration::<VerticalAlign>(),
            |f, v| f.align_vertical = Some(v.into_enum()?)
        ),
        style_field!(
            "textureScaleMode",
            "texture-scale-mode",
            FieldType::enumeration::<ScaleMode>(),
            |f, v| f.texture_scale_mode = Some(v.into_enum()?)
        ),
        style_field!("font", "font", FieldType::Font, |f, v| {
            f.font = Some(v.into_font()?)
        }),
        style_field!("textColor", "text-color", FieldType::Color, |f, v| {
            f.text_color = Some(v.into_color()?)
        }),
        style_field!("textShadowColor", "text-shadow-color", FieldType::Color, |f, v| {
            f.text_shadow_color = Some(v.into_color()?)
        }),
        style_field!("hintTextColor", "hint-text-color", FieldType::Color, |f, v| {
            f.hint_text_color = Some(v.into_color()?)
        }),
        style_field!(
            "textAlignHorizontal",
            "text-align-horizontal",
            FieldType::enumeration::<HorizontalAlign>(),
            |f, v| f.text_align_horizontal = Some(v.into_enum()?)
        ),
        style_field!(
            "textAlignVertical",
            "text-align-vertical",
            FieldType::enumeration::<VerticalAlign>(),
            |f, v| f.text_align_vertical = Some(v.into_enum()?)
        ),
        style_field!("textShadowed", "text-shadowed", FieldType::Bool, |f, v| {
            f.text_shadowed = Some(v.into_bool()?)
        }),
        style_field!("textUnderlined", "text-underlined", FieldType::Bool, |f, v| {
            f.text_underlined = Some(v.into_bool()?)
        }),
    ]
});

/// Every style property a skin may set.
pub fn style_fields() -> &'static [StyleField] {
    &STYLE_FIELDS
}

/// Style property by either spelling of its key.
pub fn style_field(key: &str) -> Option<&'static StyleField> {
    style_fields()
        .iter()
        .find(|field| field.name == key || field.key() == key)
}
