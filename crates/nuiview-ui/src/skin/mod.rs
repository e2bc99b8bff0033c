//! Skins: cascading style resolution by family, element, part and mode.
//!
//! Resolution order, least specific first:
//!
//! 1. the skin root, then the family (no element)
//! 2. element styles of each ancestor class, root class first
//! 3. element styles of the class itself
//!
//! Within one element, the element's own style comes first, then its mode,
//! its part, and finally the part in that mode. At every element level the
//! class-less family styles come before those of the named family.

pub mod builder;
pub mod deserialize;
pub mod loader;
pub mod style;

use std::sync::Arc;

use nuiview_core::alloc::{HashMap, HashSet};
use nuiview_core::profiling::profile_function;

use crate::class::WidgetClass;
use crate::registry::WidgetClassRegistry;
use crate::widget::Widget;

pub use builder::SkinBuilder;
pub use deserialize::{SkinDeserializer, SkinLoad};
pub use loader::{SkinAssets, SkinLoader};
pub use style::{
    HorizontalAlign, ScaleMode, StyleField, StyleFragment, UiStyle, VerticalAlign, style_field,
    style_fields,
};

/// Where in the cascade a fragment applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StyleKey {
    /// `""` for the skin root.
    pub family: String,
    /// Lower-cased widget class name; `None` for family-wide styles.
    pub element: Option<String>,
    pub part: String,
    pub mode: String,
}

impl StyleKey {
    pub fn new(family: &str, element: Option<&str>, part: &str, mode: &str) -> Self {
        Self {
            family: family.to_string(),
            element: element.map(str::to_lowercase),
            part: part.to_string(),
            mode: mode.to_string(),
        }
    }
}

/// A built skin.
#[derive(Debug, Default)]
pub struct UiSkin {
    name: String,
    base: Option<Arc<UiSkin>>,
    /// Own fragments merged over the base skin's.
    fragments: HashMap<StyleKey, StyleFragment>,
}

impl UiSkin {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The skin this one inherits from.
    pub fn base(&self) -> Option<&Arc<UiSkin>> {
        self.base.as_ref()
    }

    pub fn fragment(&self, key: &StyleKey) -> Option<&StyleFragment> {
        self.fragments.get(key)
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Family names with at least one style.
    pub fn families(&self) -> HashSet<&str> {
        self.fragments
            .keys()
            .map(|key| key.family.as_str())
            .filter(|family| !family.is_empty())
            .collect()
    }

    /// Resolve the style for a widget class in a family.
    ///
    /// `class` may be `None` for the family-wide style.
    pub fn style(&self, family: &str, class: Option<&WidgetClass>, part: &str, mode: &str) -> UiStyle {
        profile_function!();

        let mut style = UiStyle::default();

        let mut elements: Vec<Option<String>> = vec![None];
        if let Some(class) = class {
            let mut lineage: Vec<_> = class.lineage().map(|c| Some(c.name().to_lowercase())).collect();
            lineage.reverse();
            elements.extend(lineage);
        }

        let families = if family.is_empty() { vec![""] } else { vec!["", family] };

        let mut levels = vec![("", "")];
        if !mode.is_empty() {
            levels.push(("", mode));
        }
        if !part.is_empty() {
            levels.push((part, ""));
            if !mode.is_empty() {
                levels.push((part, mode));
            }
        }

        for element in &elements {
            for level_family in &families {
                for (level_part, level_mode) in &levels {
                    let key = StyleKey {
                        family: level_family.to_string(),
                        element: element.clone(),
                        part: level_part.to_string(),
                        mode: level_mode.to_string(),
                    };
                    if let Some(fragment) = self.fragments.get(&key) {
                        fragment.apply_to(&mut style);
                    }
                }
            }
        }

        style
    }

    /// Resolve the style for a widget instance, using its family and class.
    pub fn style_for(
        &self,
        widget: &dyn Widget,
        registry: &WidgetClassRegistry,
        part: &str,
        mode: &str,
    ) -> UiStyle {
        let class = registry.class_of(widget);
        self.style(widget.family().unwrap_or(""), class.map(|c| &**c), part, mode)
    }
}
