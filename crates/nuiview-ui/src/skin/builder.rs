//! Incremental skin construction.

use std::sync::Arc;

use nuiview_core::alloc::HashMap;

use crate::class::WidgetClass;
use crate::skin::{StyleFragment, StyleKey, UiSkin};

/// Builds a [`UiSkin`] one cascade level at a time.
///
/// Selecting a level resets every more specific selector: a new family
/// clears the element, part and mode; a new element clears part and mode;
/// a new part clears the mode.
#[derive(Debug, Default)]
pub struct SkinBuilder {
    name: String,
    base: Option<Arc<UiSkin>>,
    fragments: HashMap<StyleKey, StyleFragment>,
    current: StyleKey,
}

impl SkinBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_base_skin(&mut self, skin: Arc<UiSkin>) {
        self.base = Some(skin);
    }

    pub fn set_family(&mut self, family: &str) {
        self.current = StyleKey::new(family, None, "", "");
    }

    /// Select an element of the current family; `None` selects the
    /// family-wide styles.
    pub fn set_element(&mut self, class: Option<&WidgetClass>) {
        self.current.element = class.map(|c| c.name().to_lowercase());
        self.current.part.clear();
        self.current.mode.clear();
    }

    pub fn set_element_part(&mut self, part: &str) {
        self.current.part = part.to_string();
        self.current.mode.clear();
    }

    pub fn set_element_mode(&mut self, mode: &str) {
        self.current.mode = mode.to_string();
    }

    /// Merge `fragment` into the currently selected level.
    pub fn set_style_fragment(&mut self, fragment: &StyleFragment) {
        if fragment.is_empty() {
            return;
        }
        self.fragments
            .entry(self.current.clone())
            .or_default()
            .merge(fragment);
    }

    pub fn build(self) -> UiSkin {
        let mut fragments = match &self.base {
            Some(base) => base.fragments.clone(),
            None => HashMap::default(),
        };
        for (key, fragment) in self.fragments {
            fragments.entry(key).or_default().merge(&fragment);
        }

        UiSkin {
            name: self.name,
            base: self.base,
            fragments,
        }
    }
}
