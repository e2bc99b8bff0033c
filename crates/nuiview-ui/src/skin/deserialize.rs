//! Skin deserialization.
//!
//! A skin document nests style levels:
//!
//! ```json
//! {
//!   "textColor": "FFFFFFFF",
//!   "inherit": "engine:default",
//!   "families": {
//!     "title": {
//!       "elements": {
//!         "UILabel": {
//!           "modes": { "disabled": { "textColor": "808080FF" } },
//!           "parts": { "box": { "background": "frame", "modes": { "hover": {} } } }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Each level's own style keys apply before its children; only nesting depth
//! decides specificity. An element named `default` styles the family itself.

use std::sync::Arc;

use nuiview_core::profiling::profile_function;
use serde_json::{Map, Value};

use crate::class::WidgetClass;
use crate::convert::{AssetContext, ValueConverter};
use crate::diagnostics::{DiagnosticKind, Diagnostics, child_path};
use crate::error::{PropertyError, SkinError, json_kind};
use crate::registry::WidgetClassRegistry;
use crate::skin::{SkinBuilder, StyleFragment, UiSkin, style_field};

/// Element name selecting the family-wide styles.
pub const DEFAULT_ELEMENT: &str = "default";

const ROOT_KEYS: [&str; 3] = ["inherit", "families", "elements"];
const FAMILY_KEYS: [&str; 1] = ["elements"];
const ELEMENT_KEYS: [&str; 2] = ["modes", "parts"];
const PART_KEYS: [&str; 1] = ["modes"];

/// A built skin and the problems met while building it.
#[derive(Debug)]
pub struct SkinLoad {
    pub skin: UiSkin,
    pub diagnostics: Diagnostics,
}

/// Builds [`UiSkin`]s from JSON.
pub struct SkinDeserializer<'a> {
    assets: &'a dyn AssetContext,
    registry: Arc<WidgetClassRegistry>,
    module_context: String,
    name: String,
}

impl<'a> SkinDeserializer<'a> {
    pub fn new(assets: &'a dyn AssetContext) -> Self {
        Self {
            registry: assets.registry(),
            assets,
            module_context: String::new(),
            name: String::new(),
        }
    }

    /// Module element names and `inherit` are resolved in.
    pub fn with_module_context(mut self, module_context: impl Into<String>) -> Self {
        self.module_context = module_context.into();
        self
    }

    pub fn with_registry(mut self, registry: Arc<WidgetClassRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Name given to the built skin.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn load_str(&self, text: &str, origin: &str) -> Result<SkinLoad, SkinError> {
        let value: Value = serde_json::from_str(text).map_err(|e| SkinError::from_json(&e, origin))?;
        self.load_value(&value, origin)
    }

    pub fn load_value(&self, value: &Value, origin: &str) -> Result<SkinLoad, SkinError> {
        profile_function!();

        let Some(root) = value.as_object() else {
            return Err(SkinError::NotAnObject {
                origin: origin.to_string(),
            });
        };

        let mut state = SkinState {
            deserializer: self,
            origin,
            builder: SkinBuilder::new(),
            diagnostics: Diagnostics::new(),
        };
        state.builder.set_name(self.name.clone());
        state.root(root);

        Ok(SkinLoad {
            skin: state.builder.build(),
            diagnostics: state.diagnostics,
        })
    }
}

struct SkinState<'s, 'a> {
    deserializer: &'s SkinDeserializer<'a>,
    origin: &'s str,
    builder: SkinBuilder,
    diagnostics: Diagnostics,
}

impl SkinState<'_, '_> {
    fn root(&mut self, root: &Map<String, Value>) {
        if let Some(inherit) = root.get("inherit") {
            self.inherit(inherit);
        }

        self.builder.set_family("");
        self.apply_style(root, &ROOT_KEYS, "");
        if let Some(elements) = self.section(root, "elements", "") {
            self.elements("", elements, "elements");
        }

        if let Some(families) = self.section(root, "families", "") {
            for (family, value) in families {
                let path = child_path("families", family);
                let Some(object) = self.object(value, &path) else {
                    continue;
                };
                self.builder.set_family(family);
                self.apply_style(object, &FAMILY_KEYS, &path);
                if let Some(elements) = self.section(object, "elements", &path) {
                    self.elements(family, elements, &child_path(&path, "elements"));
                }
            }
        }
    }

    fn inherit(&mut self, inherit: &Value) {
        let Some(urn) = inherit.as_str() else {
            self.report(
                DiagnosticKind::UnresolvedInherit,
                "inherit",
                format!("'inherit' must be a string, found {}", json_kind(inherit)),
            );
            return;
        };

        let deserializer = self.deserializer;
        match deserializer.assets.skin(&deserializer.module_context, urn) {
            Ok(base) => self.builder.set_base_skin(base),
            Err(err) => self.report(
                DiagnosticKind::UnresolvedInherit,
                "inherit",
                format!("base skin '{}' unavailable, building without it: {}", urn, err),
            ),
        }
    }

    fn elements(&mut self, family: &str, elements: &Map<String, Value>, path: &str) {
        for (name, value) in elements {
            let element_path = child_path(path, name);
            let Some(object) = self.object(value, &element_path) else {
                continue;
            };

            let class = if name.eq_ignore_ascii_case(DEFAULT_ELEMENT) {
                None
            } else {
                match self.resolve_class(name) {
                    Some(class) => Some(class),
                    None => {
                        self.report(
                            DiagnosticKind::UnresolvedElement,
                            &element_path,
                            format!("no widget class '{}', skipping its styles", name),
                        );
                        continue;
                    }
                }
            };

            self.builder.set_family(family);
            self.builder.set_element(class.as_deref());
            self.apply_style(object, &ELEMENT_KEYS, &element_path);

            if let Some(modes) = self.section(object, "modes", &element_path) {
                self.modes(modes, &child_path(&element_path, "modes"));
            }
            if let Some(parts) = self.section(object, "parts", &element_path) {
                let parts_path = child_path(&element_path, "parts");
                for (part, value) in parts {
                    let part_path = child_path(&parts_path, part);
                    let Some(object) = self.object(value, &part_path) else {
                        continue;
                    };
                    self.builder.set_element_part(part);
                    self.apply_style(object, &PART_KEYS, &part_path);
                    if let Some(modes) = self.section(object, "modes", &part_path) {
                        self.modes(modes, &child_path(&part_path, "modes"));
                    }
                }
                self.builder.set_element_part("");
            }
        }
    }

    /// Modes of the currently selected element or part.
    fn modes(&mut self, modes: &Map<String, Value>, path: &str) {
        for (mode, value) in modes {
            let mode_path = child_path(path, mode);
            let Some(object) = self.object(value, &mode_path) else {
                continue;
            };
            self.builder.set_element_mode(mode);
            self.apply_style(object, &[], &mode_path);
        }
        self.builder.set_element_mode("");
    }

    /// Parse the style keys of one level and merge them into the builder.
    fn apply_style(&mut self, object: &Map<String, Value>, structural: &[&str], path: &str) {
        let deserializer = self.deserializer;
        let converter = ValueConverter::new(deserializer.assets, &deserializer.module_context);
        let mut fragment = StyleFragment::default();

        for (key, json) in object {
            if structural.contains(&key.as_str()) {
                continue;
            }
            let key_path = child_path(path, key);
            let Some(field) = style_field(key) else {
                self.report(
                    DiagnosticKind::UnknownField,
                    &key_path,
                    format!("unknown style property '{}'", key),
                );
                continue;
            };
            let Some((value_type, apply)) = field.write_target() else {
                continue;
            };

            let result = converter
                .convert(value_type, json, None)
                .and_then(|value| apply(&mut fragment, value));
            if let Err(err) = result {
                self.property_failed(&key_path, err);
            }
        }

        self.builder.set_style_fragment(&fragment);
    }

    fn resolve_class(&self, name: &str) -> Option<Arc<WidgetClass>> {
        let deserializer = self.deserializer;
        let registry = &deserializer.registry;
        if name.contains(':') {
            registry.lookup(name).cloned()
        } else {
            registry.lookup_in(&deserializer.module_context, name).cloned()
        }
    }

    /// A nested map under `key`, if present and an object.
    fn section<'v>(&mut self, object: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v Map<String, Value>> {
        let value = object.get(key)?;
        self.object(value, &child_path(path, key))
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.report(
                DiagnosticKind::InvalidNode,
                path,
                format!("expected an object, found {}", json_kind(value)),
            );
        }
        object
    }

    fn property_failed(&mut self, path: &str, err: PropertyError) {
        tracing::error!("{}: failed to set {}: {}", self.origin, path, err);
        self.diagnostics
            .push(DiagnosticKind::PropertyFailed, path, err.to_string());
    }

    fn report(&mut self, kind: DiagnosticKind, path: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}: {}: {}", self.origin, path, message);
        self.diagnostics.push(kind, path, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::CorePlugin;
    use crate::skin::{HorizontalAlign, style::UiStyle};
    use nuiview_assets::{AssetError, AssetResult, BitmapFont, TextureRegion};
    use nuiview_core::Color;
    use serde_json::json;

    struct TestAssets {
        registry: Arc<WidgetClassRegistry>,
        base: Option<Arc<UiSkin>>,
    }

    impl TestAssets {
        fn new() -> Self {
            let mut registry = WidgetClassRegistry::new();
            registry.add_plugin(&CorePlugin);
            Self {
                registry: Arc::new(registry),
                base: None,
            }
        }
    }

    impl AssetContext for TestAssets {
        fn registry(&self) -> Arc<WidgetClassRegistry> {
            self.registry.clone()
        }

        fn texture(&self, urn: &str) -> AssetResult<Arc<TextureRegion>> {
            Err(AssetError::NotFound { urn: urn.to_string() })
        }

        fn font(&self, urn: &str) -> AssetResult<Arc<BitmapFont>> {
            Err(AssetError::NotFound { urn: urn.to_string() })
        }

        fn skin(&self, module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>> {
            self.base.clone().ok_or_else(|| AssetError::NotFound {
                urn: format!("{}:{}", module_context, urn),
            })
        }
    }

    fn load(assets: &TestAssets, value: Value) -> SkinLoad {
        SkinDeserializer::new(assets)
            .with_module_context("engine")
            .load_value(&value, "test.skin")
            .unwrap()
    }

    fn style(assets: &TestAssets, skin: &UiSkin, family: &str, class: &str, part: &str, mode: &str) -> UiStyle {
        let class = assets.registry.lookup(class).unwrap();
        skin.style(family, Some(class.as_ref()), part, mode)
    }

    #[test]
    fn test_default_element_styles_family() {
        let assets = TestAssets::new();
        let result = load(
            &assets,
            json!({"families": {"UIButton": {"elements": {"default": {"textColor": "FFFFFFFF"}}}}}),
        );
        assert!(result.diagnostics.is_empty());
        let resolved = style(&assets, &result.skin, "UIButton", "UIButton", "", "");
        assert_eq!(resolved.text_color, Color::WHITE);
        assert_eq!(result.skin.style("UIButton", None, "", "").text_color, Color::WHITE);
    }

    #[test]
    fn test_cascade_specificity() {
        let assets = TestAssets::new();
        let result = load(
            &assets,
            json!({
                "textColor": "000000FF",
                "families": {
                    "menu": {
                        "textColor": "FF0000FF",
                        "elements": {
                            "UIButton": {
                                "textColor": "00FF00FF",
                                "parts": {
                                    "box": {
                                        "modes": {"hover": {"textColor": "0000FFFF"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }),
        );
        let skin = &result.skin;

        assert_eq!(skin.style("", None, "", "").text_color, Color::BLACK);
        assert_eq!(skin.style("menu", None, "", "").text_color, Color::RED);
        assert_eq!(style(&assets, skin, "menu", "UIButton", "", "").text_color, Color::GREEN);
        assert_eq!(style(&assets, skin, "menu", "UIButton", "box", "").text_color, Color::GREEN);
        assert_eq!(style(&assets, skin, "menu", "UIButton", "box", "hover").text_color, Color::BLUE);
        assert_eq!(style(&assets, skin, "menu", "UILabel", "box", "hover").text_color, Color::RED);
    }

    #[test]
    fn test_ancestor_element_applies_to_subclasses() {
        let assets = TestAssets::new();
        let result = load(
            &assets,
            json!({"elements": {"CoreWidget": {"min-width": 12, "textAlignHorizontal": "LEFT"}}}),
        );
        let resolved = style(&assets, &result.skin, "", "UILabel", "", "");
        assert_eq!(resolved.min_width, 12);
        assert_eq!(resolved.text_align_horizontal, HorizontalAlign::Left);
    }

    #[test]
    fn test_unresolved_element_skips_subtree() {
        let assets = TestAssets::new();
        let result = load(
            &assets,
            json!({"families": {"menu": {"elements": {
                "NoSuchWidget": {"textColor": "FF0000FF", "modes": {"hover": {"textColor": "00FF00FF"}}},
                "UILabel": {"textColor": "0000FFFF"}
            }}}}),
        );
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::UnresolvedElement).count(), 1);
        assert_eq!(style(&assets, &result.skin, "menu", "UILabel", "", "").text_color, Color::BLUE);
        assert_eq!(result.skin.fragment_count(), 1);
    }

    #[test]
    fn test_bad_values_are_skipped_individually() {
        let assets = TestAssets::new();
        let result = load(&assets, json!({"textColor": "purple", "minWidth": 3, "glow": true}));
        let resolved = result.skin.style("", None, "", "");
        assert_eq!(resolved.text_color, Color::WHITE);
        assert_eq!(resolved.min_width, 3);
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::PropertyFailed).count(), 1);
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::UnknownField).count(), 1);
    }

    #[test]
    fn test_inherit() {
        let mut assets = TestAssets::new();
        let base = load(&assets, json!({"textColor": "FF0000FF", "minHeight": 7})).skin;
        assets.base = Some(Arc::new(base));

        let result = load(&assets, json!({"inherit": "parent", "textColor": "00FF00FF"}));
        let resolved = result.skin.style("", None, "", "");
        assert_eq!(resolved.text_color, Color::GREEN);
        assert_eq!(resolved.min_height, 7);
        assert!(result.skin.base().is_some());
    }

    #[test]
    fn test_missing_inherit_builds_without_base() {
        let assets = TestAssets::new();
        let result = load(&assets, json!({"inherit": "gone", "textColor": "00FF00FF"}));
        assert!(result.skin.base().is_none());
        assert_eq!(result.skin.style("", None, "", "").text_color, Color::GREEN);
        let unresolved: Vec<_> = result.diagnostics.of_kind(DiagnosticKind::UnresolvedInherit).collect();
        assert_eq!(unresolved.len(), 1);
        assert!(unresolved[0].message.contains("engine:gone"));
    }

    #[test]
    fn test_not_an_object() {
        let assets = TestAssets::new();
        let err = SkinDeserializer::new(&assets)
            .load_value(&json!([1, 2]), "list.skin")
            .unwrap_err();
        assert!(matches!(err, SkinError::NotAnObject { .. }));
    }
}
