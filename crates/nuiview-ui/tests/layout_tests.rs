use std::sync::Arc;

use nuiview_assets::{
    AssetResolver, AssetResult, BitmapFont, FontLoader, ImageLoader, MemoryProject, ModuleResolver,
    ModuleScanOptions, TextureRegion, TypedAssets,
};
use nuiview_core::Color;
use nuiview_ui::widgets::{ColumnLayout, UiButton, UiImage, UiLabel};
use nuiview_ui::{
    AssetContext, CorePlugin, DiagnosticKind, LayoutLoader, LayoutWriter, SharedRegistry, SkinAssets,
    UiSkin, Widget, WidgetBase, WidgetClass, WidgetClassRegistry,
};
use serde_json::json;

/// An in-memory project with an engine and a menu module.
struct Fixture {
    project: Arc<MemoryProject>,
    registry: SharedRegistry,
    images: TypedAssets<ImageLoader>,
    fonts: TypedAssets<FontLoader>,
    skins: SkinAssets,
}

impl Fixture {
    fn new() -> Self {
        let project = Arc::new(MemoryProject::new("/project"));
        project.insert("engine/module.json", r#"{"id": "engine"}"#);
        project.insert("engine/images/box.png", png(4, 2));
        project.insert(
            "engine/skins/default.skin",
            r#"{"families": {"UIButton": {"elements": {"default": {"textColor": "FFFFFFFF"}}}}}"#,
        );
        project.insert("menu/module.json", r#"{"id": "menu"}"#);
        project.insert(
            "menu/ui/menu.skin",
            r#"{"inherit": "engine:default", "elements": {"FancyLabel": {"textColor": "FF0000FF"}}}"#,
        );

        let modules = Arc::new(ModuleResolver::scanned(project.clone(), ModuleScanOptions::default()));
        let resolver = Arc::new(AssetResolver::new(modules));

        let mut registry = WidgetClassRegistry::new();
        registry.add_plugin(&CorePlugin);

        Self {
            project,
            registry: SharedRegistry::new(registry),
            images: TypedAssets::new(resolver.clone(), ImageLoader),
            fonts: TypedAssets::new(resolver.clone(), FontLoader),
            skins: SkinAssets::new(resolver),
        }
    }

    /// Register a `FancyLabel` class contributed by the menu module.
    fn add_fancy_label(&self) {
        self.registry.update(|registry| {
            let Some(label) = registry.lookup("UILabel").cloned() else {
                return;
            };
            let fancy = WidgetClass::builder("FancyLabel")
                .extends(&label)
                .constructor::<FancyLabel>()
                .build();
            registry.register_alias("menu:FancyLabel", fancy);
        });
    }
}

impl AssetContext for Fixture {
    fn registry(&self) -> Arc<WidgetClassRegistry> {
        self.registry.snapshot()
    }

    fn texture(&self, urn: &str) -> AssetResult<Arc<TextureRegion>> {
        self.images.get(&(), "", urn)
    }

    fn font(&self, urn: &str) -> AssetResult<Arc<BitmapFont>> {
        self.fonts.get(&(), "", urn)
    }

    fn skin(&self, module_context: &str, urn: &str) -> AssetResult<Arc<UiSkin>> {
        self.skins.get(self, module_context, urn)
    }
}

#[derive(Debug, Default)]
struct FancyLabel {
    base: WidgetBase,
}

impl Widget for FancyLabel {
    fn base(&self) -> Option<&WidgetBase> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut WidgetBase> {
        Some(&mut self.base)
    }

    fn debug_name(&self) -> &'static str {
        "FancyLabel"
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

const MENU_LAYOUT: &str = r#"{
    "type": "ColumnLayout",
    "id": "root",
    "columns": 2,
    "skin": "menu",
    "contents": [
        {"type": "UILabel", "id": "title", "text": "Main Menu"},
        {"type": "Unknown123"},
        {"type": "UIImage", "image": "box", "tint": [0.5, 0.5, 0.5, 1.0]},
        {"type": "Unknown123", "text": "again"},
        {"type": "UIButton", "id": "play", "text": "Play", "family": "primary"},
        "Version 1.0"
    ]
}"#;

#[test]
fn test_menu_layout_loads_with_missing_types() {
    let fixture = Fixture::new();
    let load = LayoutLoader::new(&fixture)
        .with_module_context("menu")
        .load_str(MENU_LAYOUT, "menu.ui")
        .unwrap();

    let root = load.root.expect("root should build");
    let layout = root.downcast_ref::<ColumnLayout>().unwrap();
    assert_eq!(layout.columns, 2);
    assert_eq!(root.base().and_then(|b| b.skin.as_ref()).map(|s| s.name()), Some("menu:menu"));

    let children = root.as_layout().unwrap().children();
    let names: Vec<_> = children.iter().map(|c| c.widget.debug_name()).collect();
    assert_eq!(names, ["UILabel", "UIImage", "UIButton", "UILabel"]);

    let image = children[1].widget.downcast_ref::<UiImage>().unwrap();
    let texture = image.image.as_ref().unwrap();
    assert_eq!(texture.size().x, 4);
    assert_eq!(texture.urn().to_string(), "engine:box");
    assert_eq!(image.tint, Color::rgba(0.5, 0.5, 0.5, 1.0));

    let missing: Vec<_> = load.diagnostics.missing_types.iter().map(String::as_str).collect();
    assert_eq!(missing, ["Unknown123"]);
}

#[test]
fn test_find_by_id_and_style() {
    let fixture = Fixture::new();
    let load = LayoutLoader::new(&fixture)
        .with_module_context("menu")
        .load_str(MENU_LAYOUT, "menu.ui")
        .unwrap();
    let root = load.root.unwrap();
    let layout = root.as_layout().unwrap();

    let play = layout.find_by_id("play").unwrap();
    assert_eq!(play.downcast_ref::<UiButton>().unwrap().text, "Play");
    assert_eq!(play.family(), Some("primary"));

    let title = layout.find_by_id("title").unwrap();
    assert_eq!(title.downcast_ref::<UiLabel>().unwrap().text, "Main Menu");

    let skin = fixture.skin("", "engine:default").unwrap();
    let registry = fixture.registry();
    let button = registry.lookup("UIButton").unwrap();
    assert_eq!(skin.style("UIButton", Some(button.as_ref()), "", "").text_color, Color::WHITE);
}

#[test]
fn test_module_classes_and_skin_cache_follow_registry() {
    let fixture = Fixture::new();
    let layout = json!({"type": "FancyLabel", "text": "fancy"});

    let before = LayoutLoader::new(&fixture)
        .with_module_context("menu")
        .load_value(&layout);
    assert!(before.root.is_none());
    assert!(before.diagnostics.missing_types.contains("FancyLabel"));

    // The menu skin styles FancyLabel, which is not registered yet.
    let skin = fixture.skin("menu", "menu").unwrap();
    assert_eq!(skin.fragment_count(), 1);

    fixture.add_fancy_label();

    let after = LayoutLoader::new(&fixture)
        .with_module_context("menu")
        .load_value(&layout);
    let root = after.root.unwrap();
    assert_eq!(root.debug_name(), "FancyLabel");
    // Inherited fields without a matching setter target fail individually.
    assert_eq!(after.diagnostics.of_kind(DiagnosticKind::PropertyFailed).count(), 1);

    let skin = fixture.skin("menu", "menu").unwrap();
    let registry = fixture.registry();
    let fancy = registry.lookup("menu:FancyLabel").unwrap();
    assert_eq!(skin.style("", Some(fancy.as_ref()), "", "").text_color, Color::RED);
}

#[test]
fn test_edited_texture_reloads() {
    let fixture = Fixture::new();
    let layout = json!({"type": "UIImage", "image": "box"});

    let first = LayoutLoader::new(&fixture).load_value(&layout).root.unwrap();
    fixture.project.insert("engine/images/box.png", png(8, 8));
    let second = LayoutLoader::new(&fixture).load_value(&layout).root.unwrap();

    let width = |widget: &dyn Widget| {
        widget.downcast_ref::<UiImage>().unwrap().image.as_ref().unwrap().width()
    };
    assert_eq!(width(first.as_ref()), 4);
    assert_eq!(width(second.as_ref()), 8);
}

#[test]
fn test_written_layout_loads_back_identically() {
    let fixture = Fixture::new();
    let loader = LayoutLoader::new(&fixture).with_module_context("menu");
    let first = loader.load_str(MENU_LAYOUT, "menu.ui").unwrap().root.unwrap();

    let registry = fixture.registry();
    let writer = LayoutWriter::new(&registry);
    let written = writer.to_value(first.as_ref()).unwrap();

    assert_eq!(written["type"], "ColumnLayout");
    assert_eq!(written["skin"], "menu:menu");
    assert_eq!(written["contents"][1]["image"], "engine:box");
    assert_eq!(written["contents"][3], json!({"type": "UILabel", "text": "Version 1.0"}));

    let second = loader.load_value(&written);
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
    let rewritten = writer.to_value(second.root.unwrap().as_ref()).unwrap();
    assert_eq!(written, rewritten);
}
