//! Integration tests for module and asset resolution.
//!
//! These tests use tempfile to create isolated on-disk projects.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nuiview_assets::*;

// ============================================================================
// Test Asset Types
// ============================================================================

/// A simple test config asset.
#[derive(Debug, Clone, PartialEq)]
struct TestConfig {
    name: String,
    value: i32,
}

/// Loader for test config files (simple "name:value" format).
struct TestConfigLoader;

impl AssetLoader for TestConfigLoader {
    type Asset = TestConfig;
    type Env = ();

    fn extensions(&self) -> &[&str] {
        &["cfg", "config"]
    }

    fn load(&self, ctx: LoadContext<'_>, _env: &()) -> Result<Self::Asset, AssetError> {
        let text = std::str::from_utf8(ctx.bytes)
            .map_err(|e| ctx.error(format!("Invalid UTF-8: {}", e)))?;

        let mut name = String::new();
        let mut value = 0;

        for line in text.lines() {
            let line = line.trim();
            if let Some((key, val)) = line.split_once(':') {
                match key.trim() {
                    "name" => name = val.trim().to_string(),
                    "value" => value = val.trim().parse().unwrap_or(0),
                    _ => {}
                }
            }
        }

        Ok(TestConfig { name, value })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn write(root: &Path, relative: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn sample_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "engine/module.txt", r#"{"id": "engine", "version": "5.0.0"}"#);
    write(root, "engine/assets/configs/main.cfg", "name: main\nvalue: 1");
    write(root, "modules/Menu/module.json", r#"{"id": "Menu"}"#);
    write(root, "modules/Menu/assets/menu.config", "name: menu\nvalue: 2");
    write(root, "modules/Menu/build/resources/module.txt", r#"{"id": "MenuCopy"}"#);
    write(root, "modules/Broken/module.info", "{ this is not json");
    dir
}

fn resolver_for(root: &Path) -> Arc<AssetResolver> {
    let project = Arc::new(DiskProject::new(root));
    let modules = Arc::new(ModuleResolver::scanned(project, ModuleScanOptions::default()));
    Arc::new(AssetResolver::new(modules))
}

// ============================================================================
// Module Resolution
// ============================================================================

#[test]
fn test_modules_discovered_on_disk() {
    let dir = sample_project();
    let resolver = resolver_for(dir.path());
    let index = resolver.modules().snapshot();

    assert_eq!(index.len(), 3);
    assert!(index.get("engine").is_some());
    assert!(index.get("menu").is_some());
    assert!(index.get("menucopy").is_none());
    assert_eq!(index.root("broken"), Some(dir.path().join("modules/Broken").as_path()));
}

#[test]
fn test_resolve_module_for_file() {
    let dir = sample_project();
    let resolver = resolver_for(dir.path());
    let modules = resolver.modules();

    let file = dir.path().join("modules/Menu/assets/ui/main.ui");
    assert_eq!(modules.resolve_module(&file), Some("Menu".to_string()));
    assert_eq!(modules.resolve_module(Path::new("engine/x.ui")), Some("engine".to_string()));
}

// ============================================================================
// Typed Loading
// ============================================================================

#[test]
fn test_typed_load_across_modules() {
    let dir = sample_project();
    let configs = TypedAssets::new(resolver_for(dir.path()), TestConfigLoader);

    let main = configs.get(&(), "menu", "engine:main").unwrap();
    assert_eq!(*main, TestConfig { name: "main".into(), value: 1 });

    // Second extension.
    let menu = configs.get(&(), "Menu", "menu").unwrap();
    assert_eq!(menu.value, 2);
}

#[test]
fn test_cache_recomputes_after_modification() {
    let dir = sample_project();
    let configs = TypedAssets::new(resolver_for(dir.path()), TestConfigLoader);

    let first = configs.get(&(), "engine", "main").unwrap();
    let second = configs.get(&(), "engine", "main").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // Make sure the modification time differs even on coarse filesystems.
    thread::sleep(Duration::from_millis(20));
    write(dir.path(), "engine/assets/configs/main.cfg", "name: main\nvalue: 42");

    let third = configs.get(&(), "engine", "main").unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.value, 42);
}

#[test]
fn test_namespaces_do_not_collide() {
    let dir = sample_project();
    write(dir.path(), "engine/assets/images/main.png", png(2, 2));
    let resolver = resolver_for(dir.path());

    let configs = TypedAssets::new(resolver.clone(), TestConfigLoader);
    let images = TypedAssets::new(resolver, ImageLoader);

    assert_eq!(configs.get(&(), "engine", "main").unwrap().name, "main");
    assert_eq!(images.get(&(), "engine", "main").unwrap().width(), 2);
}

#[test]
fn test_duplicate_asset_is_not_found() {
    let dir = sample_project();
    write(dir.path(), "engine/assets/other/main.cfg", "name: copy");
    let configs = TypedAssets::new(resolver_for(dir.path()), TestConfigLoader);

    let err = configs.get(&(), "engine", "main").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_malformed_urn_is_a_failure_not_a_panic() {
    let dir = sample_project();
    let configs = TypedAssets::new(resolver_for(dir.path()), TestConfigLoader);

    assert!(matches!(
        configs.get(&(), "engine", "engine:main#"),
        Err(AssetError::MalformedUrn { .. })
    ));
}

#[test]
fn test_font_with_page_image() {
    let dir = sample_project();
    write(dir.path(), "engine/assets/fonts/default.png", png(8, 8));
    write(
        dir.path(),
        "engine/assets/fonts/default.font",
        "info face=\"Default\" size=8\n\
         common lineHeight=10 base=8 pages=1\n\
         page id=0 file=\"default.png\"\n\
         chars count=1\n\
         char id=32 x=0 y=0 width=0 height=0 xoffset=0 yoffset=0 xadvance=4 page=0 chnl=0\n",
    );
    let fonts = TypedAssets::new(resolver_for(dir.path()), FontLoader);

    let font = fonts.get(&(), "engine", "default").unwrap();
    assert_eq!(font.line_height(), 10);
    assert_eq!(font.width("  "), 8);
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
