//! Module discovery and asset resolution for nuiview.
//!
//! A project is a tree of files containing one or more *modules*, each marked
//! by a manifest file. Assets are addressed with URNs of the form
//! `module:asset[#fragment][!instance]` and resolved to the single file named
//! `asset.<extension>` inside that module's directory.
//!
//! ```ignore
//! let project = Arc::new(DiskProject::new("path/to/project"));
//! let modules = Arc::new(ModuleResolver::scanned(project, ModuleScanOptions::default()));
//! let resolver = Arc::new(AssetResolver::new(modules));
//! let images = TypedAssets::new(resolver, ImageLoader);
//! let texture = images.get(&(), "engine", "box")?;
//! ```

pub mod cache;
pub mod error;
pub mod font;
pub mod hot_reload;
pub mod io;
pub mod loader;
pub mod module;
pub mod resolver;
pub mod texture;
pub mod urn;

pub use cache::AssetCache;
pub use error::{AssetError, AssetResult};
pub use font::{BitmapFont, FontCharacter, FontLoader, FontPage};
pub use hot_reload::{ProjectChanges, ProjectWatcher};
pub use io::{DiskProject, MemoryProject, ModificationStamp, ProjectFiles};
pub use loader::{AssetLoader, LoadContext, TypedAssets};
pub use module::{ModuleIndex, ModuleInfo, ModuleResolver, ModuleScanOptions, MANIFEST_NAMES};
pub use resolver::{AssetResolver, ResolvedAsset};
pub use texture::{ImageLoader, TextureRegion};
pub use urn::Urn;
