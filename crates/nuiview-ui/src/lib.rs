//! nuiview UI - widget classes, layout deserialization and skins
//!
//! This crate turns layout and skin documents into live objects:
//! - A registry of widget classes, each describing its configurable fields
//! - A best-effort layout deserializer that reports problems as diagnostics
//! - A cascading skin model resolved by family, element, part and mode
//! - A layout writer producing JSON from widget trees
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! # use nuiview_ui::{LayoutLoader, AssetContext};
//! # fn preview(assets: &dyn AssetContext) -> Result<(), nuiview_ui::LayoutError> {
//! let load = LayoutLoader::new(assets)
//!     .with_module_context("menu")
//!     .load_str(r#"{"type": "UILabel", "text": "Hi"}"#, "hello.ui")?;
//!
//! for missing in &load.diagnostics.missing_types {
//!     println!("unknown widget type {missing}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod class;
pub mod convert;
pub mod deserialize;
pub mod diagnostics;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod schema;
pub mod skin;
pub mod widget;
pub mod widgets;
pub mod writer;

pub use class::{ClassCapabilities, HintField, HintSchema, WidgetClass, WidgetClassBuilder, WidgetField};
pub use convert::{AssetContext, DEFAULT_ASSET_MODULE, ValueConverter};
pub use deserialize::LayoutLoader;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, LayoutLoad};
pub use error::{LayoutError, PropertyError, SkinError};
pub use plugin::{ClassSource, CorePlugin, DiscoveredClass, StaticClassSource, WidgetPlugin};
pub use registry::{SharedRegistry, WidgetClassRegistry};
pub use schema::{FieldDescriptor, FieldType, NamedEnum, PropertyValue};
pub use skin::{SkinAssets, SkinBuilder, SkinDeserializer, SkinLoad, SkinLoader, UiSkin, UiStyle};
pub use widget::{LayoutChild, LayoutHint, LayoutWidget, Widget, WidgetBase};
pub use writer::LayoutWriter;
