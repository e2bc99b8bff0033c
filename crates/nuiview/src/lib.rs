//! nuiview - live preview of NUI layout and skin files
//!
//! Reads `.ui` layout documents and `.skin` style sheets from a multi-module
//! project and builds the widget tree and skin they describe, without
//! running the game they belong to.
//!
//! - **Modules**: project directories with a manifest, scanned once and
//!   rescanned in the background when a manifest changes
//! - **Assets**: textures, bitmap fonts and skins resolved by `module:name`
//! - **Widget classes**: core widgets plus classes contributed by the project
//! - **Documents**: rebuilt on every edit; a syntax error keeps the last tree
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use nuiview::{PreviewConfig, PreviewDocument, PreviewService};
//!
//! let service = Arc::new(PreviewService::open("/path/to/project", PreviewConfig::default()));
//! let document = PreviewDocument::new(service, "/path/to/project/menu/ui/main.ui");
//! document.reload(&std::fs::read_to_string(document.path())?);
//!
//! for name in document.missing_types() {
//!     println!("unknown widget type {}", name);
//! }
//! ```

pub mod config;
pub mod document;
pub mod service;
pub mod task_pool;

pub use nuiview_assets as assets;
pub use nuiview_core as core;
pub use nuiview_ui as ui;

pub use config::{ConfigError, PreviewConfig};
pub use document::{BuildResult, DocumentKind, PreviewContent, PreviewDocument, ReloadStatus};
pub use service::PreviewService;
pub use task_pool::TaskPool;
