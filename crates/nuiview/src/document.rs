//! Previewed documents.
//!
//! A document rebuilds its content from scratch on every reload. Reloads may
//! finish out of order when run on a task pool; each takes a generation
//! number when it starts, and a result is dropped once a later-started
//! reload has been applied.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_executor::Task;
use nuiview_core::profiling::{self, profile_function};
use nuiview_ui::{AssetContext, Diagnostics, LayoutLoad, SkinLoad, UiSkin, Widget};
use parking_lot::Mutex;

use crate::service::PreviewService;
use crate::task_pool::TaskPool;

/// What kind of file a document previews, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Layout,
    Skin,
}

impl DocumentKind {
    /// `.skin` files are skins; everything else is treated as a layout.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("skin") => DocumentKind::Skin,
            _ => DocumentKind::Layout,
        }
    }
}

/// Built content of a document.
#[derive(Debug)]
pub enum PreviewContent {
    Layout(Box<dyn Widget>),
    Skin(Arc<UiSkin>),
}

impl PreviewContent {
    pub fn root(&self) -> Option<&dyn Widget> {
        match self {
            PreviewContent::Layout(root) => Some(root.as_ref()),
            PreviewContent::Skin(_) => None,
        }
    }

    pub fn skin(&self) -> Option<&Arc<UiSkin>> {
        match self {
            PreviewContent::Skin(skin) => Some(skin),
            PreviewContent::Layout(_) => None,
        }
    }
}

/// Outcome of one reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    /// The new content replaced the previous one.
    Applied,
    /// The text did not parse; the previous content stays, with an overlay.
    Failed,
    /// A newer reload was applied first; this result was dropped.
    Superseded,
}

/// Result of building a document, before it is applied.
#[derive(Debug)]
pub struct BuildResult {
    generation: u64,
    outcome: Result<(Option<PreviewContent>, Diagnostics), String>,
}

#[derive(Debug, Default)]
struct DocumentState {
    /// Generation of the last applied result, 0 before the first.
    applied: u64,
    content: Option<PreviewContent>,
    diagnostics: Diagnostics,
    overlay: Option<String>,
}

/// One previewed layout or skin file.
pub struct PreviewDocument {
    service: Arc<PreviewService>,
    path: PathBuf,
    kind: DocumentKind,
    module_context: String,
    next_generation: AtomicU64,
    state: Mutex<DocumentState>,
}

impl PreviewDocument {
    /// Document for `path`, previewed in the module that contains it.
    pub fn new(service: Arc<PreviewService>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let module_context = service.module_for(&path);
        tracing::debug!("Previewing {} in module '{}'", path.display(), module_context);

        Self {
            kind: DocumentKind::from_path(&path),
            service,
            path,
            module_context,
            next_generation: AtomicU64::new(1),
            state: Mutex::new(DocumentState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn module_context(&self) -> &str {
        &self.module_context
    }

    /// Rebuild from `text` on the calling thread.
    pub fn reload(&self, text: &str) -> ReloadStatus {
        let build = self.build(text);
        self.apply(build)
    }

    /// Rebuild from `text` on `pool`.
    ///
    /// The generation is taken now, so of two overlapping reloads the one
    /// started later wins even if it finishes first.
    pub fn reload_on(self: &Arc<Self>, pool: &TaskPool, text: String) -> Task<ReloadStatus> {
        let generation = self.next_generation();
        let document = self.clone();
        pool.spawn_blocking(move || {
            let build = document.build_generation(generation, &text);
            document.apply(build)
        })
    }

    /// Build content from `text` without applying it.
    pub fn build(&self, text: &str) -> BuildResult {
        self.build_generation(self.next_generation(), text)
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::AcqRel)
    }

    fn build_generation(&self, generation: u64, text: &str) -> BuildResult {
        profile_function!();
        profiling::new_frame();

        let origin = self.path.display().to_string();
        let outcome = match self.kind {
            DocumentKind::Layout => self
                .service
                .layout_loader(&self.module_context)
                .load_str(text, &origin)
                .map(|LayoutLoad { root, diagnostics }| (root.map(PreviewContent::Layout), diagnostics))
                .map_err(|e| e.to_string()),
            DocumentKind::Skin => self
                .service
                .skin_deserializer(&self.module_context)
                .with_name(self.skin_name())
                .load_str(text, &origin)
                .map(|SkinLoad { skin, diagnostics }| {
                    (Some(PreviewContent::Skin(Arc::new(skin))), diagnostics)
                })
                .map_err(|e| e.to_string()),
        };

        BuildResult { generation, outcome }
    }

    /// Apply a build unless a newer one was applied already.
    pub fn apply(&self, build: BuildResult) -> ReloadStatus {
        let mut state = self.state.lock();
        if build.generation <= state.applied {
            tracing::debug!(
                "Dropping reload {} of {}, {} already applied",
                build.generation,
                self.path.display(),
                state.applied
            );
            return ReloadStatus::Superseded;
        }
        state.applied = build.generation;

        match build.outcome {
            Ok((content, diagnostics)) => {
                if !diagnostics.missing_types.is_empty() {
                    tracing::info!(
                        "{}: {} unknown widget types",
                        self.path.display(),
                        diagnostics.missing_types.len()
                    );
                }
                state.content = content;
                state.diagnostics = diagnostics;
                state.overlay = None;
                ReloadStatus::Applied
            }
            Err(message) => {
                tracing::warn!("Keeping previous preview of {}: {}", self.path.display(), message);
                state.overlay = Some(message);
                ReloadStatus::Failed
            }
        }
    }

    /// Run `f` with the current content.
    pub fn with_content<R>(&self, f: impl FnOnce(Option<&PreviewContent>) -> R) -> R {
        let state = self.state.lock();
        f(state.content.as_ref())
    }

    /// Diagnostics of the last applied reload that parsed.
    pub fn diagnostics(&self) -> Diagnostics {
        self.state.lock().diagnostics.clone()
    }

    /// Unknown widget type names, in first-seen order.
    pub fn missing_types(&self) -> Vec<String> {
        self.state.lock().diagnostics.missing_types.iter().cloned().collect()
    }

    /// Modules that declare one of the missing types and may need building.
    pub fn required_modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .missing_types()
            .iter()
            .flat_map(|name| self.service.modules_declaring(name))
            .collect();
        modules.sort();
        modules.dedup();
        modules
    }

    /// Error text shown over the previous content after a failed reload.
    pub fn overlay(&self) -> Option<String> {
        self.state.lock().overlay.clone()
    }

    /// The skin the preview is drawn with: the root widget's own skin, the
    /// skin itself for skin documents, else the service default.
    pub fn effective_skin(&self) -> Option<Arc<UiSkin>> {
        let own = self.with_content(|content| match content? {
            PreviewContent::Skin(skin) => Some(skin.clone()),
            PreviewContent::Layout(root) => root.base()?.skin.clone(),
        });
        own.or_else(|| self.service.default_skin())
    }

    fn skin_name(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        format!("{}:{}", self.module_context, stem)
    }

    /// Registry used for this document's classes.
    pub fn registry(&self) -> Arc<nuiview_ui::WidgetClassRegistry> {
        self.service.registry()
    }
}
