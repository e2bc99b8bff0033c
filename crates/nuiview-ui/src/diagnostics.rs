//! Non-fatal problems collected while loading a layout or skin.

use std::fmt;

use indexmap::IndexSet;

use crate::widget::Widget;

/// Kind of a non-fatal problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A widget `type` matched no registered class.
    MissingType,
    /// A JSON key matched no configurable field.
    UnknownField,
    /// `id` given but the class has no `id` attribute.
    MissingIdField,
    /// Converting or assigning one property failed.
    PropertyFailed,
    /// A node is neither a string nor an object with a `type`.
    InvalidNode,
    /// A child's `layoutInfo` could not be used.
    InvalidHint,
    /// A skin element name matched no widget class.
    UnresolvedElement,
    /// A skin's `inherit` could not be loaded.
    UnresolvedInherit,
}

/// One non-fatal problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Position in the document, e.g. `contents[2].text`.
    pub path: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Diagnostics accumulated during one load.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Unresolved widget type names, each recorded once, in first-seen order.
    pub missing_types: IndexSet<String>,
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, path: &str, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            kind,
            message: message.into(),
            path: path.to_string(),
        });
    }

    /// Record an unresolved type. Returns `false` if it was already known.
    pub fn missing_type(&mut self, name: &str, path: &str) -> bool {
        let first = self.missing_types.insert(name.to_string());
        if first {
            self.push(DiagnosticKind::MissingType, path, format!("unknown widget type '{}'", name));
        }
        first
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.missing_types.is_empty() && self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Result of a layout load: the (possibly partial) tree and what went wrong.
#[derive(Debug, Default)]
pub struct LayoutLoad {
    /// `None` when the root node itself could not be built.
    pub root: Option<Box<dyn Widget>>,
    pub diagnostics: Diagnostics,
}

/// Append a key to a diagnostic path.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Append an index to a diagnostic path.
pub(crate) fn index_path(parent: &str, key: &str, index: usize) -> String {
    format!("{}[{}]", child_path(parent, key), index)
}
