//! Error types for layout and skin loading.

use nuiview_assets::AssetError;

/// Fatal failure of a whole layout load.
///
/// Only malformed JSON at the top level ends up here; per-node problems are
/// reported through [`Diagnostics`](crate::Diagnostics).
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("{origin}:{line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        /// File (or other source) the text came from.
        origin: String,
    },
}

impl LayoutError {
    pub fn from_json(err: &serde_json::Error, origin: &str) -> Self {
        LayoutError::Syntax {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
            origin: origin.to_string(),
        }
    }
}

/// Fatal failure of a whole skin load.
#[derive(Debug, thiserror::Error)]
pub enum SkinError {
    #[error("{origin}:{line}:{column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        origin: String,
    },

    #[error("{origin}: skin must be a JSON object")]
    NotAnObject { origin: String },
}

impl SkinError {
    pub fn from_json(err: &serde_json::Error, origin: &str) -> Self {
        SkinError::Syntax {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
            origin: origin.to_string(),
        }
    }
}

/// Failure to convert or assign a single property.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{0}")]
    InvalidValue(String),

    #[error("unresolved asset '{urn}': {source}")]
    UnresolvedAsset {
        urn: String,
        #[source]
        source: AssetError,
    },

    #[error("property applied to the wrong widget type, expected {expected}")]
    WrongWidget { expected: &'static str },

    #[error("field '{0}' has neither a setter nor a writable field")]
    ReadOnly(&'static str),
}

impl PropertyError {
    pub(crate) fn mismatch(expected: impl ToString, found: &serde_json::Value) -> Self {
        PropertyError::TypeMismatch {
            expected: expected.to_string(),
            found: json_kind(found).to_string(),
        }
    }
}

/// Short description of a JSON value's kind for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"type\": }").unwrap_err();
        let err = LayoutError::from_json(&err, "menu.ui");
        match &err {
            LayoutError::Syntax { line, origin, .. } => {
                assert_eq!(*line, 2);
                assert_eq!(origin, "menu.ui");
            }
        }
        assert!(err.to_string().starts_with("menu.ui:2:"));
    }
}
