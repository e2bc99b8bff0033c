//! Error types for module and asset resolution.

use std::path::PathBuf;

/// Errors that can occur while resolving or loading an asset.
///
/// Every variant is local to one lookup; callers deserializing a widget tree
/// record it as a diagnostic and keep going.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The identifier is not of the form `module:asset[#fragment][!instance]`.
    #[error("Malformed asset urn '{urn}'")]
    MalformedUrn {
        /// The identifier as written.
        urn: String,
    },

    /// The URN names a module the project index does not know.
    #[error("Unknown module '{module}' for asset '{urn}'")]
    UnknownModule {
        /// Module part of the URN.
        module: String,
        /// The full URN.
        urn: String,
    },

    /// No file in the module matches the asset name and extension.
    #[error("Asset not found: {urn}")]
    NotFound {
        /// The URN (with extension) that was looked up.
        urn: String,
    },

    /// More than one file in the module matches the asset name and extension.
    #[error("Asset '{urn}' is ambiguous: {} files match", matches.len())]
    Ambiguous {
        /// The URN (with extension) that was looked up.
        urn: String,
        /// Every matching file.
        matches: Vec<PathBuf>,
    },

    /// Failed to read asset data from the project.
    #[error("IO error loading '{}': {source}", path.display())]
    Io {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The loader failed to parse/decode the asset.
    #[error("Failed to load '{}': {message}", path.display())]
    LoaderError {
        /// The path being loaded.
        path: PathBuf,
        /// Description of the error.
        message: String,
    },

    /// Loading the asset requested the same asset again.
    #[error("Asset '{urn}' depends on itself")]
    Cycle {
        /// The URN that was requested while still loading.
        urn: String,
    },

    /// A typed loader was configured without any file extension.
    #[error("Loader '{loader}' declares no file extensions")]
    NoExtension {
        /// Loader name.
        loader: &'static str,
    },
}

impl AssetError {
    /// Whether the lookup failed because no single file could be picked.
    ///
    /// Missing and ambiguous matches are both reported to callers as
    /// "asset not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AssetError::NotFound { .. }
                | AssetError::Ambiguous { .. }
                | AssetError::UnknownModule { .. }
                | AssetError::MalformedUrn { .. }
        )
    }
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
