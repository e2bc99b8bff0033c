//! Preview configuration.

use std::path::{Path, PathBuf};

use nuiview_assets::ModuleScanOptions;
use nuiview_assets::module::DEFAULT_EXCLUDE_DIRS;
use nuiview_assets::MANIFEST_NAMES;
use nuiview_ui::DEFAULT_ASSET_MODULE;
use serde::Deserialize;

/// Errors reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings for a [`PreviewService`](crate::PreviewService).
///
/// Missing keys in a config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// File names marking a module root.
    pub manifest_names: Vec<String>,
    /// Directory names never scanned for manifests.
    pub exclude_dirs: Vec<String>,
    /// Module for files outside any module, and for bare image and font names.
    pub default_module: String,
    /// Skin applied to previews that set none.
    pub default_skin: String,
    pub case_sensitive_assets: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            manifest_names: MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            default_module: DEFAULT_ASSET_MODULE.to_string(),
            default_skin: format!("{}:default", DEFAULT_ASSET_MODULE),
            case_sensitive_assets: false,
        }
    }
}

impl PreviewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_manifest_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_module(mut self, module: impl Into<String>) -> Self {
        self.default_module = module.into();
        self
    }

    pub fn with_default_skin(mut self, urn: impl Into<String>) -> Self {
        self.default_skin = urn.into();
        self
    }

    pub fn with_case_sensitive_assets(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_assets = case_sensitive;
        self
    }

    /// Scan options for the module resolver.
    pub fn scan_options(&self) -> ModuleScanOptions {
        ModuleScanOptions {
            manifest_names: self.manifest_names.clone(),
            exclude_dirs: self.exclude_dirs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert_eq!(config.manifest_names, ["module.txt", "module.json", "module.info"]);
        assert_eq!(config.exclude_dirs, ["build", "out", ".gradle", "target"]);
        assert_eq!(config.default_module, "engine");
        assert_eq!(config.default_skin, "engine:default");
        assert!(!config.case_sensitive_assets);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nuiview.json");
        fs::write(&path, r#"{"default_skin": "menu:dark", "exclude_dirs": ["dist"]}"#).unwrap();

        let config = PreviewConfig::from_path(&path).unwrap();
        assert_eq!(config.default_skin, "menu:dark");
        assert_eq!(config.exclude_dirs, ["dist"]);
        assert_eq!(config.default_module, "engine");
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();
        let missing = PreviewConfig::from_path(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PreviewConfig::from_path(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_builder() {
        let config = PreviewConfig::new()
            .with_manifest_names(["mod.json"])
            .with_default_module("core")
            .with_case_sensitive_assets(true);
        assert_eq!(config.scan_options().manifest_names, ["mod.json"]);
        assert_eq!(config.default_module, "core");
        assert!(config.case_sensitive_assets);
    }
}
