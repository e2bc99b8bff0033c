//! Locates the file an asset URN refers to.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AssetError, AssetResult};
use crate::io::{ModificationStamp, ProjectFiles};
use crate::module::ModuleResolver;
use crate::urn::Urn;

/// A URN resolved to exactly one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub urn: Urn,
    pub path: PathBuf,
    pub stamp: Option<ModificationStamp>,
}

/// Resolves `module:asset` identifiers to files inside module directories.
pub struct AssetResolver {
    modules: Arc<ModuleResolver>,
    case_sensitive: bool,
}

impl AssetResolver {
    pub fn new(modules: Arc<ModuleResolver>) -> Self {
        Self {
            modules,
            case_sensitive: false,
        }
    }

    /// Match file names case-sensitively.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn modules(&self) -> &Arc<ModuleResolver> {
        &self.modules
    }

    pub fn project(&self) -> &Arc<dyn ProjectFiles> {
        self.modules.project()
    }

    /// Resolve `urn` with file extension `extension`.
    ///
    /// An unqualified `urn` belongs to `module_context`. The module's whole
    /// subtree is searched for `asset.extension`; the lookup succeeds only if
    /// exactly one file matches.
    pub fn resolve(
        &self,
        module_context: &str,
        urn: &str,
        extension: &str,
    ) -> AssetResult<ResolvedAsset> {
        let qualified = Urn::qualify(module_context, urn);
        let parsed: Urn = qualified.parse()?;

        let root = self
            .modules
            .module_root(parsed.module())
            .ok_or_else(|| AssetError::UnknownModule {
                module: parsed.module().to_string(),
                urn: qualified.clone(),
            })?;

        let asset_name = if self.case_sensitive {
            raw_asset_name(&qualified).unwrap_or(parsed.asset())
        } else {
            parsed.asset()
        };
        let file_name = format!("{}.{}", asset_name, extension);
        let project = self.project();
        let mut matches = project.find_by_name(&root, &file_name, self.case_sensitive);

        match matches.len() {
            0 => Err(AssetError::NotFound {
                urn: format!("{}.{}", parsed.root(), extension),
            }),
            1 => {
                let path = matches.remove(0);
                let stamp = project.stamp(&path);
                Ok(ResolvedAsset {
                    urn: parsed,
                    path,
                    stamp,
                })
            }
            _ => {
                matches.sort();
                tracing::warn!(
                    "Asset '{}.{}' matches {} files, not picking one",
                    parsed.root(),
                    extension,
                    matches.len()
                );
                Err(AssetError::Ambiguous {
                    urn: format!("{}.{}", parsed.root(), extension),
                    matches,
                })
            }
        }
    }
}

/// Asset part of a qualified URN with its original casing.
fn raw_asset_name(qualified: &str) -> Option<&str> {
    let (_, rest) = qualified.split_once(':')?;
    let end = rest.find(['#', '!']).unwrap_or(rest.len());
    Some(&rest[..end])
}
