//! Gestalt-style asset URNs: `module:asset[#fragment][!instance]`.

use std::fmt;
use std::str::FromStr;

use crate::error::AssetError;

const INSTANCE_SUFFIX: &str = "!instance";

/// A parsed asset identifier.
///
/// Module, asset and fragment are stored lower-cased, so two URNs that only
/// differ in case compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Urn {
    module: String,
    asset: String,
    fragment: Option<String>,
    instance: bool,
}

impl Urn {
    /// Create a URN from its module and asset parts.
    pub fn new(module: impl AsRef<str>, asset: impl AsRef<str>) -> Self {
        Self {
            module: module.as_ref().to_lowercase(),
            asset: asset.as_ref().to_lowercase(),
            fragment: None,
            instance: false,
        }
    }

    /// Attach a fragment (`#fragment`).
    pub fn with_fragment(mut self, fragment: impl AsRef<str>) -> Self {
        let fragment = fragment.as_ref();
        self.fragment = (!fragment.is_empty()).then(|| fragment.to_lowercase());
        self
    }

    /// Mark as an instance URN (`!instance`).
    pub fn with_instance(mut self, instance: bool) -> Self {
        self.instance = instance;
        self
    }

    /// Parse a URN, returning `None` for anything that does not match
    /// `module:asset[#fragment][!instance]` in full.
    pub fn parse(text: &str) -> Option<Self> {
        let (module, rest) = text.split_once(':')?;
        if module.is_empty() {
            return None;
        }

        let asset_end = rest.find(['#', '!']).unwrap_or(rest.len());
        let (asset, mut rest) = rest.split_at(asset_end);
        if asset.is_empty() {
            return None;
        }

        let mut fragment = None;
        if let Some(after_hash) = rest.strip_prefix('#') {
            let fragment_end = after_hash.find('!').unwrap_or(after_hash.len());
            let (value, tail) = after_hash.split_at(fragment_end);
            if value.is_empty() {
                return None;
            }
            fragment = Some(value);
            rest = tail;
        }

        let instance = match rest {
            "" => false,
            INSTANCE_SUFFIX => true,
            _ => return None,
        };

        let mut urn = Urn::new(module, asset).with_instance(instance);
        if let Some(fragment) = fragment {
            urn = urn.with_fragment(fragment);
        }
        Some(urn)
    }

    /// Qualify a possibly bare asset name with a module context.
    ///
    /// Anything already containing a `:` is returned unchanged.
    pub fn qualify(module_context: &str, name: &str) -> String {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:{}", module_context, name)
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn is_instance(&self) -> bool {
        self.instance
    }

    /// The URN without fragment or instance marker.
    pub fn root(&self) -> Urn {
        Urn::new(&self.module, &self.asset)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.asset)?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        if self.instance {
            f.write_str(INSTANCE_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for Urn {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urn::parse(s).ok_or_else(|| AssetError::MalformedUrn { urn: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let urn = Urn::parse("Engine:Box").unwrap();
        assert_eq!(urn.module(), "engine");
        assert_eq!(urn.asset(), "box");
        assert_eq!(urn.fragment(), None);
        assert!(!urn.is_instance());
    }

    #[test]
    fn test_parse_fragment_and_instance() {
        let urn = Urn::parse("core:menu#Title!instance").unwrap();
        assert_eq!(urn.fragment(), Some("title"));
        assert!(urn.is_instance());
        assert_eq!(urn.to_string(), "core:menu#title!instance");
    }

    #[test]
    fn test_parse_instance_without_fragment() {
        let urn = Urn::parse("core:menu!instance").unwrap();
        assert_eq!(urn.fragment(), None);
        assert!(urn.is_instance());
    }

    #[test]
    fn test_rejects_malformed() {
        for text in [
            "",
            "engine",
            ":box",
            "engine:",
            "engine:#frag",
            "engine:box#",
            "engine:box!other",
            "engine:box#frag!instance!instance",
        ] {
            assert_eq!(Urn::parse(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in [
            "engine:box",
            "MyModule:Some.Asset#Part",
            "a:b!instance",
            "a:b#c!instance",
            "a:b:c",
        ] {
            let once = Urn::parse(text).unwrap();
            let twice = Urn::parse(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_qualify() {
        assert_eq!(Urn::qualify("engine", "box"), "engine:box");
        assert_eq!(Urn::qualify("engine", "core:box"), "core:box");
    }

    #[test]
    fn test_from_str_error() {
        let err = "nope".parse::<Urn>().unwrap_err();
        assert!(matches!(err, AssetError::MalformedUrn { .. }));
    }
}
