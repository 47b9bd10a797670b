//! Installed package references and name normalization.

use super::error::PkgError;
use serde::Serialize;

/// Normalize a package name for comparison: lowercase, with `_` folded into `-`.
///
/// `Typing_Extensions`, `typing-extensions` and `typing_extensions` all
/// normalize to `typing-extensions`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '_' { '-' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// A package reported as installed (or declared), identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRef {
    name: String,
    version: Option<String>,
}

impl PackageRef {
    /// Create a reference. The name is trimmed and must not be empty; an empty
    /// version string is treated as absent.
    pub fn new(name: impl Into<String>, version: Option<String>) -> Result<Self, PkgError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(PkgError::name_empty());
        }
        let version = version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(Self { name, version })
    }

    /// Name as reported by the backend or manifest.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Normalized identity, see [`normalize_name`].
    #[must_use]
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether `other` names the same package.
    #[must_use]
    pub fn is_named(&self, other: &str) -> bool {
        self.key() == normalize_name(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_separators() {
        assert_eq!(normalize_name("Typing_Extensions"), "typing-extensions");
        assert_eq!(normalize_name("  PyYAML "), "pyyaml");
        assert_eq!(normalize_name("zope.interface"), "zope.interface");
    }

    #[test]
    fn empty_name_rejected() {
        assert!(PackageRef::new("", None).is_err());
        assert!(PackageRef::new("   ", Some("1.0".into())).is_err());
    }

    #[test]
    fn blank_version_is_absent() {
        let pkg = PackageRef::new("rich", Some("  ".into())).unwrap();
        assert_eq!(pkg.version(), None);
    }

    #[test]
    fn identity_ignores_separator_style() {
        let pkg = PackageRef::new("charset_normalizer", Some("3.3.2".into())).unwrap();
        assert!(pkg.is_named("Charset-Normalizer"));
        assert!(!pkg.is_named("charset"));
        assert_eq!(pkg.name(), "charset_normalizer");
    }
}
