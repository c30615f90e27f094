//! Package identity.
//!
//! A [`Pkg`] names one resolved package by its import path together with a
//! version string. The version is opaque: it may be empty (nothing known or
//! nothing installed) or the `latest` sentinel understood by `go install`.

mod version;

use std::fmt;

pub use version::{LATEST, suffix_filter, versions_match};

/// One resolved package: an import path and an (opaque) version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pkg {
    pub path: String,
    pub version: String,
}

impl Pkg {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// A package with a known path but no known version.
    pub fn unversioned(path: impl Into<String>) -> Self {
        Self::new(path, "")
    }

    /// Trailing path segment, which is also the installed binary name.
    pub fn name(&self) -> &str {
        base(&self.path)
    }

    /// Copy of this package pinned to the `latest` sentinel.
    pub fn latest(&self) -> Pkg {
        Pkg::new(self.path.clone(), LATEST)
    }

    /// True for the zero value returned when a lookup resolved nothing.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }
}

impl fmt::Display for Pkg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}

/// Last `/`-separated segment of a package path.
pub fn base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Parent of a package path, or `None` once no segments remain.
///
/// `"a/b/c"` -> `"a/b"` -> `"a"` -> `None`.
pub fn parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    trimmed.rfind('/').map(|i| &trimmed[..i]).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trailing_segment() {
        let pkg = Pkg::new("golang.org/x/tools/cmd/stringer", "v0.1.0");
        assert_eq!(pkg.name(), "stringer");
        assert_eq!(Pkg::unversioned("gopls").name(), "gopls");
    }

    #[test]
    fn test_latest_forces_sentinel() {
        let pkg = Pkg::new("github.com/foo/bar", "v1.2.0");
        let latest = pkg.latest();
        assert_eq!(latest.path, "github.com/foo/bar");
        assert_eq!(latest.version, "latest");
        // The original is untouched.
        assert_eq!(pkg.version, "v1.2.0");
    }

    #[test]
    fn test_display() {
        let pkg = Pkg::new("github.com/foo/bar", "v1.2.0");
        assert_eq!(pkg.to_string(), "github.com/foo/bar@v1.2.0");
    }

    #[test]
    fn test_empty_and_version_state() {
        assert!(Pkg::default().is_empty());
        let pkg = Pkg::unversioned("a/b");
        assert!(!pkg.is_empty());
        assert!(!pkg.has_version());
    }

    #[test]
    fn test_parent_walks_up() {
        assert_eq!(parent("a/b/c"), Some("a/b"));
        assert_eq!(parent("a/b"), Some("a"));
        assert_eq!(parent("a"), None);
        assert_eq!(parent(""), None);
        assert_eq!(parent("/a"), None);
    }

    #[test]
    fn test_base_ignores_trailing_slash() {
        assert_eq!(base("a/b/"), "b");
        assert_eq!(base(""), "");
    }
}
