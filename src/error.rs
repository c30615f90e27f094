//! Error types shared across backends and the resolution engine.

use std::fmt;

use reqwest::StatusCode;

use crate::http::HttpError;

/// A package (or any of its ancestor paths) has no resolvable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub path: String,
}

impl NotFound {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not found: {:?}", self.path)
    }
}

impl std::error::Error for NotFound {}

/// Zero or more errors collected from a fan-out.
///
/// No member suppresses another: every pushed error stays visible in
/// [`MultiError::iter`] and in the `Display` output (one per line).
/// Pushing a `MultiError` flattens it instead of nesting.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<anyhow::Error>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: anyhow::Error) {
        match error.downcast::<MultiError>() {
            Ok(multi) => self.errors.extend(multi.errors),
            Err(error) => self.errors.push(error),
        }
    }

    pub fn extend(&mut self, other: MultiError) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.errors.iter()
    }

    /// Joining zero errors yields no error.
    pub fn into_result(self) -> Result<(), MultiError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:#}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl From<anyhow::Error> for MultiError {
    fn from(error: anyhow::Error) -> Self {
        let mut multi = MultiError::new();
        multi.push(error);
        multi
    }
}

impl FromIterator<anyhow::Error> for MultiError {
    fn from_iter<I: IntoIterator<Item = anyhow::Error>>(iter: I) -> Self {
        let mut multi = MultiError::new();
        for error in iter {
            multi.push(error);
        }
        multi
    }
}

impl IntoIterator for MultiError {
    type Item = anyhow::Error;
    type IntoIter = std::vec::IntoIter<anyhow::Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Whether an error chain denotes absence rather than failure.
///
/// Recognises HTTP 404, [`NotFound`], and a missing file.
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(http) = cause.downcast_ref::<HttpError>() {
            return http.status == StatusCode::NOT_FOUND;
        }
        if cause.is::<NotFound>() {
            return true;
        }
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use reqwest::Method;

    #[test]
    fn test_empty_multi_error_is_no_error() {
        assert!(MultiError::new().into_result().is_ok());
        let collected: MultiError = Vec::<anyhow::Error>::new().into_iter().collect();
        assert!(collected.into_result().is_ok());
    }

    #[test]
    fn test_multi_error_keeps_every_member() {
        let mut multi = MultiError::new();
        multi.push(anyhow!("first"));
        multi.push(anyhow!("second"));
        assert_eq!(multi.len(), 2);
        assert_eq!(multi.to_string(), "first\nsecond");
    }

    #[test]
    fn test_multi_error_flattens_nested() {
        let inner: MultiError = vec![anyhow!("a"), anyhow!("b")].into_iter().collect();
        let mut outer = MultiError::new();
        outer.push(anyhow!("c"));
        outer.push(anyhow::Error::from(inner));
        assert_eq!(outer.len(), 3);
    }

    #[test]
    fn test_multi_error_display_includes_context() {
        let err = Err::<(), _>(anyhow!("boom"))
            .context("Installed.search(\"x\")")
            .unwrap_err();
        let multi = MultiError::from(err);
        assert_eq!(multi.to_string(), "Installed.search(\"x\"): boom");
    }

    #[test]
    fn test_is_not_found_http_404() {
        let err = anyhow::Error::from(HttpError::new(
            Method::GET,
            "https://example.com/x",
            StatusCode::NOT_FOUND,
        ))
        .context("RemoteCatalog.lookup(\"x\")");
        assert!(is_not_found(&err));

        let err = anyhow::Error::from(HttpError::new(
            Method::GET,
            "https://example.com/x",
            StatusCode::INTERNAL_SERVER_ERROR,
        ));
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_is_not_found_marker_and_io() {
        assert!(is_not_found(&anyhow::Error::from(NotFound::new("a/b"))));
        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(is_not_found(&anyhow::Error::from(io).context("reading")));
        assert!(!is_not_found(&anyhow!("connection reset")));
    }
}
