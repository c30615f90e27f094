//! File system access.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn read_impl(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_dir_impl(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)
            .with_context(|| format!("Failed to list {}", path.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list {}", path.display()))?;
        entries.sort();
        Ok(entries)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::is_not_found;
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_read_and_list() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let b = dir.path().join("b-tool");
        let a = dir.path().join("a-tool");
        std::fs::write(&b, b"hello").unwrap();
        std::fs::write(&a, b"").unwrap();

        assert!(!rt.is_dir(&b));
        assert!(rt.is_dir(dir.path()));
        assert_eq!(rt.read(&b).unwrap(), b"hello");
        assert_eq!(rt.read_dir(dir.path()).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_missing_paths_are_not_found() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();

        let err = rt.read(&dir.path().join("missing")).unwrap_err();
        assert!(is_not_found(&err));

        let err = rt.read_dir(&dir.path().join("missing-dir")).unwrap_err();
        assert!(is_not_found(&err));

        let err = rt.remove(&dir.path().join("missing")).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_remove_file() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, b"").unwrap();

        rt.remove(&file).unwrap();
        assert!(!file.exists());
    }
}
