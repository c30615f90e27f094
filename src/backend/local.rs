//! Executables in an arbitrary directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::Backend;
use super::artifact::ArtifactDir;
use crate::collector::Gathered;
use crate::package::Pkg;
use crate::runtime::{RealRuntime, Runtime};

/// Go executables in a user-supplied directory, read the same way as
/// [`super::Installed`].
pub struct LocalDir<R: Runtime = RealRuntime> {
    artifacts: ArtifactDir<R>,
}

impl<R: Runtime + 'static> LocalDir<R> {
    pub fn new(runtime: Arc<R>, dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: ArtifactDir::new(runtime, dir.into(), "LocalDir"),
        }
    }

    pub fn dir(&self) -> &Path {
        self.artifacts.dir()
    }
}

#[async_trait]
impl<R: Runtime + 'static> Backend for LocalDir<R> {
    async fn lookup(&self, path: &str) -> Result<Pkg> {
        self.artifacts.lookup(path).await
    }

    async fn search(&self, query: &str) -> Gathered<Pkg> {
        self.artifacts.search(query).await
    }
}
