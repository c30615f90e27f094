//! Packages installed into GOBIN.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::Backend;
use super::artifact::ArtifactDir;
use crate::collector::Gathered;
use crate::package::Pkg;
use crate::runtime::{RealRuntime, Runtime};

/// The executables `go install` has placed into the configured GOBIN.
pub struct Installed<R: Runtime = RealRuntime> {
    artifacts: ArtifactDir<R>,
}

impl<R: Runtime + 'static> Installed<R> {
    pub fn new(runtime: Arc<R>, gobin: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: ArtifactDir::new(runtime, gobin.into(), "Installed"),
        }
    }

    pub fn gobin(&self) -> &Path {
        self.artifacts.dir()
    }
}

#[async_trait]
impl<R: Runtime + 'static> Backend for Installed<R> {
    async fn lookup(&self, path: &str) -> Result<Pkg> {
        self.artifacts.lookup(path).await
    }

    async fn search(&self, query: &str) -> Gathered<Pkg> {
        self.artifacts.search(query).await
    }
}
