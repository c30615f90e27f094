//! A directory of Go executables, each describing itself through its
//! embedded build info.

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{debug, trace};

use crate::buildinfo;
use crate::collector::Gathered;
use crate::error::is_not_found;
use crate::package::{self, Pkg};
use crate::runtime::Runtime;

pub(super) struct ArtifactDir<R: Runtime> {
    runtime: Arc<R>,
    dir: PathBuf,
    label: &'static str,
}

impl<R: Runtime + 'static> ArtifactDir<R> {
    pub fn new(runtime: Arc<R>, dir: PathBuf, label: &'static str) -> Self {
        Self {
            runtime,
            dir,
            label,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the executable named after the last segment of `path`.
    ///
    /// A missing executable is not an error: the requested path comes back
    /// with an empty version.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn lookup(&self, path: &str) -> Result<Pkg> {
        let name = package::base(path);
        if name.is_empty() {
            bail!("{} lookup needs a package path, got {:?}", self.label, path);
        }
        let file = self.dir.join(format!("{}{}", name, EXE_SUFFIX));
        let runtime = self.runtime.clone();

        let read = tokio::task::spawn_blocking(move || read_pkg(runtime.as_ref(), &file))
            .await
            .context("Artifact reader task failed")?;

        match read {
            Ok(pkg) => Ok(pkg),
            Err(e) if is_not_found(&e) => {
                debug!("{} has no {}, treating {} as absent", self.label, name, path);
                Ok(Pkg::unversioned(path))
            }
            Err(e) => Err(e.context(format!("{} lookup of {:?} failed", self.label, path))),
        }
    }

    /// Read every executable whose file name ends with `query`.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn search(&self, query: &str) -> Gathered<Pkg> {
        let runtime = self.runtime.clone();
        let dir = self.dir.clone();
        let query = query.to_string();
        let label = self.label;

        let scan = tokio::task::spawn_blocking(move || scan(runtime.as_ref(), &dir, &query)).await;
        match scan {
            Ok(gathered) => gathered,
            Err(e) => Gathered::failed(
                anyhow::Error::new(e).context(format!("{} scan task failed", label)),
            ),
        }
    }
}

fn scan<R: Runtime + ?Sized>(runtime: &R, dir: &Path, query: &str) -> Gathered<Pkg> {
    let mut entries = match runtime.read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_not_found(&e) => {
            debug!("{} does not exist, nothing installed", dir.display());
            return Gathered::default();
        }
        Err(e) => return Gathered::failed(e),
    };
    entries.sort();

    let mut gathered = Gathered::default();
    for entry in entries {
        let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let name = file_name.strip_suffix(EXE_SUFFIX).unwrap_or(file_name);
        if !name.ends_with(query) || runtime.is_dir(&entry) {
            continue;
        }
        trace!("Reading build info from {}", entry.display());
        match read_pkg(runtime, &entry) {
            Ok(pkg) => gathered.values.push(pkg),
            Err(e) => gathered.errors.push(e),
        }
    }
    gathered
}

fn read_pkg<R: Runtime + ?Sized>(runtime: &R, file: &Path) -> Result<Pkg> {
    let bytes = runtime.read(file)?;
    let info = buildinfo::read(&bytes)
        .with_context(|| format!("Failed to read build info from {}", file.display()))?;
    if info.path.is_empty() {
        bail!("{} records no package path", file.display());
    }
    Ok(Pkg::new(info.path, info.main.version))
}
