//! Install a command found through search.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use crate::application::{Candidate, Resolver};
use crate::package::Pkg;

use super::report;

/// Puts a package version into GOBIN.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, pkg: &Pkg) -> Result<()>;
}

/// Installs by running `go install path@version`.
pub struct GoInstaller {
    go: PathBuf,
    gobin: PathBuf,
}

impl GoInstaller {
    pub fn new(gobin: impl Into<PathBuf>) -> Self {
        Self {
            go: PathBuf::from("go"),
            gobin: gobin.into(),
        }
    }

    /// Use a specific go binary instead of the one on PATH.
    pub fn with_go(mut self, go: impl Into<PathBuf>) -> Self {
        self.go = go.into();
        self
    }
}

#[async_trait]
impl Installer for GoInstaller {
    #[tracing::instrument(skip(self))]
    async fn install(&self, pkg: &Pkg) -> Result<()> {
        let target = if pkg.has_version() {
            pkg.clone()
        } else {
            pkg.latest()
        };
        debug!("Running {} install {}", self.go.display(), target);

        let status = Command::new(&self.go)
            .arg("install")
            .arg(target.to_string())
            .env("GOBIN", &self.gobin)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.go.display()))?;

        if !status.success() {
            bail!("go install {} failed: {}", target, status);
        }
        info!("Installed {} into {}", target, self.gobin.display());
        Ok(())
    }
}

/// Search for `name` and install the single matching command.
///
/// An exact path match wins over other suffix matches. Several remaining
/// matches are an error listing them.
#[tracing::instrument(skip(resolver, installer, out))]
pub async fn install(
    resolver: &Resolver,
    installer: &dyn Installer,
    name: &str,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let discovery = resolver.discover(name).await;
    let candidates = discovery.candidates;

    let chosen: Vec<&Candidate> = match candidates.iter().find(|c| c.pkg.path == name) {
        Some(exact) => vec![exact],
        None => candidates.iter().collect(),
    };

    let pkg = match chosen.as_slice() {
        [] => {
            if !discovery.errors.is_empty() {
                return Err(anyhow::Error::new(discovery.errors)
                    .context(format!("Search for {:?} failed", name)));
            }
            bail!("No commands found matching {:?}", name);
        }
        [one] => {
            report(&discovery.errors);
            if one.pkg.has_version() {
                one.pkg.clone()
            } else {
                one.pkg.latest()
            }
        }
        many => {
            report(&discovery.errors);
            let listing: Vec<String> = many.iter().map(|c| format!("  {}", c.pkg.path)).collect();
            bail!(
                "{} commands match {:?}, install one by its full path:\n{}",
                many.len(),
                name,
                listing.join("\n")
            );
        }
    };

    writeln!(out, "$ go install {}", pkg)?;
    installer.install(&pkg).await
}
