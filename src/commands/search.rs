//! Search for installable commands.

use std::io::Write;

use anyhow::{Result, bail};

use crate::application::{InstallState, Resolver};

use super::report;

/// Print every command matching `name` with its install state.
#[tracing::instrument(skip(resolver, out))]
pub async fn search(resolver: &Resolver, name: &str, out: &mut (dyn Write + Send)) -> Result<()> {
    let discovery = resolver.discover(name).await;
    if discovery.candidates.is_empty() {
        if !discovery.errors.is_empty() {
            return Err(anyhow::Error::new(discovery.errors)
                .context(format!("Search for {:?} failed", name)));
        }
        bail!("No commands found matching {:?}", name);
    }
    report(&discovery.errors);

    for candidate in &discovery.candidates {
        let pkg = &candidate.pkg;
        match &candidate.state {
            InstallState::UpToDate => writeln!(out, "{} (already installed)", pkg)?,
            InstallState::Stale { installed } => {
                writeln!(out, "{} (installed: {})", pkg, installed)?
            }
            InstallState::NotInstalled | InstallState::Unknown => writeln!(out, "{}", pkg)?,
        }
    }
    Ok(())
}
