//! Reinstall commands that have a newer version.

use std::io::Write;

use anyhow::{Result, bail};
use log::info;

use crate::application::Resolver;
use crate::error::MultiError;
use crate::package::Pkg;

use super::install::Installer;
use super::report;

/// Install the catalog version of every outdated command, or only of those
/// whose name ends with `name`. One failed install does not stop the rest.
#[tracing::instrument(skip(resolver, installer, out))]
pub async fn update(
    resolver: &Resolver,
    installer: &dyn Installer,
    name: Option<&str>,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let reconciliation = resolver.reconcile(name.unwrap_or_default()).await;
    report(&reconciliation.errors);

    if reconciliation.checks.is_empty() {
        match name {
            Some(name) => bail!("No installed command matches {:?}", name),
            None => {
                writeln!(out, "No commands installed.")?;
                return Ok(());
            }
        }
    }

    let updates: Vec<Pkg> = reconciliation
        .updates()
        .filter_map(|check| Some(Pkg::new(check.installed.path.clone(), check.latest()?)))
        .collect();
    if updates.is_empty() {
        writeln!(out, "Everything is up-to-date.")?;
        return Ok(());
    }
    info!("{} commands to update", updates.len());

    let mut failures = MultiError::new();
    for pkg in updates {
        writeln!(out, "$ go install {}", pkg)?;
        if let Err(e) = installer.install(&pkg).await {
            failures.push(e.context(format!("Failed to update {}", pkg.path)));
        }
    }
    failures.into_result()?;
    Ok(())
}
