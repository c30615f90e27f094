//! List installed commands and whether they are current.

use std::io::Write;

use anyhow::Result;

use crate::application::{Resolver, UpdateState};

use super::report;

#[tracing::instrument(skip(resolver, out))]
pub async fn list(resolver: &Resolver, out: &mut (dyn Write + Send)) -> Result<()> {
    let reconciliation = resolver.reconcile("").await;
    report(&reconciliation.errors);

    if reconciliation.checks.is_empty() {
        writeln!(out, "No commands installed.")?;
        return Ok(());
    }

    for check in &reconciliation.checks {
        let pkg = &check.installed;
        match &check.state {
            UpdateState::UpToDate => writeln!(out, "{} (already up-to-date)", pkg)?,
            UpdateState::UpdateAvailable { latest } => {
                writeln!(out, "{} (update available: {})", pkg, latest)?
            }
            UpdateState::Unknown => writeln!(out, "{}", pkg)?,
        }
    }
    Ok(())
}
