//! Compare installed commands with their latest published versions.

use log::debug;

use super::Resolver;
use crate::collector::Collector;
use crate::error::MultiError;
use crate::package::{Pkg, versions_match};

/// Outcome of checking one installed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateState {
    UpToDate,
    UpdateAvailable { latest: String },
    /// The catalog lookup failed or returned no version.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub installed: Pkg,
    pub state: UpdateState,
}

impl Check {
    fn classify(installed: Pkg, remote: &Pkg) -> Self {
        let state = if !remote.has_version() {
            UpdateState::Unknown
        } else if versions_match(&installed.version, &remote.version) {
            UpdateState::UpToDate
        } else {
            UpdateState::UpdateAvailable {
                latest: remote.version.clone(),
            }
        };
        Self { installed, state }
    }

    pub fn latest(&self) -> Option<&str> {
        match &self.state {
            UpdateState::UpdateAvailable { latest } => Some(latest),
            _ => None,
        }
    }
}

/// One check per installed command, sorted by path.
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub checks: Vec<Check>,
    pub errors: MultiError,
}

impl Reconciliation {
    /// Checks with a newer version available.
    pub fn updates(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.latest().is_some())
    }
}

impl Resolver {
    /// Look up every installed command matching `query` (`""` for all) in
    /// the catalog. All lookups run concurrently and every one of them
    /// yields a [`Check`], failed ones as [`UpdateState::Unknown`] next to
    /// their error.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, query: &str) -> Reconciliation {
        let (installed, scan_errors) = {
            let gathered = self.installed.search(query).await;
            (gathered.values, gathered.errors)
        };
        debug!("Checking {} installed commands", installed.len());

        let mut collector = Collector::new(installed.len()).with_limit(self.jobs);
        for pkg in installed {
            let catalog = self.catalog.clone();
            collector.spawn(move |sink| async move {
                match catalog.lookup(&pkg.path).await {
                    Ok(remote) => sink.value(Check::classify(pkg, &remote)).await,
                    Err(e) => {
                        let context = format!("Failed to find the latest version of {}", pkg.path);
                        sink.value(Check {
                            installed: pkg,
                            state: UpdateState::Unknown,
                        })
                        .await;
                        sink.error(e.context(context)).await;
                    }
                }
            });
        }

        let gathered = collector.drain().await;
        let mut checks = gathered.values;
        checks.sort_by(|a, b| a.installed.cmp(&b.installed));

        let mut errors = scan_errors;
        errors.extend(gathered.errors);
        Reconciliation { checks, errors }
    }
}
