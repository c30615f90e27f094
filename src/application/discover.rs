//! Search, then annotate each hit with what is installed.

use log::debug;

use super::Resolver;
use crate::collector::Collector;
use crate::error::MultiError;
use crate::package::{Pkg, suffix_filter, versions_match};

/// How a search hit relates to the installed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    /// Nothing installed under this name, or a different program is.
    NotInstalled,
    UpToDate,
    /// Installed at an older (or at least different) version.
    Stale { installed: String },
    /// The installed store could not be read, or the hit has no version
    /// to compare against.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub pkg: Pkg,
    pub state: InstallState,
}

impl Candidate {
    fn classify(pkg: Pkg, installed: &Pkg) -> Self {
        let state = if installed.path != pkg.path || !installed.has_version() {
            InstallState::NotInstalled
        } else if !pkg.has_version() {
            InstallState::Unknown
        } else if versions_match(&installed.version, &pkg.version) {
            InstallState::UpToDate
        } else {
            InstallState::Stale {
                installed: installed.version.clone(),
            }
        };
        Self { pkg, state }
    }
}

/// Search results sorted by path, with every error met on the way.
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<Candidate>,
    pub errors: MultiError,
}

impl Resolver {
    /// Search the index for `query` and annotate each hit with its install
    /// state. A failed annotation marks that hit [`InstallState::Unknown`]
    /// and is reported in [`Discovery::errors`]; it never drops the hit.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self, query: &str) -> Discovery {
        let (found, search_errors) = {
            let gathered = self.index.search(query).await;
            (gathered.values, gathered.errors)
        };
        let found = suffix_filter(found, query);
        debug!("{} candidates for {:?}", found.len(), query);

        let mut collector = Collector::new(found.len()).with_limit(self.jobs);
        for pkg in found {
            let installed = self.installed.clone();
            collector.spawn(move |sink| async move {
                match installed.lookup(&pkg.path).await {
                    Ok(current) => sink.value(Candidate::classify(pkg, &current)).await,
                    Err(e) => {
                        let context = format!("Failed to check installed version of {}", pkg.path);
                        sink.value(Candidate {
                            pkg,
                            state: InstallState::Unknown,
                        })
                        .await;
                        sink.error(e.context(context)).await;
                    }
                }
            });
        }

        let gathered = collector.drain().await;
        let mut candidates = gathered.values;
        candidates.sort_by(|a, b| a.pkg.cmp(&b.pkg));

        let mut errors = search_errors;
        errors.extend(gathered.errors);
        Discovery { candidates, errors }
    }
}
