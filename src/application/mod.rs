//! Application layer - resolution use cases built on the backends.
//!
//! [`Resolver::discover`] searches for commands and annotates each with its
//! install state. [`Resolver::reconcile`] compares installed commands with
//! the catalog.

mod discover;
mod reconcile;

use std::sync::Arc;

use crate::backend::Backend;

pub use discover::{Candidate, Discovery, InstallState};
pub use reconcile::{Check, Reconciliation, UpdateState};

/// Default number of backend calls a fan-out runs at once.
pub const DEFAULT_JOBS: usize = 16;

/// Resolution engine over three sources: a search index, the installed
/// store and the version catalog.
#[derive(Clone)]
pub struct Resolver {
    index: Arc<dyn Backend>,
    installed: Arc<dyn Backend>,
    catalog: Arc<dyn Backend>,
    jobs: usize,
}

impl Resolver {
    pub fn new(
        index: Arc<dyn Backend>,
        installed: Arc<dyn Backend>,
        catalog: Arc<dyn Backend>,
    ) -> Self {
        Self {
            index,
            installed,
            catalog,
            jobs: DEFAULT_JOBS,
        }
    }

    /// Bound the number of concurrent lookups per operation.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }
}
