//! Package data sources.
//!
//! Every source answers the same two questions: what is the current version
//! of one package path, and which packages match a query. The resolution
//! engine only sees the [`Backend`] trait.
//!
//! # Structure
//!
//! - `artifact` - Directories of Go executables (shared by `installed` and `local`)
//! - `catalog` - deps.dev JSON API
//! - `index` - pkg.go.dev search pages

mod artifact;
mod catalog;
mod index;
mod installed;
mod local;

use anyhow::Result;
use async_trait::async_trait;

use crate::collector::Gathered;
use crate::package::Pkg;

pub use catalog::{DEFAULT_API_URL, DEFAULT_SEARCH_URL, RemoteCatalog};
pub use index::{DEFAULT_INDEX_URL, SearchIndex};
pub use installed::Installed;
pub use local::LocalDir;

/// Source of package metadata.
///
/// Implementations hold configuration only and are shared freely across
/// concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Resolve the version of one package path.
    ///
    /// Absence is reported either as a package with an empty version or as
    /// an error recognised by [`crate::error::is_not_found`], depending on
    /// the source.
    async fn lookup(&self, path: &str) -> Result<Pkg>;

    /// Packages whose path ends with `query`. An empty query matches
    /// everything. Partial failures come back next to partial results.
    async fn search(&self, query: &str) -> Gathered<Pkg>;
}
