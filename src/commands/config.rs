//! Startup configuration.
//!
//! Built once from CLI flags with environment fallbacks, then shared
//! read-only with everything that needs it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;

use crate::application::DEFAULT_JOBS;
use crate::backend::{DEFAULT_API_URL, DEFAULT_INDEX_URL, DEFAULT_SEARCH_URL};
use crate::http::DEFAULT_HEDGE_AFTER;
use crate::runtime::Runtime;

pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Values given on the command line. Anything left `None` falls back to
/// the environment or a default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub gobin: Option<PathBuf>,
    pub catalog_api_url: Option<String>,
    pub catalog_search_url: Option<String>,
    pub index_url: Option<String>,
    pub hedge_after_ms: Option<u64>,
    pub limit: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where `go install` puts executables.
    pub gobin: PathBuf,
    pub catalog_api_url: String,
    pub catalog_search_url: String,
    pub index_url: String,
    /// Delay before a slow request is duplicated.
    pub hedge_after: Duration,
    /// Result count requested from search endpoints.
    pub search_limit: usize,
    /// Timeout of a single request attempt.
    pub timeout: Duration,
    /// Concurrent lookups per operation.
    pub jobs: usize,
}

impl Config {
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let gobin = match overrides.gobin {
            Some(path) => path,
            None => default_gobin(runtime)?,
        };
        debug!("Using GOBIN {}", gobin.display());

        Ok(Self {
            gobin,
            catalog_api_url: overrides
                .catalog_api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            catalog_search_url: overrides
                .catalog_search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            index_url: overrides
                .index_url
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            hedge_after: overrides
                .hedge_after_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_HEDGE_AFTER),
            search_limit: overrides.limit.unwrap_or(DEFAULT_LIMIT).max(1),
            timeout: overrides
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            jobs: overrides.jobs.unwrap_or(DEFAULT_JOBS).max(1),
        })
    }
}

/// Resolve GOBIN the way the go command does: `$GOBIN`, then the `bin`
/// directory of the first `$GOPATH` entry, then `~/go/bin`.
#[tracing::instrument(skip(runtime))]
pub fn default_gobin<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Some(gobin) = runtime.env_value("GOBIN") {
        return Ok(PathBuf::from(gobin));
    }
    if let Some(first) = runtime.env_paths("GOPATH").into_iter().next() {
        return Ok(first.join("bin"));
    }
    let home = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home.join("go").join("bin"))
}
