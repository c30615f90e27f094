//! Service factory for building the resolver and its backends.
//!
//! Construction is kept apart from [`Config`]: configuration holds values,
//! this module turns them into clients and backends.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::debug;
use reqwest::Client;

use crate::application::Resolver;
use crate::backend::{Backend, Installed, LocalDir, RemoteCatalog, SearchIndex};
use crate::http::{Fetch, HedgingClient};
use crate::runtime::Runtime;

use super::config::Config;

pub const USER_AGENT: &str = "gobin-cli";

/// Build the hedging HTTP client shared by the network backends.
pub fn build_http_client(config: &Config) -> Result<HedgingClient> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()?;
    let client = HedgingClient::new(client, config.hedge_after);
    debug!(
        "HTTP client hedges after {:?}, attempts time out after {:?}",
        client.hedge_after(),
        config.timeout
    );
    Ok(client)
}

/// Build a resolver over the configured sources.
///
/// With `dir` set, that directory stands in for the installed store.
pub fn build_resolver<R: Runtime + 'static>(
    config: &Config,
    runtime: Arc<R>,
    dir: Option<&Path>,
) -> Result<Resolver> {
    let fetch: Arc<dyn Fetch> = Arc::new(build_http_client(config)?);

    let index = SearchIndex::with_base_url(fetch.clone(), &config.index_url, config.search_limit)
        .with_jobs(config.jobs);
    let catalog = RemoteCatalog::with_urls(
        fetch,
        &config.catalog_api_url,
        &config.catalog_search_url,
        config.search_limit,
    );
    let installed: Arc<dyn Backend> = match dir {
        Some(dir) => Arc::new(LocalDir::new(runtime, dir)),
        None => Arc::new(Installed::new(runtime, &config.gobin)),
    };

    Ok(Resolver::new(Arc::new(index), installed, Arc::new(catalog)).with_jobs(config.jobs))
}
